mod check;
mod done;

const USAGE: &'static str = "\
Commands for working with tasks.

Tasks are read and written as line delimited JSON, with one task object per
line. Each task has the string fields `id`, `date`, `title`, `comment` and
`repeat`.

USAGE:
    due task <command> ...

COMMANDS:
    check  Validate tasks and move stale due dates forward
    done   Mark tasks done, printing the ones that repeat
";

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let cmd = crate::args::next_as_command(USAGE, p)?;
    match &*cmd {
        "check" => check::run(p),
        "done" => done::run(p),
        unk => anyhow::bail!("unrecognized command '{}'", unk),
    }
}
