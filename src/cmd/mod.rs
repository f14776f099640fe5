mod next;
mod rule;
mod task;

const USAGE: &'static str = "\
A personal task scheduler for recurring tasks.

USAGE:
    due <command> ...

COMMANDS:
    next  Compute the next occurrence of a recurrence rule
    rule  Parse and print recurrence rules in canonical form
    task  Mark tasks done or normalize new tasks
";

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    // Running `due` with no arguments prints today's date, as Due sees it.
    // This is handy for checking what `DUE_NOW` or `TZ` resolve to.
    if p.try_raw_args().map_or(false, |args| args.as_slice().is_empty()) {
        use std::io::Write;

        let today = crate::recur::format_date(*crate::TODAY);
        writeln!(std::io::stdout(), "{today}")?;
        return Ok(());
    }

    let cmd = crate::args::next_as_command(USAGE, p)?;
    match &*cmd {
        "next" => next::run(p),
        "rule" => rule::run(p),
        "task" => task::run(p),
        unk => anyhow::bail!("unrecognized command '{}'", unk),
    }
}
