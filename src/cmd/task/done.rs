use std::io::Write;

use crate::{
    args::{self, flags, positional},
    task::Completion,
};

const USAGE: &'static str = r#"
Mark tasks done.

Every task read is marked done as of today. A task without a recurrence rule
is finished for good and is not printed. A task with a recurrence rule is
printed with its date moved to the next occurrence after today. All other
fields are printed unchanged.

USAGE:
    due task done <path>...
    due task done < line delimited <task>

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Complete a task that repeats every 3 days:

        $ echo '{"id":"1","date":"20240125","title":"water plants","repeat":"d 3"}' \
            | due task done -n 20240126
        {"id":"1","date":"20240128","title":"water plants","comment":"","repeat":"d 3"}

    %snip-start%

    One-shot tasks are dropped. To see which tasks were dropped, enable debug
    logging:

        $ echo '{"id":"2","date":"20240125","title":"call mom"}' \
            | DUE_LOG=debug due task done
        ...|DEBUG|src/cmd/task/done.rs:...: removing one-shot task `2`

    %snip-end%
REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut now = flags::Now::default();
    let mut tasks = positional::Tasks::default();
    args::configure(p, USAGE, &mut [&mut now, &mut tasks])?;

    let today = now.get();
    let mut wtr = std::io::stdout().lock();
    tasks.try_map(|task| {
        match task.complete(today)? {
            Completion::Remove => {
                log::debug!("removing one-shot task `{}`", task.id);
            }
            Completion::Reschedule(task) => {
                serde_json::to_writer(&mut wtr, &task)?;
                writeln!(wtr)?;
            }
        }
        Ok(true)
    })
}
