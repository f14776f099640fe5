use std::io::Write;

use crate::args::{self, flags, positional};

const USAGE: &'static str = r#"
Validate tasks and move stale due dates forward.

This is the check done when a task is created or edited. Every task read must
have a non-empty title, a date in the `YYYYMMDD` format (or no date at all)
and either no recurrence rule or a valid one. Each task is then printed with
its date normalized:

* A missing date becomes today.
* A date before today becomes today for one-shot tasks, and the next
occurrence after today for repeating tasks.
* A date on or after today is left alone.

The first invalid task stops processing with an error that includes its line
number.

USAGE:
    due task check <path>...
    due task check < line delimited <task>

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Normalize a new task with no date:

        $ echo '{"title":"water plants","repeat":"d 3"}' | due task check -n 20240126
        {"id":"","date":"20240126","title":"water plants","comment":"","repeat":"d 3"}

    %snip-start%

    A repeating task with a stale date is moved to its next occurrence:

        $ echo '{"id":"1","date":"20240101","title":"rent","repeat":"m 1"}' \
            | due task check -n 20240126
        {"id":"1","date":"20240201","title":"rent","comment":"","repeat":"m 1"}

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
        let task = task.check(today)?;
        serde_json::to_writer(&mut wtr, &task)?;
        writeln!(wtr)?;
        Ok(true)
    })
}
