use std::io::Write;

use anyhow::Context;

use crate::{
    args::{self, Usage, flags},
    recur::{self, Rule},
};

const USAGE: &'static str = r#"
Compute the next occurrence of a recurrence rule.

The first positional argument is the date a task is currently scheduled for,
and the second is its recurrence rule. The date printed is the first
occurrence of the rule after today. It is also always after the given date,
even when the given date is already in the future.

USAGE:
    due next <date> <repeat>

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Find the next date of a task repeating every 7 days:

        $ due next -n 20240201 20240115 'd 7'
        20240205

    %snip-start%

    Find the next last day of the month:

        $ due next -n 20240126 20240126 'm -1'
        20240131

    Print the next 3 Mondays or Fridays:

        $ due next -n 20240126 -c 3 20240126 'w 1,5'
        20240129
        20240202
        20240205

    A task stored on February 29 and repeating every year falls on February
    28 in common years:

        $ due next -n 20250101 20240229 y
        20250228

    %snip-end%
REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    let mut now = flags::Now::default();
    args::configure(p, USAGE, &mut [&mut config, &mut now])?;

    let stored = config.stored.context("a date is required")?;
    let repeat = config.repeat.context("a recurrence rule is required")?;
    let rule: Rule = repeat.parse()?;

    let mut wtr = std::io::stdout().lock();
    let (mut now, mut stored) = (now.get(), stored.get());
    for _ in 0..config.count.get().get() {
        let next = recur::advance(now, stored, &rule)?;
        writeln!(wtr, "{}", recur::format_date(next))?;
        (now, stored) = (next, next);
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Config {
    stored: Option<flags::Day>,
    repeat: Option<String>,
    count: flags::Count,
}

impl args::Configurable for Config {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Short('c') | lexopt::Arg::Long("count") => {
                self.count = args::parse(p, "-c/--count")?;
            }
            lexopt::Arg::Value(ref mut v) => {
                let v = std::mem::take(v).into_string().map_err(|v| {
                    anyhow::anyhow!("argument `{v:?}` is not valid UTF-8")
                })?;
                if self.stored.is_none() {
                    self.stored = Some(v.parse()?);
                } else if self.repeat.is_none() {
                    self.repeat = Some(v);
                } else {
                    anyhow::bail!("unexpected extra argument `{v}`");
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const REPEAT: Usage = Usage::arg(
            "<repeat>",
            "A recurrence rule, e.g., `d 7`, `y`, `w 1,3` or `m 1,-1`.",
            r#"
A recurrence rule, e.g., `d 7`, `y`, `w 1,3` or `m 1,-1`.

Rules that contain spaces need to be quoted. See `due rule --help` for the
full syntax.
"#,
        );
        &[flags::Day::ARG, REPEAT, flags::Count::USAGE]
    }
}
