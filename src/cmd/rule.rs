use std::io::Write;

use crate::args::{self, Usage, positional};

const USAGE: &'static str = r#"
Parse and print recurrence rules.

Each rule is printed in its canonical form, which has its lists sorted and
deduplicated and its numbers written without leading zeros. Two rules with
the same canonical form always produce the same occurrences.

With --json, each rule is instead printed as a JSON object describing the kind
of rule and its parameters.

USAGE:
    due rule <repeat>...
    due rule < line delimited <repeat>

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Check that a rule is valid:

        $ due rule 'm 31,1,-1 06,02'
        m -1,1,31 2,6

    %snip-start%

    Print the structure of a rule:

        $ due rule --json 'w 5,1'
        {"kind":"weekly","days":[1,5]}

    Validate a list of rules, one per line:

        $ printf 'd 7\ny\n' | due rule
        d 7
        y

    %snip-end%
REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    let mut rules = positional::Rules::default();
    args::configure(p, USAGE, &mut [&mut config, &mut rules])?;

    let mut wtr = std::io::stdout().lock();
    rules.try_map(|rule| {
        if config.json {
            serde_json::to_writer(&mut wtr, &rule)?;
            writeln!(wtr)?;
        } else {
            writeln!(wtr, "{rule}")?;
        }
        Ok(true)
    })
}

#[derive(Debug, Default)]
struct Config {
    json: bool,
}

impl args::Configurable for Config {
    fn configure(
        &mut self,
        _: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Long("json") => {
                self.json = true;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const JSON: Usage = Usage::flag(
            "--json",
            "Print each rule as a JSON object.",
            r#"
Print each rule as a JSON object.

The object always has a `kind` field, which is one of `daily`, `yearly`,
`weekly` or `monthly`. Daily rules have an `interval`. Weekly rules have a
list of `days`. Monthly rules have a list of `days` and a list of `months`,
where the latter is `null` when the rule applies to every month.
"#,
        );
        &[positional::Rules::ARG_OR_STDIN, JSON]
    }
}
