use std::ffi::OsString;

use {
    anyhow::Context,
    bstr::{BStr, BString, ByteSlice, ByteVec},
};

use crate::{
    args::{Configurable, Usage, flags::FileOrStdin},
    parse::{BufReadExt, BytesExt, Line},
    recur::Rule,
    task::Task,
};

/// The CLI parsing configuration for reading recurrence rules.
///
/// This will greedily consume all remaining positional arguments as rules.
///
/// When there are no positional arguments to consume, then this will read
/// rules from `stdin` in a line delimited fashion.
#[derive(Clone, Debug, Default)]
pub struct Rules(Arguments);

impl Rules {
    pub const ARG_OR_STDIN: Usage = Usage::arg(
        "<repeat>...",
        "One or more recurrence rules, or line delimited on stdin.",
        r#"
One or more recurrence rules. When none are given as positional arguments,
they are read from stdin, one per line.

A rule is one of the following, with tokens separated by a single space:

`d <n>` repeats every `n` days, where `n` is in the range `1..=400`.

`y` repeats every year on the same month and day. February 29 falls on
February 28 in years without one.

`w <days>` repeats on the given days of the week, as a comma separated list
where `1` is Monday and `7` is Sunday.

`m <days> [<months>]` repeats on the given days of the month, as a comma
separated list of values in the range `1..=31`, or `-1` for the last day of the
month and `-2` for the day before it. An optional second comma separated list
restricts the rule to the given months in the range `1..=12`. Days that don't
exist in a month are skipped for that month.
"#,
    );

    /// Run the given function over each rule read from the CLI.
    ///
    /// If there were no positional rules, then this tries to read them
    /// from stdin, one per line.
    ///
    /// Iteration stops when the closure returns false or returns an error.
    pub fn try_map(
        self,
        mut f: impl FnMut(Rule) -> anyhow::Result<bool>,
    ) -> anyhow::Result<()> {
        self.0.try_map(|arg| f(arg.to_rule()?))
    }
}

impl Configurable for Rules {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        self.0.configure(p, arg)
    }
}

/// The CLI parsing configuration for reading tasks.
///
/// This will greedily consume all remaining positional arguments as file
/// paths. Each file contains one task per line, as a JSON object. A path of
/// `-` means stdin.
///
/// When there are no file paths, tasks are read from stdin.
#[derive(Clone, Debug, Default)]
pub struct Tasks {
    paths: Vec<OsString>,
}

impl Tasks {
    pub const ARG_OR_STDIN: Usage = Usage::arg(
        "<path>...",
        "Files of line delimited JSON tasks, or tasks on stdin.",
        r#"
Zero or more files containing tasks. When no files are given, tasks are read
from stdin. A path of `-` also means stdin.

Each task is a JSON object on its own line with the string fields `id`,
`date`, `title`, `comment` and `repeat`. Missing fields are treated as empty
strings, and blank lines are skipped. For example:

{"id":"1","date":"20240126","title":"water plants","repeat":"d 3"}
"#,
    );

    /// Run the given function over each task read from the files given, or
    /// from stdin if no files were given.
    ///
    /// Errors include the name of the file and the line number of the task
    /// that caused it.
    ///
    /// Iteration stops when the closure returns false or returns an error.
    pub fn try_map(
        self,
        mut f: impl FnMut(Task) -> anyhow::Result<bool>,
    ) -> anyhow::Result<()> {
        let inputs = if self.paths.is_empty() {
            vec![FileOrStdin::stdin()]
        } else {
            self.paths.into_iter().map(FileOrStdin::from).collect()
        };
        for input in inputs {
            let mut keep_going = true;
            input.reader()?.for_byte_line(|line| {
                if line.is_blank() {
                    return Ok(true);
                }
                keep_going = line
                    .content()
                    .parse::<Task>()
                    .and_then(&mut f)
                    .with_context(|| {
                        format!(
                            "line {number} of {input}",
                            number = line.number(),
                            input = input.display(),
                        )
                    })?;
                Ok(keep_going)
            })?;
            if !keep_going {
                break;
            }
        }
        Ok(())
    }
}

impl Configurable for Tasks {
    fn configure(
        &mut self,
        _: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Value(ref mut v) => {
                self.paths.push(std::mem::take(v));
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        &[Tasks::ARG_OR_STDIN]
    }
}

/// The parsing configuration for reading arguments either as positional
/// arguments on the CLI, or as line-delimited data on `stdin`.
///
/// This will greedily consume all remaining positional arguments. That is,
/// this is generally intended for use cases where a variable number of
/// arguments can be given.
///
/// When there are _zero_ positional arguments, then this will read lines from
/// stdin instead.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    positional: Vec<BString>,
}

impl Arguments {
    /// Run the given function over each argument read from the CLI.
    ///
    /// If there were no positional arguments, then this tries to read them
    /// from stdin, one per line. Stated differently, the argument given
    /// to the closure is either always `Positional` or always `StdinLine`.
    /// You can never get a mix.
    ///
    /// Iteration stops when the closure returns false or returns an error.
    pub fn try_map(
        self,
        mut f: impl FnMut(Argument<'_>) -> anyhow::Result<bool>,
    ) -> anyhow::Result<()> {
        if !self.positional.is_empty() {
            for arg in self.positional.iter() {
                if !f(Argument::Positional(arg.as_bstr()))? {
                    return Ok(());
                }
            }
            return Ok(());
        }
        std::io::stdin().lock().for_byte_line(|line| {
            f(Argument::StdinLine(line))
                .with_context(|| format!("line {} of <stdin>", line.number()))
        })
    }
}

impl Configurable for Arguments {
    fn configure(
        &mut self,
        _: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Value(ref mut v) => {
                let v = std::mem::take(v);
                let bytes = Vec::from_os_string(v).map_err(|arg| {
                    anyhow::anyhow!(
                        "due requires that positional arguments \
                         be valid UTF-8 in non-Unix environments, \
                         but `{arg:?}` is not valid UTF-8",
                    )
                })?;
                self.positional.push(BString::from(bytes));
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// A generic argument parsed from either positional args on the CLI, or
/// as a single line from stdin.
#[derive(Clone, Copy, Debug)]
pub enum Argument<'a> {
    /// Just arbitrary bytes.
    ///
    /// On Windows, we require that this is valid UTF-8.
    Positional(&'a BStr),
    /// A line containing arbitrary ASCII compatible bytes.
    StdinLine(Line<'a>),
}

impl<'a> Argument<'a> {
    /// Parse this argument into a recurrence rule.
    pub fn to_rule(&self) -> anyhow::Result<Rule> {
        let raw = self.raw();
        let text = raw.to_str().with_context(|| {
            format!("invalid recurrence rule `{raw}`: not valid UTF-8")
        })?;
        Ok(text.parse()?)
    }

    /// Return the raw argument value, without any line terminator.
    pub fn raw(&self) -> &'a BStr {
        match *self {
            Argument::Positional(arg) => arg,
            Argument::StdinLine(line) => line.content(),
        }
    }
}
