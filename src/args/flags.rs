use std::{
    ffi::OsString,
    io,
    num::NonZero,
    path::{Path, PathBuf},
};

use {anyhow::Context, jiff::civil};

use crate::{
    args::{self, Configurable, Usage},
    recur,
};

/// A calendar date given on the command line in the fixed `YYYYMMDD` format.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Day(civil::Date);

impl Day {
    pub const ARG: Usage = Usage::arg(
        "<date>",
        "A date in the `YYYYMMDD` format, e.g., `20240126`.",
        r#"
A date in the `YYYYMMDD` format, e.g., `20240126`.

Exactly 8 digits are required, with no separators, sign or surrounding
whitespace. The date must exist in the Gregorian calendar, so `20230229` is
rejected while `20240229` is accepted.
"#,
    );

    /// Return the parsed date.
    pub fn get(&self) -> civil::Date {
        self.0
    }
}

impl std::str::FromStr for Day {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Day> {
        Ok(Day(recur::parse_date(s)?))
    }
}

impl std::fmt::Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&recur::format_date(self.0))
    }
}

/// The `-n/--now` flag, which overrides the reference date for a command.
///
/// When absent, the reference date is today in the system time zone (or
/// whatever `DUE_NOW` says).
#[derive(Clone, Debug, Default)]
pub struct Now {
    date: Option<Day>,
}

impl Now {
    /// Return the reference date a command should use.
    pub fn get(&self) -> civil::Date {
        match self.date {
            Some(day) => day.get(),
            None => *crate::TODAY,
        }
    }
}

impl Configurable for Now {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Short('n') | lexopt::Arg::Long("now") => {
                let day: Day = args::parse(p, "-n/--now")?;
                log::trace!("reference date set to {day} via -n/--now");
                self.date = Some(day);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const NOW: Usage = Usage::flag(
            "-n/--now <date>",
            "Use this date as today (in the `YYYYMMDD` format).",
            r#"
Use this date as today (in the `YYYYMMDD` format).

Every computed occurrence is strictly after today. By default, today is the
current date in your system's time zone. The `DUE_NOW` environment variable
can also be used to change what today is for every command.
"#,
        );
        &[NOW]
    }
}

/// The `-c/--count` flag, for commands that can emit more than one result.
#[derive(Clone, Debug, Default)]
pub struct Count {
    count: Option<NonZero<usize>>,
}

impl Count {
    pub const USAGE: Usage = Usage::flag(
        "-c/--count <number>",
        "The number of occurrences to print (defaults to 1).",
        r#"
The number of occurrences to print (defaults to 1).

Each occurrence after the first is computed from the one before it. That is,
the previous occurrence is used as both the stored date and today.
"#,
    );

    /// Return the count given, or `1` when the flag wasn't given.
    pub fn get(&self) -> NonZero<usize> {
        self.count.unwrap_or(NonZero::<usize>::MIN)
    }
}

impl std::str::FromStr for Count {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Count> {
        let count: usize = s
            .parse()
            .with_context(|| format!("failed to parse `{s}` as an integer"))?;
        let count = NonZero::new(count).ok_or_else(|| {
            anyhow::anyhow!("number of occurrences must be greater than 0")
        })?;
        Ok(Count { count: Some(count) })
    }
}

/// A simple abstraction over "one file path or stdin."
#[derive(Clone, Debug)]
pub struct FileOrStdin {
    path: Option<PathBuf>,
}

impl FileOrStdin {
    /// Create a `FileOrStdin` that reads from `stdin`.
    ///
    /// This doesn't touch `stdin` until something reads from the reader
    /// returned by `FileOrStdin::reader`.
    pub fn stdin() -> FileOrStdin {
        FileOrStdin { path: None }
    }

    /// Return a `std::fmt::Display` impl for the underlying file or stdin.
    ///
    /// When a file, this is its file path. When stdin, it's the literal
    /// string `<stdin>`.
    pub fn display(&self) -> impl std::fmt::Display + '_ {
        self.path.as_deref().unwrap_or_else(|| Path::new("<stdin>")).display()
    }

    /// Return a buffered reader for the underlying file or stdin.
    pub fn reader(&self) -> anyhow::Result<Box<dyn io::BufRead>> {
        Ok(if let Some(ref path) = self.path {
            let file = std::fs::File::open(path)
                .with_context(|| format!("{}", path.display()))?;
            Box::new(io::BufReader::new(file))
        } else {
            Box::new(io::stdin().lock())
        })
    }
}

impl Default for FileOrStdin {
    fn default() -> FileOrStdin {
        FileOrStdin::stdin()
    }
}

impl From<OsString> for FileOrStdin {
    fn from(os_str: OsString) -> FileOrStdin {
        FileOrStdin::from(PathBuf::from(os_str))
    }
}

impl From<PathBuf> for FileOrStdin {
    fn from(path: PathBuf) -> FileOrStdin {
        if path == Path::new("-") {
            FileOrStdin { path: None }
        } else {
            FileOrStdin { path: Some(path) }
        }
    }
}
