/*!
The recurrence rule engine.

A recurrence rule is a compact string attached to a task, e.g., `d 7` (every
7 days), `y` (every year), `w 1,3` (every Monday and Wednesday) or `m 1,-1`
(the first and last day of every month). Given a reference date ("today"),
the date a task is currently scheduled for and its rule, the engine computes
the next date the task falls due.

Everything in here is pure. There is no I/O and no global state. The only
inputs are dates and strings, and the only outputs are dates and strings (or
an [`Error`]).
*/

use jiff::civil::Date;

pub use self::{advance::advance, rule::Rule};

mod advance;
mod rule;

/// Computes the next occurrence for a task stored at `stored` with the
/// recurrence rule `repeat`, relative to the reference date `now`.
///
/// `stored` must be in the fixed `YYYYMMDD` format, and the date returned
/// is in the same format. The date returned is always strictly after `now`.
///
/// Callers should never pass an empty `repeat`. A task without a rule is a
/// one-shot task and has no next occurrence. If an empty rule is given
/// anyway, it is rejected like any other invalid rule.
pub fn next_date(
    now: Date,
    stored: &str,
    repeat: &str,
) -> Result<String, Error> {
    let stored = parse_date(stored)?;
    let rule: Rule = repeat.parse()?;
    let next = advance(now, stored, &rule)?;
    log::trace!("next occurrence of `{rule}` after {now} is {next}");
    Ok(format_date(next))
}

/// Parses a date in the fixed `YYYYMMDD` format.
///
/// Exactly 8 ASCII digits are required and they must name a real date.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    let bytes = text.as_bytes();
    if bytes.len() != 8 || !bytes.iter().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid(format!(
            "invalid date `{text}` (dates must be 8 digits \
             in the format YYYYMMDD)",
        )));
    }
    let digits = |range: std::ops::Range<usize>| -> i16 {
        bytes[range].iter().fold(0, |acc, &b| acc * 10 + i16::from(b - b'0'))
    };
    let (year, month, day) = (digits(0..4), digits(4..6), digits(6..8));
    // Month and day are at most 99, so these never truncate.
    Date::new(year, month as i8, day as i8).map_err(|err| {
        Error::invalid(format!("invalid date `{text}`: {err}"))
    })
}

/// Formats a date in the fixed `YYYYMMDD` format.
pub fn format_date(date: Date) -> String {
    date.strftime("%Y%m%d").to_string()
}

/// An error that can occur when computing the next occurrence of a rule.
///
/// There are only two kinds of errors. See [`ErrorKind`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    message: Box<str>,
}

/// The kind of a recurrence engine error.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// A recurrence rule or a date string is malformed or out of range.
    ///
    /// This is always the fault of whoever provided the input.
    InvalidSpecification,
    /// The engine could not find a next occurrence within its search bound,
    /// or date arithmetic left the supported range of dates.
    ///
    /// This indicates a rule that validates but can never be satisfied, or
    /// a bug. It is never the expected outcome of a well formed request.
    ComputationFault,
}

impl Error {
    pub(crate) fn invalid(message: impl Into<Box<str>>) -> Error {
        Error { kind: ErrorKind::InvalidSpecification, message: message.into() }
    }

    pub(crate) fn fault(message: impl Into<Box<str>>) -> Error {
        Error { kind: ErrorKind::ComputationFault, message: message.into() }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[cfg(test)]
impl Error {
    pub(crate) fn is_invalid_specification(&self) -> bool {
        self.kind == ErrorKind::InvalidSpecification
    }

    pub(crate) fn is_computation_fault(&self) -> bool {
        self.kind == ErrorKind::ComputationFault
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.kind {
            ErrorKind::InvalidSpecification => f.write_str(&self.message),
            ErrorKind::ComputationFault => {
                write!(f, "internal error: {}", self.message)
            }
        }
    }
}

impl std::error::Error for Error {}
