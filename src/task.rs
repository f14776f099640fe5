use {anyhow::Context, jiff::civil::Date};

use crate::{
    parse::FromBytes,
    recur::{self, Rule},
};

/// A task as it is exchanged with the outside world.
///
/// Every field is a plain string so that a task passes through unchanged
/// except for the fields an operation explicitly rewrites. Missing fields
/// are treated as empty.
///
/// On the wire, a task is a single JSON object per line:
///
/// ```text
/// {"id":"1","date":"20240126","title":"water plants","comment":"","repeat":"d 3"}
/// ```
#[derive(
    Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize,
)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    /// The date the task is due, in the `YYYYMMDD` format.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub comment: String,
    /// The task's recurrence rule. Empty for one-shot tasks.
    #[serde(default)]
    pub repeat: String,
}

/// Whether a task repeats or not.
///
/// A task without a recurrence rule is a one-shot task. It never has a
/// "next" occurrence. This is decided here, before the recurrence engine is
/// ever involved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Repeat {
    Never,
    Rule(Rule),
}

impl Repeat {
    /// Parses a task's raw recurrence field. Blank means `Never`.
    pub fn parse(text: &str) -> Result<Repeat, recur::Error> {
        if text.trim().is_empty() {
            return Ok(Repeat::Never);
        }
        Ok(Repeat::Rule(text.parse()?))
    }
}

/// The outcome of marking a task as done.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Completion {
    /// The task was a one-shot task and should be removed.
    Remove,
    /// The task repeats and is now due on a later date.
    Reschedule(Task),
}

impl Task {
    /// Marks this task as done as of `today`.
    ///
    /// A one-shot task is finished for good, so this returns
    /// `Completion::Remove`. A repeating task is moved to its next
    /// occurrence after `today`.
    pub fn complete(&self, today: Date) -> Result<Completion, recur::Error> {
        if Repeat::parse(&self.repeat)? == Repeat::Never {
            return Ok(Completion::Remove);
        }
        let date = recur::next_date(today, &self.date, &self.repeat)?;
        log::debug!(
            "task `{id}` with rule `{repeat}` moved from {from} to {date}",
            id = self.id,
            repeat = self.repeat,
            from = self.date,
        );
        Ok(Completion::Reschedule(Task { date, ..self.clone() }))
    }

    /// Validates and normalizes this task as of `today`, as is done when a
    /// task is created or edited.
    ///
    /// A task must have a title. A missing date means `today`. A date in
    /// the past is moved to `today` for one-shot tasks, and to the next
    /// occurrence after `today` for repeating tasks. Dates on or after
    /// `today` are left alone.
    pub fn check(mut self, today: Date) -> anyhow::Result<Task> {
        anyhow::ensure!(
            !self.title.trim().is_empty(),
            "task title is required",
        );
        let date = if self.date.is_empty() {
            today
        } else {
            recur::parse_date(&self.date).context("invalid task date")?
        };
        let repeat =
            Repeat::parse(&self.repeat).context("invalid task recurrence")?;
        let date = if date >= today {
            date
        } else {
            match repeat {
                Repeat::Never => today,
                Repeat::Rule(ref rule) => recur::advance(today, date, rule)
                    .context("failed to move task to its next occurrence")?,
            }
        };
        self.date = recur::format_date(date);
        Ok(self)
    }
}

impl FromBytes for Task {
    type Err = anyhow::Error;

    fn from_bytes(bytes: &[u8]) -> anyhow::Result<Task> {
        serde_json::from_slice(bytes).context("invalid task JSON")
    }
}
