use std::str::FromStr;

use super::Error;

/// A parsed recurrence rule.
///
/// Each kind of rule carries only the parameters it needs. Sets of values
/// are always sorted in ascending order and deduplicated, so two rules that
/// describe the same recurrence compare equal regardless of how they were
/// written.
///
/// The `Display` impl writes the canonical form of the rule. Parsing the
/// canonical form always returns an equal rule.
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Rule {
    /// `d <n>`: every `n` days, where `1 <= n <= 400`.
    Daily { interval: i16 },
    /// `y`: every year on the same month and day.
    Yearly,
    /// `w <days>`: on each of the given days of the week.
    ///
    /// Days are numbered `1` (Monday) through `7` (Sunday).
    Weekly { days: Box<[i8]> },
    /// `m <days> [<months>]`: on each of the given days of the month.
    ///
    /// Days are `1..=31`, or `-1` and `-2` for the last and second-to-last
    /// day of the month. When `months` is present, only the given months
    /// (`1..=12`) are eligible.
    Monthly { days: Box<[i8]>, months: Option<Box<[i8]>> },
}

impl Rule {
    /// The largest interval permitted for a daily rule.
    pub const MAX_DAILY_INTERVAL: i16 = 400;

    /// Parses a recurrence rule from its textual form.
    ///
    /// Tokens are separated by a single space. Leading and trailing
    /// whitespace around the entire rule is ignored.
    pub fn parse(text: &str) -> Result<Rule, Error> {
        let rule = text.trim();
        if rule.is_empty() {
            return Err(Error::invalid(
                "recurrence rule is empty \
                 (expected one of `d`, `y`, `w` or `m`)",
            ));
        }
        let mut tokens = rule.split(' ');
        let kind = tokens.next().unwrap_or("");
        let params: Vec<&str> = tokens.collect();
        let parsed = match kind {
            "d" => parse_daily(&params),
            "y" => parse_yearly(&params),
            "w" => parse_weekly(&params),
            "m" => parse_monthly(&params),
            unk => Err(format!(
                "unsupported recurrence kind `{unk}` \
                 (expected one of `d`, `y`, `w` or `m`)",
            )),
        };
        parsed.map_err(|msg| {
            Error::invalid(format!("invalid recurrence rule `{rule}`: {msg}"))
        })
    }
}

impl FromStr for Rule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Rule, Error> {
        Rule::parse(s)
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        fn list(
            f: &mut std::fmt::Formatter,
            values: &[i8],
        ) -> std::fmt::Result {
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{v}")?;
            }
            Ok(())
        }

        match *self {
            Rule::Daily { interval } => write!(f, "d {interval}"),
            Rule::Yearly => f.write_str("y"),
            Rule::Weekly { ref days } => {
                f.write_str("w ")?;
                list(f, days)
            }
            Rule::Monthly { ref days, ref months } => {
                f.write_str("m ")?;
                list(f, days)?;
                if let Some(ref months) = *months {
                    f.write_str(" ")?;
                    list(f, months)?;
                }
                Ok(())
            }
        }
    }
}

fn parse_daily(params: &[&str]) -> Result<Rule, String> {
    let &[interval] = params else {
        return Err(format!(
            "daily rule requires exactly one interval, e.g., `d 7`, \
             but found {} parameters",
            params.len(),
        ));
    };
    let interval = parse_integer(interval)?;
    if !(1 <= interval && interval <= i64::from(Rule::MAX_DAILY_INTERVAL)) {
        return Err(format!(
            "invalid daily interval `{interval}` \
             (values must be in range 1..={})",
            Rule::MAX_DAILY_INTERVAL,
        ));
    }
    // OK because the range check above guarantees it fits.
    Ok(Rule::Daily { interval: interval as i16 })
}

fn parse_yearly(params: &[&str]) -> Result<Rule, String> {
    if let Some(unexpected) = params.first() {
        return Err(format!(
            "yearly rule does not accept any parameters, \
             but found `{unexpected}`",
        ));
    }
    Ok(Rule::Yearly)
}

fn parse_weekly(params: &[&str]) -> Result<Rule, String> {
    let &[days] = params else {
        return Err(format!(
            "weekly rule requires exactly one list of week days, \
             e.g., `w 1,3`, but found {} parameters",
            params.len(),
        ));
    };
    let days =
        parse_list(days, "day of the week", |v| 1 <= v && v <= 7, "1..=7")?;
    Ok(Rule::Weekly { days })
}

fn parse_monthly(params: &[&str]) -> Result<Rule, String> {
    let (days, months) = match *params {
        [days] => (days, None),
        [days, months] => (days, Some(months)),
        _ => {
            return Err(format!(
                "monthly rule requires a list of days and an optional \
                 list of months, e.g., `m 1,-1` or `m 15 1,7`, but found \
                 {} parameters",
                params.len(),
            ));
        }
    };
    let days = parse_list(
        days,
        "day of the month",
        |v| (-2 <= v && v <= -1) || (1 <= v && v <= 31),
        "1..=31 or -2..=-1",
    )?;
    let months = match months {
        None => None,
        Some(months) => Some(parse_list(
            months,
            "month",
            |v| 1 <= v && v <= 12,
            "1..=12",
        )?),
    };
    Ok(Rule::Monthly { days, months })
}

/// Parses a comma separated list of integers, checks each one with `valid`
/// and returns them sorted and deduplicated.
fn parse_list(
    csv: &str,
    what: &str,
    valid: impl Fn(i64) -> bool,
    range: &str,
) -> Result<Box<[i8]>, String> {
    let mut values = vec![];
    for token in csv.split(',') {
        let v = parse_integer(token)?;
        if !valid(v) {
            return Err(format!(
                "invalid {what} `{v}` (values must be in range {range})",
            ));
        }
        // Every legal range is a subset of -2..=31.
        values.push(v as i8);
    }
    values.sort();
    values.dedup();
    Ok(values.into_boxed_slice())
}

fn parse_integer(token: &str) -> Result<i64, String> {
    if token.is_empty() {
        return Err("found empty value where an integer was expected".into());
    }
    token.parse().map_err(|_| format!("`{token}` is not a valid integer"))
}
