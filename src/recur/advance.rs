use jiff::{Span, ToSpan, civil::Date};

use super::{Error, Rule};

/// The maximum number of steps any forward search may take.
///
/// Every valid rule that can be satisfied at all is satisfied within a
/// handful of steps from its starting point. (The worst case is a rule like
/// `m 29 2`, which can take 8 years around a non-leap century year.) So this
/// bound is only ever hit by rules that validate but can never match, like
/// `m 31 2`.
const MAX_ITERATIONS: usize = 2_000;

/// Returns the next occurrence of `rule`, starting from a task currently
/// scheduled at `stored`, that is strictly after `now`.
///
/// The date returned is also always strictly after `stored`.
///
/// An error is returned when no occurrence can be found within a fixed
/// number of search steps, or when the next occurrence would fall outside
/// of the range of supported dates. Both are computation faults.
pub fn advance(now: Date, stored: Date, rule: &Rule) -> Result<Date, Error> {
    log::trace!("advancing `{rule}` from {stored} to after {now}");
    match *rule {
        Rule::Daily { interval } => daily(now, stored, interval),
        Rule::Yearly => yearly(now, stored),
        Rule::Weekly { ref days } => weekly(now, stored, days),
        Rule::Monthly { ref days, ref months } => {
            monthly(now, stored, days, months.as_deref())
        }
    }
}

/// Returns `stored + k*interval` days for the smallest `k >= 1` that is
/// after `now`.
fn daily(now: Date, stored: Date, interval: i16) -> Result<Date, Error> {
    if interval < 1 {
        return Err(Error::fault(format!(
            "daily interval `{interval}` must be positive",
        )));
    }
    let interval = i64::from(interval);
    // The number of days from `stored` to `now`, which is negative when
    // `stored` is in the future. In that case, one interval is enough.
    let elapsed = i64::from(
        stored.until(now).map_err(|err| overflow(stored, err))?.get_days(),
    );
    let k = if elapsed < 0 { 1 } else { elapsed / interval + 1 };
    let next = Span::new()
        .try_days(k * interval)
        .and_then(|span| stored.checked_add(span))
        .map_err(|err| overflow(stored, err))?;
    debug_assert!(next > now && next > stored);
    Ok(next)
}

/// Returns `stored + k` years for the smallest `k >= 1` that is after `now`.
///
/// Each candidate is computed from `stored` directly, so a task stored on a
/// leap day lands on Feb 28 in common years and back on Feb 29 in leap
/// years.
fn yearly(now: Date, stored: Date) -> Result<Date, Error> {
    // Skip straight to the year of `now`. Every year before it is
    // necessarily in the past.
    let first = i64::from(now.year() - stored.year()).max(1);
    for k in (first..).take(MAX_ITERATIONS) {
        let next = Span::new()
            .try_years(k)
            .and_then(|span| stored.checked_add(span))
            .map_err(|err| overflow(stored, err))?;
        if next > now {
            return Ok(next);
        }
    }
    Err(exhausted(&Rule::Yearly, now, "years"))
}

/// Returns the first date after both `now` and `stored` whose day of the
/// week is in `days`.
fn weekly(now: Date, stored: Date, days: &[i8]) -> Result<Date, Error> {
    let mut date = now.max(stored);
    for _ in 0..MAX_ITERATIONS {
        date = date.tomorrow().map_err(|err| overflow(date, err))?;
        if days.contains(&date.weekday().to_monday_one_offset()) {
            return Ok(date);
        }
    }
    let rule = Rule::Weekly { days: days.into() };
    Err(exhausted(&rule, now, "days"))
}

/// Returns the first date after both `now` and `stored` that falls on one
/// of `days` in an eligible month.
///
/// Negative days count backwards from the end of each month. Days that
/// don't exist in a particular month (like the 31st of April) are skipped
/// for that month.
fn monthly(
    now: Date,
    stored: Date,
    days: &[i8],
    months: Option<&[i8]>,
) -> Result<Date, Error> {
    let floor = now.max(stored);
    let mut month = floor.first_of_month();
    let mut candidates = Vec::with_capacity(days.len());
    for _ in 0..MAX_ITERATIONS {
        if months.map_or(true, |months| months.contains(&month.month())) {
            candidates.clear();
            candidates.extend(
                days.iter().filter_map(|&day| resolve_day(month, day)),
            );
            candidates.sort();
            if let Some(&next) = candidates.iter().find(|&&d| d > floor) {
                return Ok(next);
            }
        }
        month = month
            .checked_add(1.month())
            .map_err(|err| overflow(month, err))?;
    }
    let rule = Rule::Monthly {
        days: days.into(),
        months: months.map(|months| months.into()),
    };
    Err(exhausted(&rule, now, "months"))
}

/// Resolves a possibly negative day of the month to a concrete date in the
/// month containing `month`. If the day doesn't exist in that month, then
/// `None` is returned.
fn resolve_day(month: Date, day: i8) -> Option<Date> {
    let last = month.days_in_month();
    let day = if day < 0 { last + 1 + day } else { day };
    if !(1 <= day && day <= last) {
        return None;
    }
    month.with().day(day).build().ok()
}

fn overflow(date: Date, err: jiff::Error) -> Error {
    Error::fault(format!(
        "date arithmetic from {date} left the supported range of dates: {err}",
    ))
}

fn exhausted(rule: &Rule, now: Date, unit: &str) -> Error {
    Error::fault(format!(
        "no occurrence of `{rule}` found within \
         {MAX_ITERATIONS} {unit} after {now}",
    ))
}
