//! Date and time built-ins (§4.5).
//!
//! `now`/`today`/`timestamp` (with no argument) read the wall clock and are
//! the language's other deliberately non-deterministic built-ins alongside
//! `$random()` (§9 "determinism and locale"). Evaluation stays
//! reproducible because the canonical payload that gets signed excludes
//! values the document didn't itself write, not because these functions
//! are absent from the registry.

use crate::error::{Error, Result};
use crate::interpreter::Interpreter;
use crate::value::Value;
use chrono::{DateTime, Datelike, Duration, Months, Timelike, Utc};

pub const NAMES: &[&str] = &[
    "now",
    "today",
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "dayOfWeek",
    "timestamp",
    "formatDate",
    "daysBetween",
    "addDays",
    "addMonths",
];

pub fn call(name: &str, args: &[Value], _interp: &Interpreter) -> Option<Result<Value>> {
    Some(match name {
        "now" => Ok(Value::Timestamp(Utc::now())),
        "today" => Ok(Value::Timestamp(start_of_day(Utc::now()))),
        "year" => year(args),
        "month" => month(args),
        "day" => day(args),
        "hour" => hour(args),
        "minute" => minute(args),
        "dayOfWeek" => day_of_week(args),
        "timestamp" => timestamp(args),
        "formatDate" => format_date(args),
        "daysBetween" => days_between(args),
        "addDays" => add_days(args),
        "addMonths" => add_months(args),
        _ => return None,
    })
}

fn start_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc()
}

/// Parses an RFC 3339 date-time string. Not part of the `$`-registry
/// itself — kept for callers (document ingestion of date-typed scalars)
/// that need to turn a literal string into a [`Value::Timestamp`].
pub(crate) fn parse_date_str(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Type(format!("invalid timestamp: {e}")))
}

fn timestamp_arg(args: &[Value], i: usize, name: &str) -> Result<DateTime<Utc>> {
    match args.get(i) {
        Some(Value::Timestamp(t)) => Ok(*t),
        Some(other) => Err(Error::Type(format!(
            "{name}: expected a timestamp, found {}",
            other.type_name()
        ))),
        None => Err(Error::Arity {
            name: name.to_string(),
            expected: format!("{}", i + 1),
            got: args.len(),
        }),
    }
}

fn year(args: &[Value]) -> Result<Value> {
    Ok(Value::Int(timestamp_arg(args, 0, "year")?.year() as i64))
}

fn month(args: &[Value]) -> Result<Value> {
    Ok(Value::Int(timestamp_arg(args, 0, "month")?.month() as i64))
}

fn day(args: &[Value]) -> Result<Value> {
    Ok(Value::Int(timestamp_arg(args, 0, "day")?.day() as i64))
}

fn hour(args: &[Value]) -> Result<Value> {
    Ok(Value::Int(timestamp_arg(args, 0, "hour")?.hour() as i64))
}

fn minute(args: &[Value]) -> Result<Value> {
    Ok(Value::Int(timestamp_arg(args, 0, "minute")?.minute() as i64))
}

/// `0` = Sunday, matching the registry's documented convention (most
/// platform date APIs default to Monday, so this is spelled out).
fn day_of_week(args: &[Value]) -> Result<Value> {
    Ok(Value::Int(
        timestamp_arg(args, 0, "dayOfWeek")?.weekday().num_days_from_sunday() as i64,
    ))
}

/// `$timestamp([d])`: epoch seconds of `d`, or of the current instant
/// when called with no argument.
fn timestamp(args: &[Value]) -> Result<Value> {
    let t = match args.first() {
        Some(Value::Timestamp(t)) => *t,
        Some(other) => {
            return Err(Error::Type(format!(
                "timestamp: expected a timestamp, found {}",
                other.type_name()
            )))
        }
        None => Utc::now(),
    };
    Ok(Value::Int(t.timestamp()))
}

fn format_date(args: &[Value]) -> Result<Value> {
    let t = timestamp_arg(args, 0, "formatDate")?;
    let fmt = match args.get(1) {
        Some(Value::Str(s)) => s.to_string(),
        Some(other) => {
            return Err(Error::Type(format!(
                "formatDate: expected a string format, found {}",
                other.type_name()
            )))
        }
        None => "iso".to_string(),
    };
    let pattern = match fmt.as_str() {
        "iso" => "%Y-%m-%d",
        "short" => "%m/%d/%y",
        "medium" => "%b %d, %Y",
        "long" => "%B %d, %Y",
        "full" => "%A, %B %d, %Y",
        "time" => "%H:%M:%S",
        "relative" => return Ok(Value::str(format_relative(t))),
        other => return Err(Error::Type(format!("formatDate: unknown format '{other}'"))),
    };
    Ok(Value::str(t.format(pattern).to_string()))
}

fn format_relative(t: DateTime<Utc>) -> String {
    let delta = Utc::now() - t;
    let days = delta.num_days();
    match days {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        -1 => "tomorrow".to_string(),
        d if d > 1 => format!("{d} days ago"),
        d => format!("in {} days", -d),
    }
}

fn days_between(args: &[Value]) -> Result<Value> {
    let a = timestamp_arg(args, 0, "daysBetween")?;
    let b = timestamp_arg(args, 1, "daysBetween")?;
    Ok(Value::Int((a - b).num_days()))
}

fn add_days(args: &[Value]) -> Result<Value> {
    let t = timestamp_arg(args, 0, "addDays")?;
    let n = match args.get(1) {
        Some(Value::Int(n)) => *n,
        Some(other) => return Err(Error::Type(format!("addDays: expected an integer, found {}", other.type_name()))),
        None => return Err(Error::Arity { name: "addDays".into(), expected: "2".into(), got: 1 }),
    };
    Ok(Value::Timestamp(t + Duration::days(n)))
}

fn add_months(args: &[Value]) -> Result<Value> {
    let t = timestamp_arg(args, 0, "addMonths")?;
    let n = match args.get(1) {
        Some(Value::Int(n)) => *n,
        Some(other) => return Err(Error::Type(format!("addMonths: expected an integer, found {}", other.type_name()))),
        None => return Err(Error::Arity { name: "addMonths".into(), expected: "2".into(), got: 1 }),
    };
    let result = if n >= 0 {
        t.checked_add_months(Months::new(n as u32))
    } else {
        t.checked_sub_months(Months::new((-n) as u32))
    };
    result
        .map(Value::Timestamp)
        .ok_or_else(|| Error::Type("addMonths: result out of range".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Value {
        Value::Timestamp(parse_date_str(s).unwrap())
    }

    #[test]
    fn reads_calendar_fields() {
        let t = ts("2024-03-15T09:30:00Z");
        assert_eq!(year(&[t.clone()]).unwrap(), Value::Int(2024));
        assert_eq!(month(&[t.clone()]).unwrap(), Value::Int(3));
        assert_eq!(day(&[t.clone()]).unwrap(), Value::Int(15));
        assert_eq!(hour(&[t.clone()]).unwrap(), Value::Int(9));
        assert_eq!(minute(&[t]).unwrap(), Value::Int(30));
    }

    #[test]
    fn day_of_week_sunday_is_zero() {
        let sunday = ts("2024-03-17T00:00:00Z");
        assert_eq!(day_of_week(&[sunday]).unwrap(), Value::Int(0));
    }

    #[test]
    fn days_between_counts_forward() {
        let a = ts("2024-01-10T00:00:00Z");
        let b = ts("2024-01-01T00:00:00Z");
        assert_eq!(days_between(&[a, b]).unwrap(), Value::Int(9));
    }

    #[test]
    fn add_months_crosses_year_boundary() {
        let t = ts("2024-12-01T00:00:00Z");
        let result = add_months(&[t, Value::Int(2)]).unwrap();
        assert_eq!(year(&[result.clone()]).unwrap(), Value::Int(2025));
        assert_eq!(month(&[result]).unwrap(), Value::Int(2));
    }

    #[test]
    fn format_date_iso_default() {
        let t = ts("2024-03-15T00:00:00Z");
        assert_eq!(format_date(&[t]).unwrap(), Value::str("2024-03-15"));
    }
}
