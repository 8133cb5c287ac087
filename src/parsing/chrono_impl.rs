//! The default `Parsers` implementation, built on `chrono`.

use arrow_schema::TimeUnit;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::config::CastConfig;
use crate::error::CastError;
use crate::null_handling::{is_null, INAT};
use crate::types::array::{datetime_nanos, duration_nanos};
use crate::types::value::{naive_to_nanos, unit_to_nanos};
use crate::types::Value;

use super::Parsers;

const NANOS_PER_MICRO: i128 = 1_000;
const NANOS_PER_MILLI: i128 = 1_000_000;
const NANOS_PER_SECOND: i128 = 1_000_000_000;
const NANOS_PER_MINUTE: i128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i128 = 60 * NANOS_PER_MINUTE;
const NANOS_PER_DAY: i128 = 24 * NANOS_PER_HOUR;

/// Parses dates with RFC 3339 followed by a configurable list of `chrono` formats.
/// Numbers are read as epoch counts in the configured unit.
#[derive(Debug, Clone)]
pub struct ChronoParsers {
    formats: Vec<String>,
    epoch_unit: TimeUnit,
}

impl ChronoParsers {
    pub fn new(config: &CastConfig) -> Self {
        Self {
            formats: config.datetime_formats.clone(),
            epoch_unit: config.epoch_unit,
        }
    }

    fn parse_datetime_str(&self, s: &str) -> Option<i64> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return dt.timestamp_nanos_opt();
        }
        if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
            return dt.timestamp_nanos_opt();
        }
        self.formats.iter().find_map(|fmt| {
            NaiveDateTime::parse_from_str(s, fmt)
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, fmt)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .and_then(|dt| naive_to_nanos(&dt))
        })
    }
}

impl Default for ChronoParsers {
    fn default() -> Self {
        Self::new(&CastConfig::default())
    }
}

/// Spellings of a missing value accepted inside strings.
fn is_null_str(s: &str) -> bool {
    s.is_empty() || matches!(s.to_ascii_lowercase().as_str(), "nat" | "nan" | "none")
}

impl Parsers for ChronoParsers {
    fn parse_datetime(&self, value: &Value) -> Result<i64, CastError> {
        if is_null(value) {
            return Ok(INAT);
        }
        match value {
            Value::Str(s) => {
                let s = s.trim();
                if is_null_str(s) {
                    return Ok(INAT);
                }
                self.parse_datetime_str(s)
                    .ok_or_else(|| CastError::parse(s, "datetime"))
            }
            Value::Bool(_) => Err(CastError::parse(value, "datetime")),
            v if v.is_integer() => v
                .as_i128()
                .and_then(|i| i64::try_from(i).ok())
                .and_then(|i| unit_to_nanos(i, self.epoch_unit))
                .ok_or_else(|| CastError::OutOfBoundsDatetime(v.to_string())),
            v if v.is_float() => v
                .as_f64()
                .map(|f| f * unit_factor(self.epoch_unit) as f64)
                .and_then(num_traits::cast::<f64, i64>)
                .ok_or_else(|| CastError::OutOfBoundsDatetime(v.to_string())),
            v => datetime_nanos(v, false).map_err(|_| CastError::parse(v, "datetime")),
        }
    }

    fn parse_duration(&self, value: &Value) -> Result<i64, CastError> {
        if is_null(value) {
            return Ok(INAT);
        }
        match value {
            Value::Str(s) => {
                let s = s.trim();
                if is_null_str(s) {
                    return Ok(INAT);
                }
                parse_duration_str(s).ok_or_else(|| CastError::parse(s, "timedelta"))
            }
            Value::Bool(_) => Err(CastError::parse(value, "timedelta")),
            v => duration_nanos(v, true).map_err(|_| CastError::parse(v, "timedelta")),
        }
    }

    fn parse_numeric(&self, value: &Value) -> Result<Value, CastError> {
        if is_null(value) {
            return Ok(Value::Float(f64::NAN));
        }
        match value {
            Value::Bool(_) | Value::Int(_) | Value::Typed(_) | Value::Float(_) => Ok(value.clone()),
            Value::Str(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(Value::Float(f64::NAN));
                }
                if let Ok(i) = s.parse::<i64>() {
                    return Ok(Value::Int(i));
                }
                s.parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| CastError::parse(s, "number"))
            }
            other => Err(CastError::parse(other, "number")),
        }
    }
}

fn unit_factor(unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Second => 1_000_000_000,
        TimeUnit::Millisecond => 1_000_000,
        TimeUnit::Microsecond => 1_000,
        TimeUnit::Nanosecond => 1,
    }
}

//==================================================================================
// Duration strings
//==================================================================================

/// Parses `"1 days 02:03:04.5"`, `"-1 days +01:00:00"`, `"02:03:04"`, unit strings
/// such as `"1h30m"` or `"15 min"`, and bare integers (nanoseconds).
fn parse_duration_str(s: &str) -> Option<i64> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if let Ok(ns) = body.parse::<i64>() {
        return Some(if negative { -ns } else { ns });
    }

    let sign: i128 = if negative { -1 } else { 1 };
    let total = match split_days(body) {
        // The sign of a day count covers only the days: "-1 days +12:00:00" is -12h.
        Some((days, tail)) => {
            let (tail_sign, tail) = match tail.strip_prefix('-') {
                Some(t) => (-1, t.trim_start()),
                None => (1, tail),
            };
            sign * days * NANOS_PER_DAY + tail_sign * parse_time_part(tail)?
        }
        None => sign * parse_time_part(body)?,
    };
    i64::try_from(total).ok().filter(|ns| *ns != INAT)
}

fn parse_time_part(s: &str) -> Option<i128> {
    if s.is_empty() {
        Some(0)
    } else if s.contains(':') {
        parse_clock(s)
    } else {
        parse_unit_tokens(s)
    }
}

/// Splits a leading `"N day(s)"` off, returning the days and the remaining text
/// (with any `+`/`,` separator removed).
fn split_days(s: &str) -> Option<(i128, &str)> {
    let mut words = s.splitn(3, char::is_whitespace);
    let days = words.next()?.parse::<i128>().ok()?;
    if !words.next()?.starts_with("day") {
        return None;
    }
    let tail = words
        .next()
        .unwrap_or("")
        .trim()
        .trim_start_matches([',', '+'])
        .trim();
    Some((days, tail))
}

/// `HH:MM:SS(.fraction)` or `HH:MM`.
fn parse_clock(s: &str) -> Option<i128> {
    let parts: Vec<&str> = s.split(':').collect();
    let (h, m, sec) = match parts.as_slice() {
        [h, m] => (*h, *m, "0"),
        [h, m, sec] => (*h, *m, *sec),
        _ => return None,
    };
    let hours = h.parse::<i128>().ok()?;
    let minutes = m.parse::<i128>().ok()?;
    let (whole, frac) = sec.split_once('.').unwrap_or((sec, ""));
    let seconds = whole.parse::<i128>().ok()?;
    Some(
        hours * NANOS_PER_HOUR
            + minutes * NANOS_PER_MINUTE
            + seconds * NANOS_PER_SECOND
            + fraction_nanos(frac)?,
    )
}

/// Nanoseconds for the digits after a decimal point (at most nine are kept).
fn fraction_nanos(frac: &str) -> Option<i128> {
    if frac.is_empty() {
        return Some(0);
    }
    if !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let digits: String = frac.chars().chain(std::iter::repeat('0')).take(9).collect();
    digits.parse::<i128>().ok()
}

/// A sequence of `<number><unit>` tokens, optionally separated by whitespace.
fn parse_unit_tokens(s: &str) -> Option<i128> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let mut chars = compact.chars().peekable();
    let mut total = 0i128;
    let mut seen = false;
    while chars.peek().is_some() {
        let number: String = std::iter::from_fn(|| {
            chars.next_if(|c| c.is_ascii_digit() || *c == '.')
        })
        .collect();
        let unit: String = std::iter::from_fn(|| chars.next_if(|c| c.is_ascii_alphabetic())).collect();
        if number.is_empty() || unit.is_empty() {
            return None;
        }
        let factor = unit_nanos(&unit.to_ascii_lowercase())?;
        let (whole, frac) = number.split_once('.').unwrap_or((&number, ""));
        let whole = whole.parse::<i128>().ok()?;
        let frac_ns = fraction_nanos(frac)? * factor / NANOS_PER_SECOND;
        total += whole * factor + frac_ns;
        seen = true;
    }
    seen.then_some(total)
}

fn unit_nanos(unit: &str) -> Option<i128> {
    Some(match unit {
        "w" | "week" | "weeks" => 7 * NANOS_PER_DAY,
        "d" | "day" | "days" => NANOS_PER_DAY,
        "h" | "hr" | "hour" | "hours" => NANOS_PER_HOUR,
        "m" | "min" | "minute" | "minutes" => NANOS_PER_MINUTE,
        "s" | "sec" | "second" | "seconds" => NANOS_PER_SECOND,
        "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => NANOS_PER_MILLI,
        "us" | "micro" | "micros" | "microsecond" | "microseconds" => NANOS_PER_MICRO,
        "ns" | "nano" | "nanos" | "nanosecond" | "nanoseconds" => 1,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_parse_datetime_strings() {
        let p = ChronoParsers::default();
        assert_eq!(p.parse_datetime(&Value::from("1970-01-02")).unwrap(), 86_400_000_000_000);
        assert_eq!(
            p.parse_datetime(&Value::from("1970-01-01T01:00:00+01:00")).unwrap(),
            0
        );
        assert_eq!(p.parse_datetime(&Value::from("")).unwrap(), INAT);
        assert!(p.parse_datetime(&Value::from("not a date")).is_err());
    }

    #[test]
    fn test_parse_datetime_numbers_use_epoch_unit() {
        let config = CastConfig {
            epoch_unit: TimeUnit::Second,
            ..CastConfig::default()
        };
        let p = ChronoParsers::new(&config);
        assert_eq!(p.parse_datetime(&Value::Int(2)).unwrap(), 2_000_000_000);
        assert_eq!(p.parse_datetime(&Value::Float(1.5)).unwrap(), 1_500_000_000);
        assert!(p.parse_datetime(&Value::Bool(true)).is_err());
    }

    #[test]
    fn test_parse_duration_strings() {
        let cases = [
            ("1 days", 86_400_000_000_000i64),
            ("1 days 00:00:01", 86_401_000_000_000),
            ("-1 days +12:00:00", -43_200_000_000_000),
            ("00:00:01.5", 1_500_000_000),
            ("1h30m", 5_400_000_000_000),
            ("15 min", 900_000_000_000),
            ("250ms", 250_000_000),
            ("42", 42),
        ];
        for (text, want) in cases {
            assert_eq!(parse_duration_str(text), Some(want), "{}", text);
        }
        assert_eq!(parse_duration_str("soon"), None);
        assert_eq!(parse_duration_str("5 parsecs"), None);
    }

    #[test]
    fn test_parse_duration_values() {
        let p = ChronoParsers::default();
        assert_eq!(p.parse_duration(&Value::Duration(TimeDelta::seconds(1))).unwrap(), 1_000_000_000);
        assert_eq!(p.parse_duration(&Value::Int(7)).unwrap(), 7);
        assert_eq!(p.parse_duration(&Value::None).unwrap(), INAT);
    }

    #[test]
    fn test_parse_numeric() {
        let p = ChronoParsers::default();
        assert_eq!(p.parse_numeric(&Value::from(" 12 ")).unwrap(), Value::Int(12));
        assert_eq!(p.parse_numeric(&Value::from("1e3")).unwrap(), Value::Float(1000.0));
        assert!(p.parse_numeric(&Value::from("abc")).is_err());
        assert!(p.parse_numeric(&Value::Opaque("obj".into())).is_err());
    }
}
