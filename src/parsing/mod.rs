//! The parsing capability: turning strings and loosely-typed objects into
//! nanosecond datetimes, nanosecond durations and numbers.
//!
//! The engine only depends on the `Parsers` trait. `ChronoParsers` is the default
//! implementation; callers with their own date grammar plug in a different one
//! through the `CastContext`. The array helpers (`to_datetime`, `to_timedelta`,
//! `to_numeric`) lift a scalar parser over a whole array under a `ConversionMode`.

pub mod chrono_impl;

use chrono::FixedOffset;
use std::fmt;

use crate::error::CastError;
use crate::null_handling::{is_null, INAT};
use crate::types::{DType, TypedArray, Value};

pub use chrono_impl::ChronoParsers;

/// What an array parser does with an element it cannot parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionMode {
    /// Fail the whole conversion.
    #[default]
    Raise,
    /// Replace the element with its family's null.
    Coerce,
    /// Give back the input array unchanged.
    Ignore,
}

/// Scalar parsers the engine consumes. Null inputs must parse to the family null
/// (`iNaT` or NaN) rather than fail.
pub trait Parsers: Send + Sync + fmt::Debug {
    /// Nanoseconds since the epoch (UTC) for a datetime-like value.
    fn parse_datetime(&self, value: &Value) -> Result<i64, CastError>;

    /// Nanoseconds for a duration-like value.
    fn parse_duration(&self, value: &Value) -> Result<i64, CastError>;

    /// A `Value::Int`, `Value::Float` or `Value::Bool` for a number-like value.
    fn parse_numeric(&self, value: &Value) -> Result<Value, CastError>;
}

//==================================================================================
// 1. Array Helpers
//==================================================================================

/// Applies `parse` to every element, resolving failures per `mode`. `Ok(None)`
/// signals that `Ignore` gave up and the caller should return its input.
fn parse_all<T>(
    values: &[Value],
    mode: ConversionMode,
    null: T,
    parse: impl Fn(&Value) -> Result<T, CastError>,
) -> Result<Option<Vec<T>>, CastError>
where
    T: Clone,
{
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        match parse(v) {
            Ok(x) => out.push(x),
            Err(e) => match mode {
                ConversionMode::Raise => return Err(e),
                ConversionMode::Coerce => out.push(null.clone()),
                ConversionMode::Ignore => {
                    log::debug!("parse ignored, keeping input: {}", e);
                    return Ok(None);
                }
            },
        }
    }
    Ok(Some(out))
}

/// Parses every element as a datetime, producing a naive (UTC) `DateTime` array.
pub fn to_datetime(
    values: &TypedArray,
    mode: ConversionMode,
    parsers: &dyn Parsers,
) -> Result<TypedArray, CastError> {
    if let TypedArray::DateTime { values, .. } = values {
        return Ok(TypedArray::datetime(values.clone(), None));
    }
    let parsed = parse_all(&values.to_values(), mode, INAT, |v| parsers.parse_datetime(v))?;
    Ok(match parsed {
        Some(ns) => TypedArray::datetime(ns, None),
        None => values.clone(),
    })
}

/// Parses every element as a duration, producing a `Duration` array.
pub fn to_timedelta(
    values: &TypedArray,
    mode: ConversionMode,
    parsers: &dyn Parsers,
) -> Result<TypedArray, CastError> {
    if let TypedArray::Duration(_) = values {
        return Ok(values.clone());
    }
    let parsed = parse_all(&values.to_values(), mode, INAT, |v| parsers.parse_duration(v))?;
    Ok(match parsed {
        Some(ns) => TypedArray::Duration(ns),
        None => values.clone(),
    })
}

/// Parses every element as a number. All-integer input yields `Int64`, all-bool
/// input yields `Bool`, and any float or null yields `Float64`.
pub fn to_numeric(
    values: &TypedArray,
    mode: ConversionMode,
    parsers: &dyn Parsers,
) -> Result<TypedArray, CastError> {
    let dtype = values.dtype();
    if dtype.is_bool() || dtype.is_integer() || dtype.is_float() {
        return Ok(values.clone());
    }
    let parsed = parse_all(
        &values.to_values(),
        mode,
        Value::Float(f64::NAN),
        |v| parsers.parse_numeric(v),
    )?;
    let Some(parsed) = parsed else {
        return Ok(values.clone());
    };

    let target = if parsed.iter().all(Value::is_bool) && !parsed.is_empty() {
        DType::Bool
    } else if parsed.iter().all(|v| v.is_integer() || v.is_bool()) {
        DType::INT64
    } else if parsed.iter().all(|v| v.is_real_number() || is_null(v)) {
        DType::FLOAT64
    } else {
        DType::Object
    };
    TypedArray::from_values_as(&target, &parsed, false)
}

//==================================================================================
// 2. Timezones
//==================================================================================

/// Resolves a timezone name to a fixed UTC offset. Accepts `UTC`/`GMT`/`Z` and
/// numeric offsets in `+HH:MM`, `+HHMM` or `+HH` form.
pub fn fixed_offset(tz: &str) -> Result<FixedOffset, CastError> {
    let unknown = || CastError::UnknownTimezone(tz.to_string());
    let name = tz.trim();
    if matches!(
        name.to_ascii_uppercase().as_str(),
        "UTC" | "GMT" | "Z" | "ETC/UTC" | "ETC/GMT"
    ) {
        return FixedOffset::east_opt(0).ok_or_else(unknown);
    }

    let (sign, digits) = match name.as_bytes().first() {
        Some(b'+') => (1, &name[1..]),
        Some(b'-') => (-1, &name[1..]),
        _ => return Err(unknown()),
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(unknown());
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok(), Some(0)),
        4 => (digits[..2].parse::<i32>().ok(), digits[2..].parse::<i32>().ok()),
        _ => (None, None),
    };
    match (hours, minutes) {
        (Some(h), Some(m)) if h < 24 && m < 60 => {
            FixedOffset::east_opt(sign * (h * 3600 + m * 60)).ok_or_else(unknown)
        }
        _ => Err(unknown()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(items: &[&str]) -> TypedArray {
        TypedArray::Object(items.iter().map(|s| Value::from(*s)).collect())
    }

    #[test]
    fn test_to_numeric_all_integers() {
        let parsers = ChronoParsers::default();
        let got = to_numeric(&strs(&["1", "2", "3"]), ConversionMode::Coerce, &parsers).unwrap();
        assert_eq!(got, TypedArray::from(vec![1i64, 2, 3]));
    }

    #[test]
    fn test_to_numeric_coerces_failures_to_nan() {
        let parsers = ChronoParsers::default();
        let got = to_numeric(&strs(&["1", "2", "x"]), ConversionMode::Coerce, &parsers).unwrap();
        let TypedArray::Float64(v) = got else {
            panic!("expected float64, got {:?}", got);
        };
        assert_eq!(&v[..2], &[1.0, 2.0]);
        assert!(v[2].is_nan());
    }

    #[test]
    fn test_to_numeric_modes_on_failure() {
        let parsers = ChronoParsers::default();
        let input = strs(&["1", "x"]);
        assert!(to_numeric(&input, ConversionMode::Raise, &parsers).is_err());
        assert_eq!(
            to_numeric(&input, ConversionMode::Ignore, &parsers).unwrap(),
            input
        );
    }

    #[test]
    fn test_to_datetime_and_timedelta() {
        let parsers = ChronoParsers::default();
        let got = to_datetime(&strs(&["1970-01-01 00:00:01", "NaT"]), ConversionMode::Raise, &parsers)
            .unwrap();
        assert_eq!(got, TypedArray::datetime(vec![1_000_000_000, INAT], None));

        let got = to_timedelta(&strs(&["1 days", "bogus"]), ConversionMode::Coerce, &parsers).unwrap();
        assert_eq!(got, TypedArray::Duration(vec![86_400_000_000_000, INAT]));
    }

    #[test]
    fn test_fixed_offset() {
        assert_eq!(fixed_offset("UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(fixed_offset("+05:30").unwrap().local_minus_utc(), 19_800);
        assert_eq!(fixed_offset("-0800").unwrap().local_minus_utc(), -28_800);
        assert_eq!(fixed_offset("+02").unwrap().local_minus_utc(), 7_200);
        assert!(matches!(
            fixed_offset("US/Eastern"),
            Err(CastError::UnknownTimezone(_))
        ));
    }
}
