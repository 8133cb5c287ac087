//! Kind inference: names the dominant element type of an object array.

use crate::types::Value;

/// The dominant element type of a sequence of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InferredKind {
    Empty,
    Boolean,
    Integer,
    Floating,
    MixedIntegerFloat,
    Complex,
    String,
    /// Native datetime objects, possibly mixed with raw datetime64 counts.
    DateTime,
    DateTime64,
    Date,
    /// Native duration objects, possibly mixed with raw timedelta64 counts.
    Timedelta,
    Timedelta64,
    Mixed,
}

impl InferredKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferredKind::Empty => "empty",
            InferredKind::Boolean => "boolean",
            InferredKind::Integer => "integer",
            InferredKind::Floating => "floating",
            InferredKind::MixedIntegerFloat => "mixed-integer-float",
            InferredKind::Complex => "complex",
            InferredKind::String => "string",
            InferredKind::DateTime => "datetime",
            InferredKind::DateTime64 => "datetime64",
            InferredKind::Date => "date",
            InferredKind::Timedelta => "timedelta",
            InferredKind::Timedelta64 => "timedelta64",
            InferredKind::Mixed => "mixed",
        }
    }
}

/// The kind of one non-null element.
fn element_kind(value: &Value) -> InferredKind {
    match value {
        Value::Bool(_) => InferredKind::Boolean,
        v if v.is_integer() => InferredKind::Integer,
        v if v.is_float() => InferredKind::Floating,
        Value::Complex(_) => InferredKind::Complex,
        Value::Str(_) => InferredKind::String,
        Value::DateTime(_) | Value::DateTimeTz(_) => InferredKind::DateTime,
        Value::DateTime64 { .. } => InferredKind::DateTime64,
        Value::Date(_) => InferredKind::Date,
        Value::Duration(_) => InferredKind::Timedelta,
        Value::Timedelta64 { .. } => InferredKind::Timedelta64,
        _ => InferredKind::Mixed,
    }
}

/// Combines the kinds of two elements.
fn merge(a: InferredKind, b: InferredKind) -> InferredKind {
    use InferredKind::*;
    match (a, b) {
        (x, y) if x == y => x,
        (Integer | MixedIntegerFloat, Floating | MixedIntegerFloat)
        | (Floating, Integer | MixedIntegerFloat) => MixedIntegerFloat,
        (DateTime, DateTime64) | (DateTime64, DateTime) => DateTime,
        (Timedelta, Timedelta64) | (Timedelta64, Timedelta) => Timedelta,
        _ => Mixed,
    }
}

/// Infers the dominant kind of `values`. `None` and `NaT` are skipped; a float NaN
/// counts as floating. An array holding only skipped markers is `Mixed`.
pub fn infer_kind(values: &[Value]) -> InferredKind {
    if values.is_empty() {
        return InferredKind::Empty;
    }
    values
        .iter()
        .filter(|v| !matches!(v, Value::None | Value::NaT))
        .map(element_kind)
        .reduce(merge)
        .unwrap_or(InferredKind::Mixed)
}

/// True when every element is a string, a null, a datetime or a duration, and at
/// least one datetime or duration is present.
pub fn is_possible_datetimelike(values: &[Value]) -> bool {
    let mut seen = false;
    for v in values {
        match v {
            Value::Str(_) => {}
            v if v.is_null() => {}
            Value::DateTime(_)
            | Value::DateTimeTz(_)
            | Value::DateTime64 { .. }
            | Value::Duration(_)
            | Value::Timedelta64 { .. } => seen = true,
            _ => return false,
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_schema::TimeUnit;
    use chrono::{NaiveDate, TimeDelta};

    fn dt() -> Value {
        Value::DateTime(
            NaiveDate::from_ymd_opt(2020, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_basic_kinds() {
        assert_eq!(infer_kind(&[]), InferredKind::Empty);
        assert_eq!(infer_kind(&[Value::Bool(true)]), InferredKind::Boolean);
        assert_eq!(infer_kind(&[Value::Int(1), Value::None]), InferredKind::Integer);
        assert_eq!(
            infer_kind(&[Value::Int(1), Value::Float(f64::NAN)]),
            InferredKind::MixedIntegerFloat
        );
        assert_eq!(infer_kind(&[Value::from("a")]), InferredKind::String);
        assert_eq!(infer_kind(&[Value::None, Value::NaT]), InferredKind::Mixed);
        assert_eq!(infer_kind(&[Value::Int(1), Value::from("a")]), InferredKind::Mixed);
    }

    #[test]
    fn test_temporal_kinds() {
        let raw = Value::DateTime64 {
            value: 0,
            unit: TimeUnit::Second,
        };
        assert_eq!(infer_kind(&[dt(), Value::NaT]), InferredKind::DateTime);
        assert_eq!(infer_kind(&[raw.clone()]), InferredKind::DateTime64);
        assert_eq!(infer_kind(&[raw, dt()]), InferredKind::DateTime);
        assert_eq!(
            infer_kind(&[Value::Duration(TimeDelta::seconds(1))]),
            InferredKind::Timedelta
        );
    }

    #[test]
    fn test_possible_datetimelike() {
        assert!(is_possible_datetimelike(&[Value::from("x"), dt(), Value::None]));
        assert!(!is_possible_datetimelike(&[Value::from("x"), Value::None]));
        assert!(!is_possible_datetimelike(&[dt(), Value::Int(1)]));
    }
}
