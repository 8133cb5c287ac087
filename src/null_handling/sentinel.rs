//! Per-dtype null sentinels as dynamic values.

use crate::types::{DType, NullSentinel, Value};

use super::INAT;

/// The value a buffer of `dtype` stores for a missing entry, or `None` when the
/// dtype cannot represent one.
pub fn sentinel_value(dtype: &DType) -> Option<Value> {
    dtype.null_sentinel().map(|s| match s {
        NullSentinel::NotATime => Value::Int(INAT),
        NullSentinel::NotANumber => Value::Float(f64::NAN),
        NullSentinel::ObjectNone => Value::None,
    })
}

/// The null fill a promotion hands back for `dtype`: the family sentinel where one
/// exists, NaN otherwise (the caller is about to move to a float dtype).
pub fn null_fill(dtype: &DType) -> Value {
    match dtype.null_sentinel() {
        Some(NullSentinel::NotATime) => Value::Int(INAT),
        _ => Value::Float(f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_per_family() {
        assert_eq!(sentinel_value(&DType::DATETIME_NS), Some(Value::Int(INAT)));
        assert_eq!(sentinel_value(&DType::Duration), Some(Value::Int(INAT)));
        assert!(matches!(sentinel_value(&DType::FLOAT32), Some(Value::Float(f)) if f.is_nan()));
        assert_eq!(sentinel_value(&DType::Object), Some(Value::None));
        assert_eq!(sentinel_value(&DType::INT64), None);
        assert_eq!(sentinel_value(&DType::Bool), None);
        assert_eq!(sentinel_value(&DType::Str), None);
    }

    #[test]
    fn test_null_fill() {
        assert_eq!(null_fill(&DType::datetime_tz("UTC")), Value::Int(INAT));
        assert!(null_fill(&DType::INT8).is_null());
    }
}
