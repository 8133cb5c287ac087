//! Scalar inference: the dtype a single dynamic value would be stored as.

use arrow_schema::TimeUnit;

use crate::error::CastError;
use crate::types::array::{datetime_nanos, duration_nanos};
use crate::types::{DType, NumericScalar, TypedArray, Value};

/// Infers the dtype of `value` and returns it with the value normalized for that
/// dtype. Datetime-likes become `Value::Int` nanosecond counts; strings, tz-aware
/// datetimes and unrecognized objects stay Object.
pub fn infer_scalar(value: &Value) -> Result<(DType, Value), CastError> {
    match value {
        Value::NdArray { shape, values } => {
            if !shape.is_empty() {
                return Err(CastError::InvalidNdim(shape.len()));
            }
            if values.len() != 1 {
                return Err(CastError::LengthMismatch {
                    expected: 1,
                    got: values.len(),
                });
            }
            // Datetime-like buffers hand back their raw nanosecond count.
            let item = match &**values {
                TypedArray::DateTime { values: ns, .. } | TypedArray::Duration(ns) => {
                    Value::Int(ns[0])
                }
                other => other.get(0),
            };
            Ok((values.dtype(), item))
        }
        Value::Str(_) => Ok((DType::Object, value.clone())),
        Value::NaT | Value::DateTime(_) | Value::DateTime64 { .. } => {
            Ok((DType::DATETIME_NS, Value::Int(datetime_nanos(value, false)?)))
        }
        Value::Duration(_) | Value::Timedelta64 { .. } => {
            Ok((DType::Duration, Value::Int(duration_nanos(value, false)?)))
        }
        Value::Bool(_) => Ok((DType::Bool, value.clone())),
        Value::Int(_) => Ok((DType::INT64, value.clone())),
        Value::Typed(n) => Ok((n.dtype(), value.clone())),
        Value::Float(_) => Ok((DType::FLOAT64, value.clone())),
        Value::Complex(_) => Ok((DType::COMPLEX128, value.clone())),
        _ => Ok((DType::Object, value.clone())),
    }
}

/// Infers `value`'s dtype and returns the value as a scalar of that dtype: untyped
/// numbers gain their default width and datetime-likes become nanosecond counts.
pub fn maybe_convert_scalar(value: &Value) -> Result<Value, CastError> {
    let (dtype, normalized) = infer_scalar(value)?;
    let converted = match (&dtype, normalized) {
        (DType::DateTime { .. }, Value::Int(ns)) => Value::DateTime64 {
            value: ns,
            unit: TimeUnit::Nanosecond,
        },
        (DType::Duration, Value::Int(ns)) => Value::Timedelta64 {
            value: ns,
            unit: TimeUnit::Nanosecond,
        },
        (_, Value::Int(i)) => Value::Typed(NumericScalar::I64(i)),
        (_, Value::Float(f)) => Value::Typed(NumericScalar::F64(f)),
        (_, other) => other,
    };
    Ok(converted)
}
