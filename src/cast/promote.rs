//! The promotion resolver: the smallest dtype change that lets an array of
//! `dtype` hold a given fill value, together with the normalized fill.

use std::borrow::Cow;

use crate::error::CastError;
use crate::null_handling::{is_null, INAT};
use crate::types::{DType, Datum, TypedArray, Value};

use super::CastContext;

/// The outcome of a promotion: the dtype to store in and the fill to store.
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    pub dtype: DType,
    pub fill_value: Value,
}

/// Decides the dtype that can hold `fill` alongside values of `dtype`.
///
/// Datetime-like dtypes never change: null fills become `iNaT` and other fills are
/// parsed to nanoseconds (`iNaT` when unparsable). Numeric dtypes widen only as
/// far as the fill requires; anything unrecognized lands in Object.
pub fn promote(dtype: &DType, fill: &Datum, ctx: &CastContext) -> Promotion {
    let mut dtype = dtype.clone();
    let fill_value = match fill {
        Datum::Scalar(v) => v.clone(),
        Datum::Array(arr) => {
            let elem = arr.dtype();
            if elem.is_datetimelike() {
                Value::Int(INAT)
            } else {
                if elem.is_object() && !dtype.is_categorical() {
                    dtype = DType::Object;
                }
                Value::Float(f64::NAN)
            }
        }
    };

    if dtype.is_categorical() {
        return Promotion { dtype, fill_value };
    }
    let (dtype, fill_value) = promote_scalar(dtype, fill_value, ctx);
    let dtype = match dtype {
        DType::Str => DType::Object,
        other => other,
    };
    Promotion { dtype, fill_value }
}

fn promote_scalar(dtype: DType, fill: Value, ctx: &CastContext) -> (DType, Value) {
    match &dtype {
        DType::DateTime { tz: None } | DType::Duration => {
            let ns = if is_null(&fill) {
                INAT
            } else if dtype.is_duration() {
                ctx.parsers.parse_duration(&fill).unwrap_or(INAT)
            } else {
                ctx.parsers.parse_datetime(&fill).unwrap_or(INAT)
            };
            return (dtype, Value::Int(ns));
        }
        DType::DateTime { tz: Some(_) } => {
            let fill = if is_null(&fill) { Value::Int(INAT) } else { fill };
            return (dtype, fill);
        }
        _ => {}
    }

    let promoted = if fill.is_float() {
        match dtype {
            DType::Bool => DType::Object,
            DType::Int(_) | DType::UInt(_) => DType::FLOAT64,
            other => other,
        }
    } else if fill.is_bool() {
        match dtype {
            DType::Bool => DType::Bool,
            _ => DType::Object,
        }
    } else if fill.is_integer() {
        if dtype.is_bool() {
            DType::Object
        } else if dtype.is_integer() && !fits(&dtype, &fill) {
            fill.natural_numeric_dtype().unwrap_or(DType::INT64)
        } else {
            dtype
        }
    } else if fill.is_complex() {
        match dtype {
            DType::Bool => DType::Object,
            DType::Int(_) | DType::UInt(_) | DType::Float(_) => DType::COMPLEX128,
            other => other,
        }
    } else if matches!(fill, Value::None) {
        return match dtype {
            DType::Float(_) | DType::Complex(_) => (dtype, Value::Float(f64::NAN)),
            DType::Int(_) | DType::UInt(_) => (DType::FLOAT64, Value::Float(f64::NAN)),
            _ => (DType::Object, fill),
        };
    } else {
        DType::Object
    };
    (promoted, fill)
}

/// True when `value` round-trips through `dtype` unchanged.
fn fits(dtype: &DType, value: &Value) -> bool {
    TypedArray::from_values_as(dtype, std::slice::from_ref(value), true).is_ok()
}

/// Promotes `values` (or the `dtype` override) for `fill` and casts the array when
/// the dtype changes. The array is borrowed back unless a cast or `copy` demands
/// a fresh one.
pub fn maybe_upcast<'a>(
    values: &'a TypedArray,
    fill: &Datum,
    dtype: Option<&DType>,
    copy: bool,
    ctx: &CastContext,
) -> Result<(Cow<'a, TypedArray>, Value), CastError> {
    let current = values.dtype();
    let Promotion { dtype, fill_value } = promote(dtype.unwrap_or(&current), fill, ctx);
    let values = if dtype != current {
        Cow::Owned(values.astype(&dtype)?)
    } else if copy {
        Cow::Owned(values.clone())
    } else {
        Cow::Borrowed(values)
    };
    Ok((values, fill_value))
}
