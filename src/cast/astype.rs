//! Nan-safe `astype` and the small coercion helpers built around it.

use chrono::TimeDelta;
use std::borrow::Cow;

use crate::error::CastError;
use crate::null_handling::{is_null, INAT};
use crate::types::value::nanos_to_naive;
use crate::types::{DType, Datum, IntWidth, TypedArray, Value};

use super::datetimelike::datetime_objects;
use super::objects::{maybe_convert_objects, MaybeConvertOptions};
use super::CastContext;

/// Casts `arr` to `dtype`, refusing the casts a plain `astype` would get wrong:
/// NaN into an integer, and datetime-likes into anything but their raw `Int64`
/// counts, Object, or themselves. With `copy` unset an unchanged dtype borrows.
pub fn astype_nansafe<'a>(
    arr: &'a TypedArray,
    dtype: &DType,
    copy: bool,
) -> Result<Cow<'a, TypedArray>, CastError> {
    let invalid = || CastError::InvalidCast {
        from: arr.dtype(),
        to: dtype.clone(),
    };

    if *dtype == DType::Str {
        return Ok(Cow::Owned(TypedArray::from_values_as(dtype, &arr.to_values(), false)?));
    }

    match arr {
        TypedArray::DateTime { values, tz: None } => {
            return match dtype {
                DType::Object => Ok(Cow::Owned(TypedArray::Object(datetime_objects(values)))),
                DType::Int(IntWidth::W64) => Ok(Cow::Owned(TypedArray::Int64(values.clone()))),
                DType::DateTime { tz: None } => Ok(same(arr, copy)),
                _ => Err(invalid()),
            };
        }
        TypedArray::Duration(values) => {
            return match dtype {
                DType::Int(IntWidth::W64) => Ok(Cow::Owned(TypedArray::Int64(values.clone()))),
                DType::Object => Ok(Cow::Owned(TypedArray::Object(
                    values
                        .iter()
                        .map(|&ns| {
                            if ns == INAT {
                                Value::NaT
                            } else {
                                Value::Duration(TimeDelta::nanoseconds(ns))
                            }
                        })
                        .collect(),
                ))),
                DType::Duration => Ok(same(arr, copy)),
                DType::Float(_) => {
                    let freq: Vec<f64> = values
                        .iter()
                        .map(|&ns| if ns == INAT { f64::NAN } else { ns as f64 })
                        .collect();
                    TypedArray::Float64(freq).astype(dtype).map(Cow::Owned)
                }
                _ => Err(invalid()),
            };
        }
        _ => {}
    }

    let from = arr.dtype();
    if from.is_float() && dtype.is_integer() && arr.has_nulls() {
        return Err(CastError::NaNToInteger);
    }
    if from.is_object() && dtype.is_integer() {
        return Ok(Cow::Owned(TypedArray::from_values_as(dtype, &arr.to_values(), true)?));
    }
    if from == *dtype {
        return Ok(same(arr, copy));
    }
    arr.astype(dtype).map(Cow::Owned)
}

fn same(arr: &TypedArray, copy: bool) -> Cow<'_, TypedArray> {
    if copy {
        Cow::Owned(arr.clone())
    } else {
        Cow::Borrowed(arr)
    }
}

/// Coerces each element of a result row to the dtype of its column. Elements
/// that cannot be coerced, and nulls, are kept as they are.
pub fn coerce_to_dtypes(
    values: &[Value],
    dtypes: &[DType],
    ctx: &CastContext,
) -> Result<Vec<Value>, CastError> {
    if values.len() != dtypes.len() {
        return Err(CastError::LengthMismatch {
            expected: dtypes.len(),
            got: values.len(),
        });
    }
    Ok(values
        .iter()
        .zip(dtypes)
        .map(|(v, dtype)| coerce_one(v, dtype, ctx).unwrap_or_else(|| v.clone()))
        .collect())
}

fn coerce_one(value: &Value, dtype: &DType, ctx: &CastContext) -> Option<Value> {
    if is_null(value) {
        return None;
    }
    match dtype {
        DType::DateTime { tz: None } => ctx
            .parsers
            .parse_datetime(value)
            .ok()
            .and_then(nanos_to_naive)
            .map(Value::DateTime),
        DType::Duration => ctx
            .parsers
            .parse_duration(value)
            .ok()
            .filter(|ns| *ns != INAT)
            .map(|ns| Value::Duration(TimeDelta::nanoseconds(ns))),
        DType::Bool => match value {
            // Integers other than 0 and 1 are not booleans.
            v if v.is_integer() => match v.as_i128() {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => v.as_i128().and_then(|i| i64::try_from(i).ok()).map(Value::Int),
            },
            Value::Str(s) => Some(Value::Bool(!s.is_empty())),
            v => v.as_f64().map(|f| Value::Bool(f != 0.0)),
        },
        DType::Float(_) => match value {
            Value::Str(s) => s.trim().parse::<f64>().ok().map(Value::Float),
            v => v.as_f64().map(Value::Float),
        },
        DType::Int(_) => match value {
            Value::Str(s) => s.trim().parse::<i64>().ok().map(Value::Int),
            v => match v.as_i128() {
                Some(i) => i64::try_from(i).ok().map(Value::Int),
                None => v
                    .as_f64()
                    .filter(|f| f.is_finite())
                    .and_then(num_traits::cast::<f64, i64>)
                    .map(Value::Int),
            },
        },
        _ => None,
    }
}

/// Stores category codes in the narrowest signed integer dtype whose maximum
/// exceeds the number of categories.
pub fn coerce_indexer_dtype(indexer: &[i64], n_categories: usize) -> TypedArray {
    let n = n_categories as u64;
    if n < i8::MAX as u64 {
        TypedArray::Int8(indexer.iter().map(|&i| i as i8).collect())
    } else if n < i16::MAX as u64 {
        TypedArray::Int16(indexer.iter().map(|&i| i as i16).collect())
    } else if n < i32::MAX as u64 {
        TypedArray::Int32(indexer.iter().map(|&i| i as i32).collect())
    } else {
        TypedArray::Int64(indexer.to_vec())
    }
}

/// Rejects a dtype selection that asks for fixed-width strings.
pub fn invalidate_string_dtypes(dtypes: &[DType]) -> Result<(), CastError> {
    if dtypes.contains(&DType::Str) {
        return Err(CastError::StringDTypeNotAllowed);
    }
    Ok(())
}

/// False when a cast into `arr`'s dtype must take the checked path. Integer
/// buffers cannot hold a missing value; nanosecond datetime-likes always can.
pub fn possibly_castable(arr: &TypedArray) -> bool {
    let dtype = arr.dtype();
    dtype.is_datetimelike() || !dtype.is_integer()
}

/// Keeps strings out of the fixed-width `Str` dtype: a string scalar becomes a
/// one-element Object array and a `Str` array becomes Object.
pub fn maybe_convert_string_to_object(values: Datum) -> Datum {
    match values {
        Datum::Scalar(Value::Str(s)) => Datum::Array(TypedArray::Object(vec![Value::Str(s)])),
        Datum::Array(TypedArray::Str(items)) => {
            Datum::Array(TypedArray::Object(items.into_iter().map(Value::Str).collect()))
        }
        other => other,
    }
}

/// Lets a freshly built Object array settle on its natural dtype. Arrays of any
/// other dtype are borrowed back unchanged.
pub fn convert_platform(values: &TypedArray) -> Cow<'_, TypedArray> {
    match values {
        TypedArray::Object(items) => {
            Cow::Owned(maybe_convert_objects(items, MaybeConvertOptions::default()))
        }
        other => Cow::Borrowed(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_nan_float_to_int_is_a_hard_error() {
        let arr = TypedArray::from(vec![1.0, f64::NAN]);
        assert!(matches!(
            astype_nansafe(&arr, &DType::INT64, true),
            Err(CastError::NaNToInteger)
        ));
        let clean = TypedArray::from(vec![1.7, -2.0]);
        assert_eq!(
            astype_nansafe(&clean, &DType::INT64, true).unwrap().into_owned(),
            TypedArray::from(vec![1i64, -2])
        );
    }

    #[test]
    fn test_datetime_source_rules() {
        let arr = TypedArray::datetime(vec![0, INAT], None);
        let objects = astype_nansafe(&arr, &DType::Object, true).unwrap().into_owned();
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(objects, TypedArray::Object(vec![Value::DateTime(epoch), Value::NaT]));
        assert_eq!(
            astype_nansafe(&arr, &DType::INT64, true).unwrap().into_owned(),
            TypedArray::from(vec![0i64, INAT])
        );
        assert!(matches!(astype_nansafe(&arr, &DType::DATETIME_NS, false).unwrap(), Cow::Borrowed(_)));
        assert!(matches!(
            astype_nansafe(&arr, &DType::FLOAT64, true),
            Err(CastError::InvalidCast { .. })
        ));
    }

    #[test]
    fn test_duration_source_rules() {
        let arr = TypedArray::Duration(vec![1_000, INAT]);
        let floats = astype_nansafe(&arr, &DType::FLOAT64, true).unwrap().into_owned();
        let TypedArray::Float64(v) = floats else {
            panic!("expected float64");
        };
        assert_eq!(v[0], 1_000.0);
        assert!(v[1].is_nan());
        let objects = astype_nansafe(&arr, &DType::Object, true).unwrap().into_owned();
        assert_eq!(objects.get(0), Value::Duration(TimeDelta::nanoseconds(1_000)));
        assert!(astype_nansafe(&arr, &DType::Bool, true).is_err());
    }

    #[test]
    fn test_object_to_int_is_exact() {
        let ok = TypedArray::Object(vec![Value::Int(1), Value::Float(2.0)]);
        assert_eq!(
            astype_nansafe(&ok, &DType::INT32, true).unwrap().into_owned(),
            TypedArray::from(vec![1i32, 2])
        );
        let bad = TypedArray::Object(vec![Value::Float(2.5)]);
        assert!(astype_nansafe(&bad, &DType::INT32, true).is_err());
    }

    #[test]
    fn test_str_target_renders_values() {
        let arr = TypedArray::from(vec![1i64, 2]);
        assert_eq!(
            astype_nansafe(&arr, &DType::Str, true).unwrap().into_owned(),
            TypedArray::Str(vec!["1".into(), "2".into()])
        );
    }

    #[test]
    fn test_coerce_to_dtypes() {
        let ctx = CastContext::default();
        let values = vec![
            Value::Int(2),
            Value::Int(1),
            Value::from("3.5"),
            Value::None,
            Value::from("1970-01-02"),
        ];
        let dtypes = vec![DType::Bool, DType::Bool, DType::FLOAT64, DType::INT64, DType::DATETIME_NS];
        let got = coerce_to_dtypes(&values, &dtypes, &ctx).unwrap();
        assert_eq!(got[0], Value::Int(2));
        assert_eq!(got[1], Value::Bool(true));
        assert_eq!(got[2], Value::Float(3.5));
        assert_eq!(got[3], Value::None);
        assert!(matches!(got[4], Value::DateTime(_)));

        assert!(matches!(
            coerce_to_dtypes(&values, &dtypes[..1], &ctx),
            Err(CastError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_coerce_indexer_dtype() {
        assert_eq!(coerce_indexer_dtype(&[0, 1, -1], 3).dtype(), DType::INT8);
        assert_eq!(coerce_indexer_dtype(&[0], 127).dtype(), DType::INT16);
        assert_eq!(coerce_indexer_dtype(&[0], 40_000).dtype(), DType::INT32);
        assert_eq!(coerce_indexer_dtype(&[5], 3).get(0).as_i128(), Some(5));
    }

    #[test]
    fn test_invalidate_string_dtypes() {
        assert!(invalidate_string_dtypes(&[DType::INT64, DType::Object]).is_ok());
        assert!(matches!(
            invalidate_string_dtypes(&[DType::Str]),
            Err(CastError::StringDTypeNotAllowed)
        ));
    }

    #[test]
    fn test_possibly_castable() {
        assert!(!possibly_castable(&TypedArray::from(vec![1i32])));
        assert!(!possibly_castable(&TypedArray::from(vec![1u64])));
        assert!(possibly_castable(&TypedArray::from(vec![1.0f64])));
        assert!(possibly_castable(&TypedArray::datetime(vec![0], None)));
        assert!(possibly_castable(&TypedArray::Duration(vec![0])));
        assert!(possibly_castable(&TypedArray::Object(vec![Value::Int(1)])));
    }

    #[test]
    fn test_maybe_convert_string_to_object() {
        assert_eq!(
            maybe_convert_string_to_object(Datum::Scalar(Value::from("a"))),
            Datum::Array(TypedArray::Object(vec![Value::from("a")]))
        );
        assert_eq!(
            maybe_convert_string_to_object(Datum::Array(TypedArray::Str(vec!["x".into()]))),
            Datum::Array(TypedArray::Object(vec![Value::from("x")]))
        );
        let ints = Datum::Array(TypedArray::from(vec![1i64]));
        assert_eq!(maybe_convert_string_to_object(ints.clone()), ints);
    }

    #[test]
    fn test_convert_platform() {
        let objects = TypedArray::Object(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(convert_platform(&objects).into_owned(), TypedArray::from(vec![1i64, 2]));

        let mixed = TypedArray::Object(vec![Value::Int(1), Value::from("a")]);
        assert_eq!(convert_platform(&mixed).into_owned(), mixed);

        let floats = TypedArray::from(vec![1.5f64]);
        assert!(matches!(convert_platform(&floats), Cow::Borrowed(_)));
    }
}
