//! The masked assignment upcaster: writes `other` into the masked positions of
//! an array, upcasting the array only when the write cannot be done in place.

use arrow_schema::TimeUnit;
use bitvec::prelude::*;
use std::borrow::Cow;

use crate::error::CastError;
use crate::log_metric;
use crate::null_handling::is_null;
use crate::types::{DType, Datum, TypedArray, Value};

use super::promote::{maybe_upcast, promote};
use super::CastContext;

/// The result of a masked assignment. `changed` is true when `values` is a new,
/// upcast buffer rather than the destination written in place.
#[derive(Debug, Clone, PartialEq)]
pub struct PutmaskOutcome {
    pub values: TypedArray,
    pub changed: bool,
}

/// Assigns `other` into `result` wherever `mask` is set.
///
/// The write happens in place when every replacement is exactly representable
/// in `result`'s dtype and no null has to land in a dtype without a null
/// sentinel. Otherwise `result` is promoted for `other` and the write happens in
/// the promoted copy. Array `other`s are aligned with `result` by position.
pub fn maybe_upcast_putmask(
    mut result: TypedArray,
    mask: &BitSlice<u8, Lsb0>,
    other: &Datum,
    ctx: &CastContext,
) -> Result<PutmaskOutcome, CastError> {
    if mask.len() != result.len() {
        return Err(CastError::LengthMismatch {
            expected: result.len(),
            got: mask.len(),
        });
    }
    if let Datum::Array(arr) = other {
        if arr.len() != result.len() {
            return Err(CastError::LengthMismatch {
                expected: result.len(),
                got: arr.len(),
            });
        }
    }
    if mask.not_any() {
        return Ok(PutmaskOutcome {
            values: result,
            changed: false,
        });
    }

    let dtype = result.dtype();
    let other = datelike_other(&dtype, other)?;

    let promoted = promote(&dtype, &other, ctx).dtype;
    if promoted != dtype && masked_needs_null(&other, mask) {
        return upcast(result, mask, &other, ctx);
    }

    match result.put_masked(mask, &other) {
        Ok(()) => Ok(PutmaskOutcome {
            values: result,
            changed: false,
        }),
        Err(e) => {
            log::debug!("direct masked write rejected: {}", e);
            if promoted == dtype {
                // The dtype already holds this kind of value; narrow it the way
                // an assignment into the buffer would.
                if let Some(narrowed) = narrowed_other(&dtype, &other) {
                    if result.put_masked(mask, &narrowed).is_ok() {
                        return Ok(PutmaskOutcome {
                            values: result,
                            changed: false,
                        });
                    }
                }
            }
            upcast(result, mask, &other, ctx)
        }
    }
}

/// `other` cast (with precision loss) to `dtype`, when it has a reading there.
fn narrowed_other(dtype: &DType, other: &Datum) -> Option<Datum> {
    match other {
        Datum::Scalar(v) => TypedArray::from_values_as(dtype, std::slice::from_ref(v), false)
            .ok()
            .map(|cast| Datum::Scalar(cast.get(0))),
        Datum::Array(arr) => arr.astype(dtype).ok().map(Datum::Array),
    }
}

/// Nulls become `NaT` and integers become nanosecond counts when the
/// destination holds datetimes or durations.
fn datelike_other<'a>(dtype: &DType, other: &'a Datum) -> Result<Cow<'a, Datum>, CastError> {
    if !dtype.is_datetimelike() {
        return Ok(Cow::Borrowed(other));
    }
    let raw = |value: i64| match dtype {
        DType::Duration => Value::Timedelta64 {
            value,
            unit: TimeUnit::Nanosecond,
        },
        _ => Value::DateTime64 {
            value,
            unit: TimeUnit::Nanosecond,
        },
    };
    Ok(match other {
        Datum::Scalar(v) if is_null(v) => Cow::Owned(Datum::Scalar(Value::NaT)),
        Datum::Scalar(v) if v.is_integer() => match v.as_i128().and_then(|i| i64::try_from(i).ok()) {
            Some(i) => Cow::Owned(Datum::Scalar(raw(i))),
            None => Cow::Borrowed(other),
        },
        Datum::Array(arr) if arr.dtype().is_integer() => {
            Cow::Owned(Datum::Array(arr.astype(dtype)?))
        }
        _ => Cow::Borrowed(other),
    })
}

/// True when the replacement for some masked position is null.
fn masked_needs_null(other: &Datum, mask: &BitSlice<u8, Lsb0>) -> bool {
    match other {
        Datum::Scalar(v) => is_null(v),
        Datum::Array(arr) => {
            let nulls = arr.null_mask();
            mask.iter_ones().any(|i| nulls[i])
        }
    }
}

/// The slow path: first retry an exact in-place write, then promote.
fn upcast(
    mut result: TypedArray,
    mask: &BitSlice<u8, Lsb0>,
    other: &Datum,
    ctx: &CastContext,
) -> Result<PutmaskOutcome, CastError> {
    if result.put_masked(mask, other).is_ok() {
        return Ok(PutmaskOutcome {
            values: result,
            changed: false,
        });
    }

    let (promoted, _) = maybe_upcast(&result, other, None, true, ctx)?;
    let mut promoted = promoted.into_owned();
    if let Err(e) = promoted.put_masked(mask, other) {
        // Values the promoted dtype still cannot hold exactly go to Object.
        log::debug!("promoted write rejected, falling back to object: {}", e);
        promoted = result.astype(&DType::Object)?;
        promoted.put_masked(mask, other)?;
    }
    log_metric!("event"="putmask_upcast", "from"=result.dtype(), "to"=promoted.dtype());
    Ok(PutmaskOutcome {
        values: promoted,
        changed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::null_handling::INAT;

    fn put(result: TypedArray, mask: &[bool], other: impl Into<Datum>) -> PutmaskOutcome {
        let mask: BitVec<u8, Lsb0> = mask.iter().copied().collect();
        maybe_upcast_putmask(result, &mask, &other.into(), &CastContext::default()).unwrap()
    }

    #[test]
    fn test_int_with_nan_upcasts_to_float() {
        let out = put(TypedArray::from(vec![1i64, 2, 3]), &[false, true, false], Value::Float(f64::NAN));
        assert!(out.changed);
        let TypedArray::Float64(v) = out.values else {
            panic!("expected float64");
        };
        assert_eq!(v[0], 1.0);
        assert!(v[1].is_nan());
        assert_eq!(v[2], 3.0);
    }

    #[test]
    fn test_int_with_fitting_int_writes_in_place() {
        let out = put(TypedArray::from(vec![1i64, 2, 3]), &[true, false, true], Value::Int(5));
        assert_eq!(
            out,
            PutmaskOutcome {
                values: TypedArray::from(vec![5i64, 2, 5]),
                changed: false
            }
        );
    }

    #[test]
    fn test_fractional_write_upcasts() {
        let out = put(TypedArray::from(vec![1i64, 2]), &[true, false], Value::Float(1.5));
        assert!(out.changed);
        assert_eq!(out.values, TypedArray::from(vec![1.5, 2.0]));
    }

    #[test]
    fn test_float32_narrows_fill_in_place() {
        let out = put(TypedArray::from(vec![1.0f32, 2.0]), &[true, false], Value::Float(0.1));
        assert_eq!(
            out,
            PutmaskOutcome {
                values: TypedArray::from(vec![0.1f32, 2.0]),
                changed: false
            }
        );

        let other = TypedArray::from(vec![0.1, 0.2]);
        let out = put(TypedArray::from(vec![1.0f32, 2.0]), &[false, true], other);
        assert!(!out.changed);
        assert_eq!(out.values, TypedArray::from(vec![1.0f32, 0.2]));
    }

    #[test]
    fn test_bool_with_float_goes_to_object() {
        let out = put(TypedArray::from(vec![true, false]), &[false, true], Value::Float(1.5));
        assert!(out.changed);
        assert_eq!(
            out.values,
            TypedArray::Object(vec![Value::Bool(true), Value::Float(1.5)])
        );
    }

    #[test]
    fn test_empty_mask_is_a_no_op() {
        let input = TypedArray::from(vec![1i64]);
        let out = put(input.clone(), &[false], Value::Float(f64::NAN));
        assert_eq!(out, PutmaskOutcome { values: input, changed: false });
    }

    #[test]
    fn test_array_other_without_nulls_in_mask() {
        let other = TypedArray::from(vec![f64::NAN, 7.0]);
        let out = put(TypedArray::from(vec![1i32, 2]), &[false, true], other);
        assert_eq!(
            out,
            PutmaskOutcome {
                values: TypedArray::from(vec![1i32, 7]),
                changed: false
            }
        );
    }

    #[test]
    fn test_array_other_with_nulls_in_mask() {
        let other = TypedArray::from(vec![f64::NAN, 7.0]);
        let out = put(TypedArray::from(vec![1i32, 2]), &[true, true], other);
        assert!(out.changed);
        assert_eq!(out.values.dtype(), DType::FLOAT64);
        assert!(out.values.get(0).is_null());
    }

    #[test]
    fn test_datetime_destination_conversions() {
        let dates = TypedArray::datetime(vec![10, 20], None);
        let out = put(dates.clone(), &[true, false], Value::None);
        assert_eq!(out.values, TypedArray::datetime(vec![INAT, 20], None));
        assert!(!out.changed);

        let out = put(dates, &[false, true], Value::Int(99));
        assert_eq!(out.values, TypedArray::datetime(vec![10, 99], None));
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let mask = bitvec![u8, Lsb0; 1];
        let err = maybe_upcast_putmask(
            TypedArray::from(vec![1i64, 2]),
            &mask,
            &Datum::Scalar(Value::Int(0)),
            &CastContext::default(),
        );
        assert!(matches!(err, Err(CastError::LengthMismatch { .. })));
    }
}
