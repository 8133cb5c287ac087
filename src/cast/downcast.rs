//! The safe downcaster: narrows a computed result back to a smaller dtype, but
//! only when the narrowing is numerically safe. It never fails; every rejected
//! attempt returns the input untouched.

use crate::error::CastError;
use crate::inference::{infer_kind, InferredKind};
use crate::log_metric;
use crate::null_handling::is_null;
use crate::parsing::{to_datetime, ConversionMode};
use crate::types::{DType, Datum, TypedArray, Value};
use crate::utils::{allclose, best_effort};

use super::datetimelike::localize;
use super::CastContext;

/// The dtype a downcast aims for.
#[derive(Debug, Clone, PartialEq)]
pub enum DowncastTarget {
    /// Pick the target from the inferred kind of the values.
    Infer,
    DType(DType),
}

impl From<DType> for DowncastTarget {
    fn from(dtype: DType) -> Self {
        DowncastTarget::DType(dtype)
    }
}

/// Narrows `result` to `target` when that loses nothing. Scalars pass through.
pub fn downcast(result: Datum, target: &DowncastTarget, ctx: &CastContext) -> Datum {
    match result {
        Datum::Array(arr) => Datum::Array(downcast_array(arr, target, ctx)),
        scalar => scalar,
    }
}

/// The array form of `downcast`.
pub fn downcast_array(arr: TypedArray, target: &DowncastTarget, ctx: &CastContext) -> TypedArray {
    let from = arr.dtype();
    let (dtype, round) = match target {
        DowncastTarget::DType(dtype) => (dtype.clone(), false),
        DowncastTarget::Infer => infer_target(&arr),
    };
    match try_downcast(&arr, &dtype, round, ctx) {
        Some(narrowed) => {
            log_metric!("event"="downcast", "from"=from, "to"=narrowed.dtype(), "outcome"="cast");
            narrowed
        }
        None => {
            log_metric!("event"="downcast", "from"=from, "to"=dtype, "outcome"="kept");
            arr
        }
    }
}

/// The dtype `Infer` aims for, and whether floats are rounded on the way.
fn infer_target(arr: &TypedArray) -> (DType, bool) {
    match infer_kind(&arr.to_values()) {
        InferredKind::Boolean => (DType::Bool, false),
        InferredKind::Integer => (DType::INT64, false),
        InferredKind::DateTime | InferredKind::DateTime64 => (DType::DATETIME_NS, false),
        InferredKind::Timedelta | InferredKind::Timedelta64 => (DType::Duration, false),
        InferredKind::Floating => (DType::INT64, arr.dtype().is_number()),
        _ => (DType::Object, false),
    }
}

/// Rounds half to even when `round` is set; non-float arrays are left alone.
fn rounded(arr: &TypedArray, round: bool) -> Option<TypedArray> {
    if !round {
        return Some(arr.clone());
    }
    arr.as_f64_vec()
        .map(|v| TypedArray::Float64(v.into_iter().map(f64::round_ties_even).collect()))
}

fn cast(arr: &TypedArray, dtype: &DType, round: bool) -> Result<TypedArray, CastError> {
    let source = rounded(arr, round).ok_or_else(|| CastError::InvalidCast {
        from: arr.dtype(),
        to: dtype.clone(),
    })?;
    source.astype(dtype)
}

/// `None` means "keep the input".
fn try_downcast(
    arr: &TypedArray,
    dtype: &DType,
    round: bool,
    ctx: &CastContext,
) -> Option<TypedArray> {
    let from = arr.dtype();

    // No upcasts, except of an empty array.
    if dtype.kind() == from.kind() && from.itemsize() <= dtype.itemsize() && !arr.is_empty() {
        return None;
    }

    if dtype.is_float() {
        return best_effort("downcast_to_float", arr.astype(dtype));
    }

    if dtype.is_bool() || dtype.is_integer() {
        if arr.is_empty() {
            return best_effort("downcast_empty", cast(arr, dtype, round));
        }
        if !first_element_survives(&arr.get(0), dtype, round, ctx) {
            return None;
        }
        if !(from.is_object() || from.is_number()) || arr.has_nulls() {
            return None;
        }
        let narrowed = best_effort("downcast_to_int", cast(arr, dtype, round))?;
        let matches = match (narrowed.as_f64_vec(), arr.as_f64_vec()) {
            (Some(new), Some(old)) => allclose(&new, &old, ctx.config.rtol, ctx.config.atol),
            _ => narrowed.to_values() == arr.to_values(),
        };
        return matches.then_some(narrowed);
    }

    if dtype.is_datetimelike() && (from.is_integer() || from.is_float()) {
        let Some(tz) = dtype.tz() else {
            return best_effort("downcast_to_datetime", arr.astype(dtype));
        };
        // Numbers are wall-clock counts in `tz`, not UTC instants.
        let naive = arr.astype(&DType::DATETIME_NS).or_else(|e| {
            log::debug!("direct datetime downcast failed, parsing instead: {}", e);
            to_datetime(arr, ConversionMode::Raise, ctx.parsers.as_ref())
        });
        return best_effort(
            "downcast_to_datetime_tz",
            naive.and_then(|naive| localize(&naive, tz)),
        );
    }

    None
}

/// The first element must be a non-null plain number that survives the cast.
fn first_element_survives(first: &Value, dtype: &DType, round: bool, ctx: &CastContext) -> bool {
    if is_null(first) || !first.is_real_number() {
        return false;
    }
    let Some(original) = first.as_f64() else {
        return false;
    };
    let head = TypedArray::Float64(vec![original]);
    let back = cast(&head, dtype, round)
        .ok()
        .and_then(|cast| cast.as_f64_vec());
    match back {
        Some(back) => allclose(&[original], &back, ctx.config.rtol, ctx.config.atol),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::null_handling::INAT;

    fn run(arr: TypedArray, target: impl Into<DowncastTarget>) -> TypedArray {
        downcast_array(arr, &target.into(), &CastContext::default())
    }

    #[test]
    fn test_float_to_int_recovery() {
        let got = run(TypedArray::from(vec![1.0, 2.0, 3.0]), DType::INT64);
        assert_eq!(got, TypedArray::from(vec![1i64, 2, 3]));
    }

    #[test]
    fn test_fractional_values_are_kept() {
        let input = TypedArray::from(vec![1.0, 2.5]);
        assert_eq!(run(input.clone(), DType::INT64), input);
        let first_bad = TypedArray::from(vec![1.5, 2.0]);
        assert_eq!(run(first_bad.clone(), DType::INT64), first_bad);
    }

    #[test]
    fn test_nulls_abort_integer_downcast() {
        let first_null = run(TypedArray::from(vec![f64::NAN, 1.0]), DType::INT64);
        assert_eq!(first_null.dtype(), DType::FLOAT64);
        assert!(first_null.get(0).is_null());
        assert_eq!(first_null.get(1).as_f64(), Some(1.0));

        let later_null = run(TypedArray::from(vec![1.0, f64::NAN]), DType::INT32);
        assert_eq!(later_null.dtype(), DType::FLOAT64);
        assert_eq!(later_null.get(0).as_f64(), Some(1.0));
        assert!(later_null.get(1).is_null());
    }

    #[test]
    fn test_no_upcast_within_a_kind() {
        let input = TypedArray::from(vec![1i8, 2]);
        assert_eq!(run(input.clone(), DType::INT64), input);
        let empty = TypedArray::Int8(vec![]);
        assert_eq!(run(empty, DType::INT64), TypedArray::Int64(vec![]));
    }

    #[test]
    fn test_float_targets_cast_directly() {
        let got = run(TypedArray::from(vec![1.5f64]), DType::FLOAT32);
        assert_eq!(got, TypedArray::from(vec![1.5f32]));
    }

    #[test]
    fn test_infer_rounds_floats() {
        let got = run(TypedArray::from(vec![1.0, 2.0]), DowncastTarget::Infer);
        assert_eq!(got, TypedArray::from(vec![1i64, 2]));
        let input = TypedArray::from(vec![1.0, 2.5]);
        assert_eq!(run(input.clone(), DowncastTarget::Infer), input);
    }

    #[test]
    fn test_infer_object_arrays() {
        let bools = TypedArray::Object(vec![Value::Bool(true), Value::Bool(false)]);
        assert_eq!(run(bools, DowncastTarget::Infer), TypedArray::from(vec![true, false]));
        let ints = TypedArray::Object(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(run(ints, DowncastTarget::Infer), TypedArray::from(vec![1i64, 2]));
        let text = TypedArray::Object(vec![Value::from("a")]);
        assert_eq!(run(text.clone(), DowncastTarget::Infer), text);
    }

    #[test]
    fn test_downcast_is_idempotent() {
        let once = run(TypedArray::from(vec![1.0, 2.0, 3.0]), DType::INT64);
        assert_eq!(run(once.clone(), DType::INT64), once);
    }

    #[test]
    fn test_numbers_to_datetime() {
        let got = run(TypedArray::from(vec![5.0, f64::NAN]), DType::DATETIME_NS);
        assert_eq!(got, TypedArray::datetime(vec![5, INAT], None));
    }

    #[test]
    fn test_numbers_to_tz_aware_datetime_are_wall_clock() {
        let got = run(TypedArray::from(vec![0i64]), DType::datetime_tz("+01:00"));
        assert_eq!(
            got,
            TypedArray::datetime(vec![-3_600_000_000_000], Some("+01:00".to_string()))
        );

        let got = run(TypedArray::from(vec![f64::NAN]), DType::datetime_tz("UTC"));
        assert_eq!(got, TypedArray::datetime(vec![INAT], Some("UTC".to_string())));
    }

    #[test]
    fn test_scalars_pass_through() {
        let ctx = CastContext::default();
        let got = downcast(Datum::Scalar(Value::Float(1.0)), &DType::INT64.into(), &ctx);
        assert_eq!(got, Datum::Scalar(Value::Float(1.0)));
    }
}
