//! Datetime-like casting: explicit casts to datetime/duration dtypes, inference of
//! datetime-likes hidden in object arrays, and timezone localization.

use chrono::FixedOffset;

use crate::error::CastError;
use crate::inference::{infer_kind, is_possible_datetimelike, InferredKind};
use crate::log_metric;
use crate::null_handling::{is_null, INAT};
use crate::parsing::{fixed_offset, to_datetime, to_timedelta, ConversionMode};
use crate::types::value::nanos_to_naive;
use crate::types::{DType, Datum, TypedArray, Value};
use crate::utils::best_effort;

use super::CastContext;

/// Casts `value` towards a datetime-like `dtype`, or infers one when `dtype` is
/// `None`.
///
/// Scalars only have their nulls normalized to `iNaT`. Arrays are parsed under
/// `mode`; a parse failure leaves the array unchanged. A naive datetime array can
/// otherwise only be cast to Object.
pub fn cast_to_datetimelike(
    value: Datum,
    dtype: Option<&DType>,
    mode: ConversionMode,
    ctx: &CastContext,
) -> Result<Datum, CastError> {
    let Some(dtype) = dtype else {
        return Ok(match value {
            Datum::Array(arr) if arr.dtype().is_object() => {
                Datum::Array(infer_to_datetimelike(&arr, false, ctx))
            }
            other => other,
        });
    };

    if dtype.is_datetimelike() {
        return Ok(match value {
            Datum::Scalar(v) if is_null(&v) => Datum::Scalar(Value::Int(INAT)),
            Datum::Scalar(v) => Datum::Scalar(v),
            Datum::Array(arr) => {
                let cast = best_effort("cast_to_datetimelike", parse_as(&arr, dtype, mode, ctx));
                Datum::Array(cast.unwrap_or(arr))
            }
        });
    }

    match value {
        Datum::Array(TypedArray::DateTime { values, tz: None }) => {
            if dtype.is_object() {
                Ok(Datum::Array(TypedArray::Object(datetime_objects(&values))))
            } else {
                Err(CastError::InvalidCast {
                    from: DType::DATETIME_NS,
                    to: dtype.clone(),
                })
            }
        }
        other => Ok(other),
    }
}

fn parse_as(
    arr: &TypedArray,
    dtype: &DType,
    mode: ConversionMode,
    ctx: &CastContext,
) -> Result<TypedArray, CastError> {
    if arr.is_empty() && arr.dtype() == *dtype {
        return Ok(arr.clone());
    }
    let parsers = ctx.parsers.as_ref();
    match (dtype, arr) {
        (DType::Duration, _) => to_timedelta(arr, mode, parsers),
        (DType::DateTime { tz: Some(tz) }, TypedArray::DateTime { values, tz: Some(_) }) => {
            Ok(TypedArray::datetime(values.clone(), Some(tz.clone())))
        }
        (DType::DateTime { tz: Some(tz) }, _) => {
            let naive = to_datetime(arr, mode, parsers)?;
            // Ignore mode may hand back the unparsed input.
            if naive.dtype().is_datetime() {
                localize(&naive, tz)
            } else {
                Ok(naive)
            }
        }
        _ => to_datetime(arr, mode, parsers),
    }
}

/// Naive datetime objects for a nanosecond buffer; `iNaT` becomes `NaT`.
pub(crate) fn datetime_objects(values: &[i64]) -> Vec<Value> {
    values
        .iter()
        .map(|&ns| nanos_to_naive(ns).map_or(Value::NaT, Value::DateTime))
        .collect()
}

//==================================================================================
// Inference
//==================================================================================

/// Converts an array to a datetime or duration dtype when its leading elements
/// say it holds datetime-likes. Strings alone never trigger a conversion. The
/// array is returned unchanged whenever the conversion does not succeed.
pub fn infer_to_datetimelike(
    values: &TypedArray,
    convert_dates: bool,
    ctx: &CastContext,
) -> TypedArray {
    if values.is_empty() || values.dtype().is_datetimelike() {
        return values.clone();
    }
    let objects = values.to_values();
    let sample = &objects[..objects.len().min(ctx.config.inference_sample_size)];
    let kind = infer_kind(sample);

    let result = match kind {
        InferredKind::DateTime | InferredKind::DateTime64 => try_datetime(values, &objects, ctx),
        InferredKind::Date if convert_dates => try_datetime(values, &objects, ctx),
        InferredKind::Timedelta | InferredKind::Timedelta64 => try_timedelta(values, ctx),
        // Timedelta first: "00:00:01" reads as both.
        InferredKind::Mixed if is_possible_datetimelike(&objects) => {
            let td = try_timedelta(values, ctx);
            if infer_kind(&td.to_values()) == InferredKind::Mixed {
                try_datetime(values, &objects, ctx)
            } else {
                td
            }
        }
        _ => values.clone(),
    };
    log_metric!(
        "event"="infer_to_datetimelike",
        "sample_kind"=kind.as_str(),
        "outcome"=result.dtype()
    );
    result
}

fn try_datetime(values: &TypedArray, objects: &[Value], ctx: &CastContext) -> TypedArray {
    let parsed = to_datetime(values, ConversionMode::Raise, ctx.parsers.as_ref());
    match (best_effort("infer_datetime", parsed), single_offset(objects)) {
        (Some(TypedArray::DateTime { values, .. }), Some(offset)) => {
            TypedArray::datetime(values, Some(offset.to_string()))
        }
        (Some(arr), _) => arr,
        (None, _) => values.clone(),
    }
}

/// The shared offset when every non-null element is a tz-aware datetime in the
/// same zone.
fn single_offset(objects: &[Value]) -> Option<FixedOffset> {
    let mut offsets = objects.iter().filter(|v| !is_null(v)).map(|v| match v {
        Value::DateTimeTz(dt) => Some(*dt.offset()),
        _ => None,
    });
    let first = offsets.next()??;
    offsets.all(|o| o == Some(first)).then_some(first)
}

fn try_timedelta(values: &TypedArray, ctx: &CastContext) -> TypedArray {
    let parsed = to_timedelta(values, ConversionMode::Raise, ctx.parsers.as_ref());
    best_effort("infer_timedelta", parsed).unwrap_or_else(|| values.clone())
}

//==================================================================================
// Localization
//==================================================================================

/// Reads a naive datetime array as wall-clock time in `tz` and returns the
/// matching tz-aware array (stored as UTC nanoseconds).
pub fn localize(values: &TypedArray, tz: &str) -> Result<TypedArray, CastError> {
    let TypedArray::DateTime { values, tz: None } = values else {
        return Err(CastError::InvalidCast {
            from: values.dtype(),
            to: DType::datetime_tz(tz),
        });
    };
    let offset_ns = i64::from(fixed_offset(tz)?.local_minus_utc()) * 1_000_000_000;
    let utc = values
        .iter()
        .map(|&ns| {
            if ns == INAT {
                return Ok(INAT);
            }
            ns.checked_sub(offset_ns)
                .filter(|utc| *utc != INAT)
                .ok_or_else(|| CastError::OutOfBoundsDatetime(ns.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TypedArray::datetime(utc, Some(tz.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta, TimeZone};

    const DAY_NS: i64 = 86_400_000_000_000;

    fn dt(day: u32) -> Value {
        Value::DateTime(
            NaiveDate::from_ymd_opt(1970, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    fn strs(items: &[&str]) -> TypedArray {
        TypedArray::Object(items.iter().map(|s| Value::from(*s)).collect())
    }

    #[test]
    fn test_scalar_nulls_become_inat() {
        let ctx = CastContext::default();
        let got = cast_to_datetimelike(
            Datum::Scalar(Value::None),
            Some(&DType::DATETIME_NS),
            ConversionMode::Raise,
            &ctx,
        )
        .unwrap();
        assert_eq!(got, Datum::Scalar(Value::Int(INAT)));
    }

    #[test]
    fn test_array_parse_failure_keeps_input() {
        let ctx = CastContext::default();
        let input = strs(&["1970-01-02", "nope"]);
        let got = cast_to_datetimelike(
            Datum::Array(input.clone()),
            Some(&DType::DATETIME_NS),
            ConversionMode::Raise,
            &ctx,
        )
        .unwrap();
        assert_eq!(got, Datum::Array(input.clone()));

        let got = cast_to_datetimelike(
            Datum::Array(input),
            Some(&DType::DATETIME_NS),
            ConversionMode::Coerce,
            &ctx,
        )
        .unwrap();
        assert_eq!(got, Datum::Array(TypedArray::datetime(vec![DAY_NS, INAT], None)));
    }

    #[test]
    fn test_tz_target_localizes() {
        let ctx = CastContext::default();
        let got = cast_to_datetimelike(
            Datum::Array(strs(&["1970-01-02 01:00:00"])),
            Some(&DType::datetime_tz("+01:00")),
            ConversionMode::Raise,
            &ctx,
        )
        .unwrap();
        assert_eq!(
            got,
            Datum::Array(TypedArray::datetime(vec![DAY_NS], Some("+01:00".into())))
        );
    }

    #[test]
    fn test_datetime_array_to_object_or_error() {
        let ctx = CastContext::default();
        let arr = TypedArray::datetime(vec![DAY_NS, INAT], None);
        let got = cast_to_datetimelike(
            Datum::Array(arr.clone()),
            Some(&DType::Object),
            ConversionMode::Raise,
            &ctx,
        )
        .unwrap();
        assert_eq!(got, Datum::Array(TypedArray::Object(vec![dt(2), Value::NaT])));

        let err = cast_to_datetimelike(
            Datum::Array(arr),
            Some(&DType::FLOAT64),
            ConversionMode::Raise,
            &ctx,
        );
        assert!(matches!(err, Err(CastError::InvalidCast { .. })));
    }

    #[test]
    fn test_infer_datetimes_and_timedeltas() {
        let ctx = CastContext::default();
        let dates = TypedArray::Object(vec![dt(1), Value::None, dt(2)]);
        assert_eq!(
            infer_to_datetimelike(&dates, false, &ctx),
            TypedArray::datetime(vec![0, INAT, DAY_NS], None)
        );

        let deltas = TypedArray::Object(vec![Value::Duration(TimeDelta::days(1)), Value::NaT]);
        assert_eq!(
            infer_to_datetimelike(&deltas, false, &ctx),
            TypedArray::Duration(vec![DAY_NS, INAT])
        );
    }

    #[test]
    fn test_strings_alone_are_never_datetimelike() {
        let ctx = CastContext::default();
        let input = strs(&["2020-01-01", "2020-01-02"]);
        assert_eq!(infer_to_datetimelike(&input, true, &ctx), input);
    }

    #[test]
    fn test_dates_need_convert_dates() {
        let ctx = CastContext::default();
        let d = Value::Date(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap());
        let input = TypedArray::Object(vec![d]);
        assert_eq!(infer_to_datetimelike(&input, false, &ctx), input);
        assert_eq!(
            infer_to_datetimelike(&input, true, &ctx),
            TypedArray::datetime(vec![DAY_NS], None)
        );
    }

    #[test]
    fn test_mixed_prefers_timedelta() {
        let ctx = CastContext::default();
        let input = TypedArray::Object(vec![
            Value::from("00:00:01"),
            Value::Duration(TimeDelta::seconds(2)),
        ]);
        assert_eq!(
            infer_to_datetimelike(&input, false, &ctx),
            TypedArray::Duration(vec![1_000_000_000, 2_000_000_000])
        );
    }

    #[test]
    fn test_same_offset_values_stay_tz_aware() {
        let ctx = CastContext::default();
        let offset = FixedOffset::east_opt(3600).unwrap();
        let aware = offset.with_ymd_and_hms(1970, 1, 2, 1, 0, 0).unwrap();
        let input = TypedArray::Object(vec![Value::DateTimeTz(aware), Value::NaT]);
        assert_eq!(
            infer_to_datetimelike(&input, false, &ctx),
            TypedArray::datetime(vec![DAY_NS, INAT], Some("+01:00".into()))
        );
    }

    #[test]
    fn test_localize() {
        let naive = TypedArray::datetime(vec![DAY_NS, INAT], None);
        assert_eq!(
            localize(&naive, "-01:00").unwrap(),
            TypedArray::datetime(vec![DAY_NS + 3_600_000_000_000, INAT], Some("-01:00".into()))
        );
        assert!(localize(&TypedArray::from(vec![1i64]), "UTC").is_err());
        assert!(matches!(
            localize(&naive, "Mars/Olympus"),
            Err(CastError::UnknownTimezone(_))
        ));
    }
}
