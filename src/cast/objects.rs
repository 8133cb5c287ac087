//! The object-array classifier: detects when an Object array really holds
//! booleans, numbers, datetimes or durations, and rebuilds it with that dtype.
//!
//! Classification is best-effort throughout. A stage that fails, or that would
//! turn every element into a null, leaves the array as it was.

use std::borrow::Cow;

use crate::error::CastError;
use crate::log_metric;
use crate::parsing::{to_datetime, to_numeric, to_timedelta, ConversionMode};
use crate::types::{DType, TypedArray, Value};
use crate::utils::best_effort;

use super::CastContext;

/// The tri-state of a date or timedelta conversion switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvertFlag {
    Off,
    /// Convert only when every element already is of the target kind.
    #[default]
    Soft,
    /// Parse every element, turning failures into `NaT`.
    Coerce,
}

/// Switches for `maybe_convert_objects`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaybeConvertOptions {
    pub convert_datetime: bool,
    pub convert_timedelta: bool,
}

/// Options for `convert_objects`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertObjectsOptions {
    pub convert_dates: ConvertFlag,
    pub convert_numeric: bool,
    pub convert_timedeltas: ConvertFlag,
    pub copy: bool,
}

impl Default for ConvertObjectsOptions {
    fn default() -> Self {
        Self {
            convert_dates: ConvertFlag::Soft,
            convert_numeric: true,
            convert_timedeltas: ConvertFlag::Soft,
            copy: true,
        }
    }
}

/// Options for `soft_convert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftConvertOptions {
    pub datetime: bool,
    pub numeric: bool,
    pub timedelta: bool,
    pub coerce: bool,
    pub copy: bool,
}

impl Default for SoftConvertOptions {
    fn default() -> Self {
        Self {
            datetime: true,
            numeric: true,
            timedelta: true,
            coerce: false,
            copy: true,
        }
    }
}

//==================================================================================
// 1. The Soft Classification Scan
//==================================================================================

/// What a single pass over the values has seen.
#[derive(Debug, Default)]
struct Seen {
    null: bool,
    nat: bool,
    bool_: bool,
    int: bool,
    negative: bool,
    uint64: bool,
    float: bool,
    complex: bool,
    datetime: bool,
    timedelta: bool,
    object: bool,
}

impl Seen {
    fn scan(values: &[Value], opts: MaybeConvertOptions) -> Self {
        let mut seen = Seen::default();
        for v in values {
            match v {
                Value::None => seen.null = true,
                Value::NaT => seen.nat = true,
                Value::Bool(_) => seen.bool_ = true,
                v if v.is_integer() => {
                    seen.int = true;
                    match v.as_i128() {
                        Some(i) if i < 0 => seen.negative = true,
                        Some(i) if i > i128::from(i64::MAX) => seen.uint64 = true,
                        _ => {}
                    }
                }
                v if v.is_float() => seen.float = true,
                Value::Complex(_) => seen.complex = true,
                Value::DateTime(_) | Value::DateTime64 { .. } if opts.convert_datetime => {
                    seen.datetime = true
                }
                Value::Duration(_) | Value::Timedelta64 { .. } if opts.convert_timedelta => {
                    seen.timedelta = true
                }
                _ => seen.object = true,
            }
            if seen.object {
                break;
            }
        }
        seen
    }

    fn numeric(&self) -> bool {
        self.int || self.float || self.complex
    }

    /// The dtype the scanned values unify into, if any.
    fn target(&self, opts: MaybeConvertOptions) -> Option<DType> {
        if self.object {
            return None;
        }
        if self.datetime || self.timedelta || self.nat {
            if self.bool_ || self.numeric() || (self.datetime && self.timedelta) {
                return None;
            }
            // NaT alone follows whichever temporal switch is on.
            if self.datetime || (!self.timedelta && opts.convert_datetime) {
                return Some(DType::DATETIME_NS);
            }
            if self.timedelta || opts.convert_timedelta {
                return Some(DType::Duration);
            }
            return None;
        }
        if self.bool_ {
            return (!self.numeric() && !self.null).then_some(DType::Bool);
        }
        if self.complex {
            return Some(DType::COMPLEX128);
        }
        if self.float || (self.int && self.null) {
            return Some(DType::FLOAT64);
        }
        if self.int {
            return match (self.negative, self.uint64) {
                (true, true) => None,
                (false, true) => Some(DType::UINT64),
                _ => Some(DType::INT64),
            };
        }
        None
    }
}

/// Rebuilds an object sequence with the narrowest dtype all its elements share:
/// booleans, integers (`UInt64` past `i64::MAX`), floats (also for integers mixed
/// with nulls), complex, and, when enabled, datetimes or durations mixed with
/// nulls. Anything else stays Object.
pub fn maybe_convert_objects(values: &[Value], opts: MaybeConvertOptions) -> TypedArray {
    let target = Seen::scan(values, opts).target(opts);
    let converted = target.and_then(|dtype| {
        best_effort(
            "maybe_convert_objects",
            TypedArray::from_values_as(&dtype, values, false),
        )
    });
    match converted {
        Some(arr) => {
            log_metric!("event"="maybe_convert_objects", "outcome"=arr.dtype(), "len"=values.len());
            arr
        }
        None => TypedArray::Object(values.to_vec()),
    }
}

//==================================================================================
// 2. Staged Conversions
//==================================================================================

/// Replaces `current` with `candidate` unless every element of the candidate is
/// null (which includes the empty case).
fn keep_unless_all_null<'a>(current: Cow<'a, TypedArray>, candidate: Option<TypedArray>) -> Cow<'a, TypedArray> {
    match candidate {
        Some(arr) if !arr.all_null() => Cow::Owned(arr),
        _ => current,
    }
}

/// Replaces `current` with a soft classification when it found a non-Object dtype.
fn soft_stage<'a>(current: Cow<'a, TypedArray>, opts: MaybeConvertOptions) -> Cow<'a, TypedArray> {
    let converted = maybe_convert_objects(&current.to_values(), opts);
    if converted.dtype().is_object() {
        current
    } else {
        Cow::Owned(converted)
    }
}

fn is_object(values: &TypedArray) -> bool {
    values.dtype().is_object()
}

/// Converts an Object array stage by stage: dates, then timedeltas, then numbers.
/// Each stage runs only while the array is still Object.
pub fn convert_objects<'a>(
    values: &'a TypedArray,
    opts: ConvertObjectsOptions,
    ctx: &CastContext,
) -> Cow<'a, TypedArray> {
    let parsers = ctx.parsers.as_ref();
    let mut current = Cow::Borrowed(values);

    if is_object(&current) {
        current = match opts.convert_dates {
            ConvertFlag::Off => current,
            ConvertFlag::Coerce => {
                let parsed = best_effort(
                    "convert_dates",
                    to_datetime(&current, ConversionMode::Coerce, parsers),
                );
                keep_unless_all_null(current, parsed)
            }
            ConvertFlag::Soft => soft_stage(
                current,
                MaybeConvertOptions {
                    convert_datetime: true,
                    ..Default::default()
                },
            ),
        };
    }

    if is_object(&current) {
        current = match opts.convert_timedeltas {
            ConvertFlag::Off => current,
            ConvertFlag::Coerce => {
                let parsed = best_effort(
                    "convert_timedeltas",
                    to_timedelta(&current, ConversionMode::Coerce, parsers),
                );
                keep_unless_all_null(current, parsed)
            }
            ConvertFlag::Soft => soft_stage(
                current,
                MaybeConvertOptions {
                    convert_timedelta: true,
                    ..Default::default()
                },
            ),
        };
    }

    if is_object(&current) {
        current = if opts.convert_numeric {
            let parsed = best_effort(
                "convert_numeric",
                to_numeric(&current, ConversionMode::Coerce, parsers),
            );
            keep_unless_all_null(current, parsed)
        } else {
            soft_stage(current, MaybeConvertOptions::default())
        };
    }

    if opts.copy {
        current = Cow::Owned(current.into_owned());
    }
    current
}

/// Soft conversion with explicit switches. With `coerce`, exactly one switch may
/// be on and the matching parser is applied to every element; otherwise each
/// enabled stage runs while the array is still Object and keeps the original on
/// failure. Non-Object input is returned as-is.
pub fn soft_convert<'a>(
    values: &'a TypedArray,
    opts: SoftConvertOptions,
    ctx: &CastContext,
) -> Result<Cow<'a, TypedArray>, CastError> {
    let enabled = [opts.datetime, opts.numeric, opts.timedelta]
        .iter()
        .filter(|flag| **flag)
        .count();
    if enabled == 0 {
        return Err(CastError::InvalidConversionFlags(
            "at least one of datetime, numeric or timedelta must be true".to_string(),
        ));
    }
    if enabled > 1 && opts.coerce {
        return Err(CastError::InvalidConversionFlags(
            "only one of datetime, numeric or timedelta can be true when coerce is true"
                .to_string(),
        ));
    }

    let copied = |arr: Cow<'a, TypedArray>| {
        if opts.copy {
            Cow::Owned(arr.into_owned())
        } else {
            arr
        }
    };

    if !is_object(values) {
        return Ok(copied(Cow::Borrowed(values)));
    }

    let parsers = ctx.parsers.as_ref();
    if opts.coerce {
        let coerced = if opts.datetime {
            to_datetime(values, ConversionMode::Coerce, parsers)?
        } else if opts.timedelta {
            to_timedelta(values, ConversionMode::Coerce, parsers)?
        } else {
            to_numeric(values, ConversionMode::Coerce, parsers)?
        };
        return Ok(Cow::Owned(coerced));
    }

    let mut current = Cow::Borrowed(values);
    if opts.datetime {
        current = soft_stage(
            current,
            MaybeConvertOptions {
                convert_datetime: true,
                ..Default::default()
            },
        );
    }
    if opts.timedelta && is_object(&current) {
        current = soft_stage(
            current,
            MaybeConvertOptions {
                convert_timedelta: true,
                ..Default::default()
            },
        );
    }
    if opts.numeric && is_object(&current) {
        let parsed = best_effort(
            "soft_convert_numeric",
            to_numeric(&current, ConversionMode::Coerce, parsers),
        );
        current = keep_unless_all_null(current, parsed);
    }
    Ok(copied(current))
}

#[cfg(test)]
#[path = "objects_tests.rs"]
mod objects_tests;
