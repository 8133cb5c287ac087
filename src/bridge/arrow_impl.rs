// In: src/bridge/arrow_impl.rs

//! Conversions between Arrow arrays and the engine's `TypedArray`.
//!
//! Arrow columns carry missing entries in a validity bitmap; `TypedArray` carries them
//! in band. Importing a column with nulls therefore asks the promotion rules what
//! dtype can hold a missing value (integers become `float64`, booleans `object`), and
//! exporting turns sentinels back into validity bits.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, DurationNanosecondArray, LargeStringArray, PrimitiveArray,
    StringArray, TimestampNanosecondArray,
};
use arrow::datatypes::*;

use crate::cast::{promote, CastContext};
use crate::error::CastError;
use crate::null_handling::bitmap::{mask_from_null_buffer, null_buffer_from_mask};
use crate::null_handling::{Mask, INAT};
use crate::types::value::unit_to_nanos;
use crate::types::{DType, Datum, TypedArray, Value};

//==================================================================================
// 1. Arrow -> TypedArray
//==================================================================================

/// Converts an Arrow column into a `TypedArray`.
///
/// Timestamps and durations of any unit are rescaled to nanoseconds. Utf8 columns
/// become `object` arrays so that nulls survive as `None`.
pub fn typed_array_from_arrow(
    array: &dyn Array,
    ctx: &CastContext,
) -> Result<TypedArray, CastError> {
    let mask = mask_from_null_buffer(array.nulls(), array.len());

    macro_rules! primitive {
        ($T:ty, $variant:ident) => {{
            let arr = downcast::<PrimitiveArray<$T>>(array)?;
            let native = TypedArray::$variant(arr.values().to_vec());
            with_nulls(native, &mask, ctx)?
        }};
    }

    macro_rules! rescaled {
        ($T:ty, $unit:expr) => {{
            let arr = downcast::<PrimitiveArray<$T>>(array)?;
            arr.iter()
                .map(|v| match v {
                    None => Ok(INAT),
                    Some(raw) => unit_to_nanos(raw, $unit)
                        .ok_or_else(|| CastError::OutOfBoundsDatetime(format!("{} {:?}", raw, $unit))),
                })
                .collect::<Result<Vec<i64>, CastError>>()?
        }};
    }

    let typed = match array.data_type() {
        DataType::Boolean => {
            let arr = downcast::<BooleanArray>(array)?;
            let native = TypedArray::Bool(arr.values().iter().collect());
            with_nulls(native, &mask, ctx)?
        }
        DataType::Int8 => primitive!(Int8Type, Int8),
        DataType::Int16 => primitive!(Int16Type, Int16),
        DataType::Int32 => primitive!(Int32Type, Int32),
        DataType::Int64 => primitive!(Int64Type, Int64),
        DataType::UInt8 => primitive!(UInt8Type, UInt8),
        DataType::UInt16 => primitive!(UInt16Type, UInt16),
        DataType::UInt32 => primitive!(UInt32Type, UInt32),
        DataType::UInt64 => primitive!(UInt64Type, UInt64),
        DataType::Float32 => primitive!(Float32Type, Float32),
        DataType::Float64 => primitive!(Float64Type, Float64),

        DataType::Timestamp(unit, tz) => {
            let values = match unit {
                TimeUnit::Second => rescaled!(TimestampSecondType, TimeUnit::Second),
                TimeUnit::Millisecond => rescaled!(TimestampMillisecondType, TimeUnit::Millisecond),
                TimeUnit::Microsecond => rescaled!(TimestampMicrosecondType, TimeUnit::Microsecond),
                TimeUnit::Nanosecond => rescaled!(TimestampNanosecondType, TimeUnit::Nanosecond),
            };
            TypedArray::datetime(values, tz.as_ref().map(|tz| tz.to_string()))
        }
        DataType::Duration(unit) => TypedArray::Duration(match unit {
            TimeUnit::Second => rescaled!(DurationSecondType, TimeUnit::Second),
            TimeUnit::Millisecond => rescaled!(DurationMillisecondType, TimeUnit::Millisecond),
            TimeUnit::Microsecond => rescaled!(DurationMicrosecondType, TimeUnit::Microsecond),
            TimeUnit::Nanosecond => rescaled!(DurationNanosecondType, TimeUnit::Nanosecond),
        }),

        DataType::Utf8 => {
            let arr = downcast::<StringArray>(array)?;
            TypedArray::Object(arr.iter().map(string_value).collect())
        }
        DataType::LargeUtf8 => {
            let arr = downcast::<LargeStringArray>(array)?;
            TypedArray::Object(arr.iter().map(string_value).collect())
        }
        DataType::Null => TypedArray::Object(vec![Value::None; array.len()]),

        dt => return Err(unsupported(dt)),
    };

    log::debug!(
        "imported {} rows of {} as {}",
        array.len(),
        array.data_type(),
        typed.dtype()
    );
    Ok(typed)
}

fn downcast<T: 'static>(array: &dyn Array) -> Result<&T, CastError> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        CastError::InternalError(format!(
            "array does not match its data type {}",
            array.data_type()
        ))
    })
}

fn string_value(s: Option<&str>) -> Value {
    s.map_or(Value::None, |s| Value::Str(s.to_string()))
}

/// Re-encodes a native buffer so that the masked slots hold a missing value, moving
/// to whatever dtype the promotion rules pick for a null fill.
fn with_nulls(native: TypedArray, mask: &Mask, ctx: &CastContext) -> Result<TypedArray, CastError> {
    if mask.not_any() {
        return Ok(native);
    }
    let promoted = promote(&native.dtype(), &Datum::Scalar(Value::None), ctx);
    let mut values = native.to_values();
    for i in mask.iter_ones() {
        values[i] = Value::None;
    }
    TypedArray::from_values_as(&promoted.dtype, &values, false)
}

//==================================================================================
// 2. TypedArray -> Arrow
//==================================================================================

/// Converts a `TypedArray` into an Arrow column.
///
/// Float NaN and datetime-like `iNaT` entries become Arrow nulls. `object` arrays are
/// exported only when every element is a string or missing.
pub fn typed_array_to_arrow(values: &TypedArray) -> Result<ArrayRef, CastError> {
    let nulls = null_buffer_from_mask(&values.null_mask());

    macro_rules! primitive {
        ($T:ty, $v:expr) => {
            Arc::new(PrimitiveArray::<$T>::new($v.clone().into(), nulls)) as ArrayRef
        };
    }

    let array = match values {
        TypedArray::Bool(v) => Arc::new(BooleanArray::from(v.clone())) as ArrayRef,
        TypedArray::Int8(v) => primitive!(Int8Type, v),
        TypedArray::Int16(v) => primitive!(Int16Type, v),
        TypedArray::Int32(v) => primitive!(Int32Type, v),
        TypedArray::Int64(v) => primitive!(Int64Type, v),
        TypedArray::UInt8(v) => primitive!(UInt8Type, v),
        TypedArray::UInt16(v) => primitive!(UInt16Type, v),
        TypedArray::UInt32(v) => primitive!(UInt32Type, v),
        TypedArray::UInt64(v) => primitive!(UInt64Type, v),
        TypedArray::Float32(v) => primitive!(Float32Type, v),
        TypedArray::Float64(v) => primitive!(Float64Type, v),
        TypedArray::DateTime { values, tz } => Arc::new(
            TimestampNanosecondArray::new(values.clone().into(), nulls)
                .with_timezone_opt(tz.clone()),
        ) as ArrayRef,
        TypedArray::Duration(v) => {
            Arc::new(DurationNanosecondArray::new(v.clone().into(), nulls)) as ArrayRef
        }
        TypedArray::Str(v) => Arc::new(StringArray::from(v.clone())) as ArrayRef,
        TypedArray::Object(v) => Arc::new(strings_from_objects(v)?) as ArrayRef,
        TypedArray::Complex64(_) | TypedArray::Complex128(_) => {
            return Err(CastError::UnsupportedType(format!(
                "{} has no Arrow representation",
                values.dtype()
            )))
        }
    };
    Ok(array)
}

fn strings_from_objects(values: &[Value]) -> Result<StringArray, CastError> {
    values
        .iter()
        .map(|v| match v {
            Value::Str(s) => Ok(Some(s.as_str())),
            v if v.is_null() => Ok(None),
            other => Err(CastError::UnsupportedType(format!(
                "object array holding {} has no Arrow representation",
                other.type_name()
            ))),
        })
        .collect::<Result<Vec<Option<&str>>, CastError>>()
        .map(StringArray::from)
}

fn unsupported(dt: &DataType) -> CastError {
    CastError::UnsupportedType(format!("Unsupported Arrow type for import: {}", dt))
}
