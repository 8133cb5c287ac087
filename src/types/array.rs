//! The `TypedArray`: a homogeneous, owned, 1-D buffer tagged with its dtype.
//!
//! This is the engine's stand-in for the caller's columnar storage. It supports only
//! what type decisions need: element access as dynamic values, null detection, an
//! explicit `astype`, and an exact masked write.

use bitvec::prelude::*;

use crate::error::CastError;
use crate::null_handling::{is_null, Mask, INAT};
use crate::traits::NativeElement;
use crate::types::dtype::{ComplexWidth, DType, FloatWidth, IntWidth};
use crate::types::value::{
    duration_to_nanos, naive_to_nanos, nanos_to_naive, unit_to_nanos, Complex, Datum, Value,
};

/// A homogeneous 1-D buffer. Datetime and duration buffers hold nanosecond counts,
/// with `iNaT` marking missing entries.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Complex64(Vec<Complex<f32>>),
    Complex128(Vec<Complex<f64>>),
    DateTime { values: Vec<i64>, tz: Option<String> },
    Duration(Vec<i64>),
    Str(Vec<String>),
    Object(Vec<Value>),
}

/// Expands `$native` once per native-element variant (binding the buffer to `$data`)
/// and appends the remaining arms verbatim.
macro_rules! dispatch {
    ($self:expr, $data:ident => $native:expr, $($pat:pat => $arm:expr),+ $(,)?) => {
        match $self {
            TypedArray::Bool($data) => $native,
            TypedArray::Int8($data) => $native,
            TypedArray::Int16($data) => $native,
            TypedArray::Int32($data) => $native,
            TypedArray::Int64($data) => $native,
            TypedArray::UInt8($data) => $native,
            TypedArray::UInt16($data) => $native,
            TypedArray::UInt32($data) => $native,
            TypedArray::UInt64($data) => $native,
            TypedArray::Float32($data) => $native,
            TypedArray::Float64($data) => $native,
            TypedArray::Complex64($data) => $native,
            TypedArray::Complex128($data) => $native,
            $($pat => $arm),+
        }
    };
}

fn dtype_of<T: NativeElement>(_: &[T]) -> DType {
    T::dtype()
}

//==================================================================================
// 1. Element Conversion Helpers
//==================================================================================

fn out_of_range(value: &Value, to: DType) -> CastError {
    CastError::ValueOutOfRange {
        value: value.to_string(),
        to,
    }
}

fn collect_native<T: NativeElement>(values: &[Value], exact: bool) -> Result<Vec<T>, CastError> {
    values
        .iter()
        .map(|v| {
            let converted = if exact {
                T::from_value_exact(v)
            } else {
                T::from_value_lossy(v)
            };
            converted.ok_or_else(|| out_of_range(v, T::dtype()))
        })
        .collect()
}

fn write_native<T: NativeElement>(
    data: &mut [T],
    updates: &[(usize, Value)],
) -> Result<(), CastError> {
    // Stage every conversion first so a failure leaves the buffer untouched.
    let staged = updates
        .iter()
        .map(|(i, v)| {
            T::from_value_exact(v)
                .map(|x| (*i, x))
                .ok_or_else(|| out_of_range(v, T::dtype()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    for (i, x) in staged {
        data[i] = x;
    }
    Ok(())
}

/// Nanoseconds since the epoch for a datetime-like value. Numbers are accepted only
/// for lossy casts, where they are read as nanosecond counts.
pub(crate) fn datetime_nanos(value: &Value, lossy: bool) -> Result<i64, CastError> {
    let to = DType::DATETIME_NS;
    if is_null(value) {
        return Ok(INAT);
    }
    let ns = match value {
        Value::DateTime(dt) => naive_to_nanos(dt),
        Value::DateTimeTz(dt) => dt.timestamp_nanos_opt(),
        Value::DateTime64 { value, unit } => unit_to_nanos(*value, *unit),
        Value::Date(d) => d.and_hms_opt(0, 0, 0).as_ref().and_then(naive_to_nanos),
        v if lossy && v.is_integer() => v.as_i128().and_then(|i| i64::try_from(i).ok()),
        v if lossy && v.is_float() => v.as_f64().and_then(|f| num_traits::cast::<f64, i64>(f)),
        other => return Err(out_of_range(other, to)),
    };
    ns.ok_or_else(|| CastError::OutOfBoundsDatetime(value.to_string()))
}

/// Nanosecond count for a duration-like value, same rules as `datetime_nanos`.
pub(crate) fn duration_nanos(value: &Value, lossy: bool) -> Result<i64, CastError> {
    if is_null(value) {
        return Ok(INAT);
    }
    let ns = match value {
        Value::Duration(td) => duration_to_nanos(td),
        Value::Timedelta64 { value, unit } => unit_to_nanos(*value, *unit),
        v if lossy && v.is_integer() => v.as_i128().and_then(|i| i64::try_from(i).ok()),
        v if lossy && v.is_float() => v.as_f64().and_then(|f| num_traits::cast::<f64, i64>(f)),
        other => return Err(out_of_range(other, DType::Duration)),
    };
    ns.ok_or_else(|| out_of_range(value, DType::Duration))
}

/// The dynamic value for one nanosecond timestamp of a (possibly tz-aware) buffer.
fn datetime_value(ns: i64, tz: Option<&str>) -> Value {
    if ns == INAT {
        return Value::NaT;
    }
    let naive = Value::DateTime64 {
        value: ns,
        unit: arrow_schema::TimeUnit::Nanosecond,
    };
    let Some(tz) = tz else {
        return naive;
    };
    let aware = crate::parsing::fixed_offset(tz)
        .ok()
        .zip(nanos_to_naive(ns))
        .map(|(offset, utc)| utc.and_utc().with_timezone(&offset));
    match aware {
        Some(dt) => Value::DateTimeTz(dt),
        None => naive,
    }
}

fn duration_value(ns: i64) -> Value {
    if ns == INAT {
        Value::NaT
    } else {
        Value::Timedelta64 {
            value: ns,
            unit: arrow_schema::TimeUnit::Nanosecond,
        }
    }
}

//==================================================================================
// 2. Core API
//==================================================================================

impl TypedArray {
    pub fn dtype(&self) -> DType {
        dispatch!(self, d => dtype_of(d),
            TypedArray::DateTime { tz, .. } => DType::DateTime { tz: tz.clone() },
            TypedArray::Duration(_) => DType::Duration,
            TypedArray::Str(_) => DType::Str,
            TypedArray::Object(_) => DType::Object,
        )
    }

    pub fn len(&self) -> usize {
        dispatch!(self, d => d.len(),
            TypedArray::DateTime { values, .. } => values.len(),
            TypedArray::Duration(v) => v.len(),
            TypedArray::Str(v) => v.len(),
            TypedArray::Object(v) => v.len(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `i` as a dynamic value. Panics when `i` is out of bounds, like
    /// slice indexing.
    pub fn get(&self, i: usize) -> Value {
        dispatch!(self, d => d[i].to_value(),
            TypedArray::DateTime { values, tz } => datetime_value(values[i], tz.as_deref()),
            TypedArray::Duration(v) => duration_value(v[i]),
            TypedArray::Str(v) => Value::Str(v[i].clone()),
            TypedArray::Object(v) => v[i].clone(),
        )
    }

    /// The object view: every element as a dynamic value.
    pub fn to_values(&self) -> Vec<Value> {
        match self {
            TypedArray::Object(v) => v.clone(),
            other => (0..other.len()).map(|i| other.get(i)).collect(),
        }
    }

    /// The elements selected by `mask`, in order.
    pub fn masked_values(&self, mask: &BitSlice<u8, Lsb0>) -> Vec<Value> {
        mask.iter_ones().map(|i| self.get(i)).collect()
    }

    /// A bit per element, set where the element is its family's null sentinel.
    pub fn null_mask(&self) -> Mask {
        dispatch!(self, d => d.iter().map(|x| x.is_null()).collect(),
            TypedArray::DateTime { values, .. } => values.iter().map(|&x| x == INAT).collect(),
            TypedArray::Duration(v) => v.iter().map(|&x| x == INAT).collect(),
            TypedArray::Str(v) => BitVec::repeat(false, v.len()),
            TypedArray::Object(v) => v.iter().map(is_null).collect(),
        )
    }

    pub fn has_nulls(&self) -> bool {
        self.null_mask().any()
    }

    /// True when every element is null. Empty arrays are all-null.
    pub fn all_null(&self) -> bool {
        self.null_mask().all()
    }

    /// The elements as `f64` when every element has a real-number reading (nulls read
    /// as NaN). `None` for complex, temporal, string and non-numeric object arrays.
    pub fn as_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            TypedArray::Complex64(_)
            | TypedArray::Complex128(_)
            | TypedArray::DateTime { .. }
            | TypedArray::Duration(_)
            | TypedArray::Str(_) => None,
            other => other
                .to_values()
                .iter()
                .map(|v| if is_null(v) { Some(f64::NAN) } else { v.as_f64() })
                .collect(),
        }
    }

    //==============================================================================
    // Construction & Casting
    //==============================================================================

    /// Builds an array of `dtype` from dynamic values. With `exact`, any value that
    /// cannot be stored without loss is an error; otherwise cast rules apply.
    pub fn from_values_as(dtype: &DType, values: &[Value], exact: bool) -> Result<Self, CastError> {
        Ok(match dtype {
            DType::Bool => TypedArray::Bool(collect_native(values, exact)?),
            DType::Int(IntWidth::W8) => TypedArray::Int8(collect_native(values, exact)?),
            DType::Int(IntWidth::W16) => TypedArray::Int16(collect_native(values, exact)?),
            DType::Int(IntWidth::W32) => TypedArray::Int32(collect_native(values, exact)?),
            DType::Int(IntWidth::W64) => TypedArray::Int64(collect_native(values, exact)?),
            DType::UInt(IntWidth::W8) => TypedArray::UInt8(collect_native(values, exact)?),
            DType::UInt(IntWidth::W16) => TypedArray::UInt16(collect_native(values, exact)?),
            DType::UInt(IntWidth::W32) => TypedArray::UInt32(collect_native(values, exact)?),
            DType::UInt(IntWidth::W64) => TypedArray::UInt64(collect_native(values, exact)?),
            DType::Float(FloatWidth::F32) => TypedArray::Float32(collect_native(values, exact)?),
            DType::Float(FloatWidth::F64) => TypedArray::Float64(collect_native(values, exact)?),
            DType::Complex(ComplexWidth::C64) => {
                TypedArray::Complex64(collect_native(values, exact)?)
            }
            DType::Complex(ComplexWidth::C128) => {
                TypedArray::Complex128(collect_native(values, exact)?)
            }
            DType::DateTime { tz } => TypedArray::DateTime {
                values: values
                    .iter()
                    .map(|v| datetime_nanos(v, !exact))
                    .collect::<Result<_, _>>()?,
                tz: tz.clone(),
            },
            DType::Duration => TypedArray::Duration(
                values
                    .iter()
                    .map(|v| duration_nanos(v, !exact))
                    .collect::<Result<_, _>>()?,
            ),
            DType::Str => TypedArray::Str(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Str(s) => Ok(s.clone()),
                        other if !exact => Ok(other.to_string()),
                        other => Err(out_of_range(other, DType::Str)),
                    })
                    .collect::<Result<_, _>>()?,
            ),
            DType::Object => TypedArray::Object(values.to_vec()),
            DType::Extension(ext) => {
                return Err(CastError::UnsupportedType(format!(
                    "cannot materialize extension dtype {}",
                    ext.name
                )))
            }
        })
    }

    /// An explicit cast to `dtype`: floats truncate, precision narrows, numbers are
    /// read as nanosecond counts by temporal targets. Values with no reading in the
    /// target (NaN into an integer, text into a number) are an error.
    pub fn astype(&self, dtype: &DType) -> Result<Self, CastError> {
        if self.dtype() == *dtype {
            return Ok(self.clone());
        }
        match (self, dtype) {
            (TypedArray::DateTime { values, .. }, DType::DateTime { tz }) => {
                Ok(TypedArray::DateTime {
                    values: values.clone(),
                    tz: tz.clone(),
                })
            }
            (TypedArray::DateTime { values, .. }, DType::Int(IntWidth::W64))
            | (TypedArray::Duration(values), DType::Int(IntWidth::W64)) => {
                Ok(TypedArray::Int64(values.clone()))
            }
            (TypedArray::DateTime { .. } | TypedArray::Duration(_), target)
                if !matches!(target, DType::Object | DType::Str) =>
            {
                Err(CastError::InvalidCast {
                    from: self.dtype(),
                    to: target.clone(),
                })
            }
            _ => Self::from_values_as(dtype, &self.to_values(), false),
        }
    }

    /// Writes `other` into the positions selected by `mask`, in place. Every written
    /// value must be exactly representable in this array's dtype; otherwise nothing is
    /// written and an error is returned. Array `other`s are aligned by position.
    pub fn put_masked(
        &mut self,
        mask: &BitSlice<u8, Lsb0>,
        other: &Datum,
    ) -> Result<(), CastError> {
        if mask.len() != self.len() {
            return Err(CastError::LengthMismatch {
                expected: self.len(),
                got: mask.len(),
            });
        }
        if let Datum::Array(a) = other {
            if a.len() != self.len() {
                return Err(CastError::LengthMismatch {
                    expected: self.len(),
                    got: a.len(),
                });
            }
        }
        let updates: Vec<(usize, Value)> =
            mask.iter_ones().map(|i| (i, other.value_at(i))).collect();

        dispatch!(self, d => write_native(d, &updates),
            TypedArray::DateTime { values, .. } => {
                let staged = updates
                    .iter()
                    .map(|(i, v)| datetime_nanos(v, false).map(|ns| (*i, ns)))
                    .collect::<Result<Vec<_>, _>>()?;
                staged.into_iter().for_each(|(i, ns)| values[i] = ns);
                Ok(())
            },
            TypedArray::Duration(values) => {
                let staged = updates
                    .iter()
                    .map(|(i, v)| duration_nanos(v, false).map(|ns| (*i, ns)))
                    .collect::<Result<Vec<_>, _>>()?;
                staged.into_iter().for_each(|(i, ns)| values[i] = ns);
                Ok(())
            },
            TypedArray::Str(values) => {
                let staged = updates
                    .iter()
                    .map(|(i, v)| match v {
                        Value::Str(s) => Ok((*i, s.clone())),
                        other => Err(out_of_range(other, DType::Str)),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                staged.into_iter().for_each(|(i, s)| values[i] = s);
                Ok(())
            },
            TypedArray::Object(values) => {
                updates.into_iter().for_each(|(i, v)| values[i] = v);
                Ok(())
            },
        )
    }

    /// A datetime buffer from nanosecond counts.
    pub fn datetime(values: Vec<i64>, tz: Option<String>) -> Self {
        TypedArray::DateTime { values, tz }
    }
}

//==================================================================================
// 3. Conversions
//==================================================================================

macro_rules! impl_from_vec {
    ($ty:ty, $variant:ident) => {
        impl From<Vec<$ty>> for TypedArray {
            fn from(v: Vec<$ty>) -> Self {
                TypedArray::$variant(v)
            }
        }
    };
}

impl_from_vec!(bool, Bool);
impl_from_vec!(i8, Int8);
impl_from_vec!(i16, Int16);
impl_from_vec!(i32, Int32);
impl_from_vec!(i64, Int64);
impl_from_vec!(u8, UInt8);
impl_from_vec!(u16, UInt16);
impl_from_vec!(u32, UInt32);
impl_from_vec!(u64, UInt64);
impl_from_vec!(f32, Float32);
impl_from_vec!(f64, Float64);
impl_from_vec!(Complex<f32>, Complex64);
impl_from_vec!(Complex<f64>, Complex128);
impl_from_vec!(String, Str);
impl_from_vec!(Value, Object);
