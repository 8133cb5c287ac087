//! Dynamic scalar values and the `Datum` (scalar-or-array) argument shape.
//!
//! `Value` is what an object-typed column holds: anything from a missing marker to a
//! typed numpy-style scalar to an opaque foreign object. The engine inspects values
//! through the small predicate helpers here instead of matching on variants at every
//! call site.

use arrow_schema::TimeUnit;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta};
use std::fmt;

use crate::null_handling::INAT;
use crate::types::array::TypedArray;
use crate::types::dtype::DType;

//==================================================================================
// 1. Complex Numbers
//==================================================================================

/// A complex number stored as two components of the same float type.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T: num_traits::Float> Complex<T> {
    pub fn new(re: T, im: T) -> Self {
        Self { re, im }
    }

    pub fn nan() -> Self {
        Self::new(T::nan(), T::zero())
    }

    pub fn is_nan(&self) -> bool {
        self.re.is_nan() || self.im.is_nan()
    }
}

//==================================================================================
// 2. Typed Numeric Scalars
//==================================================================================

/// A numeric scalar that already carries a concrete width, as opposed to the
/// untyped `Value::Int` / `Value::Float` literals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericScalar {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl NumericScalar {
    pub fn dtype(&self) -> DType {
        match self {
            NumericScalar::I8(_) => DType::INT8,
            NumericScalar::I16(_) => DType::INT16,
            NumericScalar::I32(_) => DType::INT32,
            NumericScalar::I64(_) => DType::INT64,
            NumericScalar::U8(_) => DType::UINT8,
            NumericScalar::U16(_) => DType::UINT16,
            NumericScalar::U32(_) => DType::UINT32,
            NumericScalar::U64(_) => DType::UINT64,
            NumericScalar::F32(_) => DType::FLOAT32,
            NumericScalar::F64(_) => DType::FLOAT64,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, NumericScalar::F32(_) | NumericScalar::F64(_))
    }

    /// The integer payload, or `None` for float scalars.
    pub fn to_i128(&self) -> Option<i128> {
        match *self {
            NumericScalar::I8(v) => Some(v.into()),
            NumericScalar::I16(v) => Some(v.into()),
            NumericScalar::I32(v) => Some(v.into()),
            NumericScalar::I64(v) => Some(v.into()),
            NumericScalar::U8(v) => Some(v.into()),
            NumericScalar::U16(v) => Some(v.into()),
            NumericScalar::U32(v) => Some(v.into()),
            NumericScalar::U64(v) => Some(v.into()),
            NumericScalar::F32(_) | NumericScalar::F64(_) => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match *self {
            NumericScalar::F32(v) => v.into(),
            NumericScalar::F64(v) => v,
            // Integer payloads always fit i128.
            _ => self.to_i128().map(|v| v as f64).unwrap_or(f64::NAN),
        }
    }
}

//==================================================================================
// 3. The Value Enum
//==================================================================================

/// A single dynamically-typed element.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null literal. Distinct from NaN for promotion purposes.
    None,
    /// Not-a-time, the datetime/duration missing marker.
    NaT,
    Bool(bool),
    /// An untyped integer literal (defaults to int64).
    Int(i64),
    /// A numeric scalar with an explicit width.
    Typed(NumericScalar),
    /// An untyped float literal (defaults to float64).
    Float(f64),
    Complex(Complex<f64>),
    Str(String),
    /// A timezone-naive datetime.
    DateTime(NaiveDateTime),
    /// A timezone-aware datetime.
    DateTimeTz(DateTime<FixedOffset>),
    /// A raw epoch count in the given unit.
    DateTime64 { value: i64, unit: TimeUnit },
    Duration(TimeDelta),
    /// A raw duration count in the given unit.
    Timedelta64 { value: i64, unit: TimeUnit },
    Date(NaiveDate),
    /// Any other object, known only by its representation.
    Opaque(String),
    /// An n-dimensional array-like. Only 0-d arrays are valid scalars.
    NdArray {
        shape: Vec<usize>,
        values: Box<TypedArray>,
    },
}

impl Value {
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Value::Int(_) => true,
            Value::Typed(n) => !n.is_float(),
            _ => false,
        }
    }

    pub fn is_float(&self) -> bool {
        match self {
            Value::Float(_) => true,
            Value::Typed(n) => n.is_float(),
            _ => false,
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Value::Complex(_))
    }

    /// Bool, integer or float (the "plain number" set the downcaster trusts).
    pub fn is_real_number(&self) -> bool {
        self.is_bool() || self.is_integer() || self.is_float()
    }

    /// A timezone-naive datetime-like scalar.
    pub fn is_naive_datetime(&self) -> bool {
        matches!(self, Value::DateTime(_) | Value::DateTime64 { .. })
    }

    pub fn is_duration(&self) -> bool {
        matches!(self, Value::Duration(_) | Value::Timedelta64 { .. })
    }

    pub fn is_null(&self) -> bool {
        crate::null_handling::is_null(self)
    }

    /// Numeric payload as `f64`; booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(v) => Some(*v as f64),
            Value::Typed(n) => Some(n.to_f64()),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer payload; booleans count as 0/1, floats are not integers.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Bool(b) => Some(i128::from(*b)),
            Value::Int(v) => Some((*v).into()),
            Value::Typed(n) => n.to_i128(),
            _ => None,
        }
    }

    /// The dtype an integer or float literal takes on its own.
    pub fn natural_numeric_dtype(&self) -> Option<DType> {
        match self {
            Value::Int(_) => Some(DType::INT64),
            Value::Float(_) => Some(DType::FLOAT64),
            Value::Typed(n) => Some(n.dtype()),
            _ => None,
        }
    }

    /// A short type label used in logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::NaT => "nat",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Typed(_) => "typed",
            Value::Float(_) => "float",
            Value::Complex(_) => "complex",
            Value::Str(_) => "str",
            Value::DateTime(_) => "datetime",
            Value::DateTimeTz(_) => "datetime_tz",
            Value::DateTime64 { .. } => "datetime64",
            Value::Duration(_) => "timedelta",
            Value::Timedelta64 { .. } => "timedelta64",
            Value::Date(_) => "date",
            Value::Opaque(_) => "opaque",
            Value::NdArray { .. } => "ndarray",
        }
    }

    /// A 0-dimensional array wrapping a single element.
    pub fn zero_dim(values: TypedArray) -> Self {
        Value::NdArray {
            shape: Vec::new(),
            values: Box::new(values),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<TimeDelta> for Value {
    fn from(v: TimeDelta) -> Self {
        Value::Duration(v)
    }
}

impl From<NumericScalar> for Value {
    fn from(v: NumericScalar) -> Self {
        Value::Typed(v)
    }
}

fn fmt_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        write!(f, "nan")
    } else if v.is_infinite() {
        write!(f, "{}inf", if v < 0.0 { "-" } else { "" })
    } else {
        write!(f, "{:?}", v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::NaT => write!(f, "NaT"),
            Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Int(v) => write!(f, "{}", v),
            Value::Typed(n) => match n.to_i128() {
                Some(i) => write!(f, "{}", i),
                None => fmt_float(f, n.to_f64()),
            },
            Value::Float(v) => fmt_float(f, *v),
            Value::Complex(c) => write!(f, "({}{:+}j)", c.re, c.im),
            Value::Str(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::DateTimeTz(dt) => write!(f, "{}", dt),
            Value::DateTime64 { value, unit } => match unit_to_nanos(*value, *unit)
                .and_then(nanos_to_naive)
            {
                Some(dt) => write!(f, "{}", dt),
                None => write!(f, "NaT"),
            },
            Value::Duration(td) => write!(f, "{}", td),
            Value::Timedelta64 { value, unit } => match unit_to_nanos(*value, *unit) {
                Some(ns) if ns != INAT => write!(f, "{}", TimeDelta::nanoseconds(ns)),
                _ => write!(f, "NaT"),
            },
            Value::Date(d) => write!(f, "{}", d),
            Value::Opaque(repr) => write!(f, "{}", repr),
            Value::NdArray { shape, .. } => write!(f, "ndarray{:?}", shape),
        }
    }
}

//==================================================================================
// 4. Datum: scalar or array arguments
//==================================================================================

/// A fill value, `other` operand or computed result: either one scalar or a whole array.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Scalar(Value),
    Array(TypedArray),
}

impl Datum {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Datum::Scalar(v) => Some(v),
            Datum::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&TypedArray> {
        match self {
            Datum::Array(a) => Some(a),
            Datum::Scalar(_) => None,
        }
    }

    pub fn into_array(self) -> Option<TypedArray> {
        match self {
            Datum::Array(a) => Some(a),
            Datum::Scalar(_) => None,
        }
    }

    /// The element standing at position `i` when broadcast against an array.
    pub fn value_at(&self, i: usize) -> Value {
        match self {
            Datum::Scalar(v) => v.clone(),
            Datum::Array(a) => a.get(i),
        }
    }
}

impl From<Value> for Datum {
    fn from(v: Value) -> Self {
        Datum::Scalar(v)
    }
}

impl From<TypedArray> for Datum {
    fn from(a: TypedArray) -> Self {
        Datum::Array(a)
    }
}

//==================================================================================
// 5. Nanosecond Helpers
//==================================================================================

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Rescales a raw count in `unit` to nanoseconds. `iNaT` passes through untouched;
/// overflow yields `None`.
pub fn unit_to_nanos(value: i64, unit: TimeUnit) -> Option<i64> {
    if value == INAT {
        return Some(INAT);
    }
    let factor = match unit {
        TimeUnit::Second => NANOS_PER_SECOND,
        TimeUnit::Millisecond => 1_000_000,
        TimeUnit::Microsecond => 1_000,
        TimeUnit::Nanosecond => 1,
    };
    value.checked_mul(factor).filter(|ns| *ns != INAT)
}

pub fn naive_to_nanos(dt: &NaiveDateTime) -> Option<i64> {
    dt.and_utc().timestamp_nanos_opt()
}

pub fn nanos_to_naive(ns: i64) -> Option<NaiveDateTime> {
    if ns == INAT {
        return None;
    }
    let secs = ns.div_euclid(NANOS_PER_SECOND);
    let nsecs = ns.rem_euclid(NANOS_PER_SECOND) as u32;
    DateTime::from_timestamp(secs, nsecs).map(|dt| dt.naive_utc())
}

pub fn duration_to_nanos(td: &TimeDelta) -> Option<i64> {
    td.num_nanoseconds()
}
