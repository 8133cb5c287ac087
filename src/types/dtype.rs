//! This module defines the canonical, type-safe representation of storage types
//! (dtypes) used throughout the dtypecast engine.
//!
//! A `DType` is a closed tagged variant. Every decision the engine makes about
//! promotion, downcasting or null handling is a `match` over this enum, so there is
//! no runtime probing of "what kind of thing is this".
//!
//! Datetime and duration dtypes exist only at nanosecond resolution. Coarser units
//! are either normalized on ingestion (values) or rejected (dtype requests).

use arrow_schema::{DataType as ArrowDataType, TimeUnit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CastError;

//==================================================================================
// 1. Widths & Kinds
//==================================================================================

/// Bit width of a signed or unsigned integer dtype.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bytes(self) -> usize {
        match self {
            IntWidth::W8 => 1,
            IntWidth::W16 => 2,
            IntWidth::W32 => 4,
            IntWidth::W64 => 8,
        }
    }

    /// The next wider integer width, if any.
    pub fn wider(self) -> Option<IntWidth> {
        match self {
            IntWidth::W8 => Some(IntWidth::W16),
            IntWidth::W16 => Some(IntWidth::W32),
            IntWidth::W32 => Some(IntWidth::W64),
            IntWidth::W64 => None,
        }
    }
}

/// Bit width of a floating-point dtype.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FloatWidth {
    F32,
    F64,
}

/// Total width of a complex dtype (both components).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComplexWidth {
    C64,
    C128,
}

/// A dtype the engine knows only by name (e.g. `category`). Extension types are
/// never unified with anything else.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionDType {
    pub name: String,
}

impl ExtensionDType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn categorical() -> Self {
        Self::new("category")
    }

    pub fn is_categorical(&self) -> bool {
        self.name == "category"
    }
}

/// The high-level family of a dtype, comparable across widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DTypeKind {
    Bool,
    Int,
    UInt,
    Float,
    Complex,
    DateTime,
    Duration,
    Str,
    Object,
    Extension,
}

/// The per-family value used to represent a missing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullSentinel {
    /// `iNaT` (`i64::MIN`) inside a nanosecond datetime/duration buffer.
    NotATime,
    /// IEEE NaN inside a float or complex buffer.
    NotANumber,
    /// The `None` object inside an object buffer.
    ObjectNone,
}

//==================================================================================
// 2. The DType Enum
//==================================================================================

/// The canonical storage type of a homogeneous 1-D array.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    Int(IntWidth),
    UInt(IntWidth),
    Float(FloatWidth),
    Complex(ComplexWidth),
    /// Nanosecond timestamps, optionally qualified with a timezone.
    DateTime { tz: Option<String> },
    /// Nanosecond durations.
    Duration,
    /// Fixed-width strings. Never produced by promotion.
    Str,
    Object,
    Extension(ExtensionDType),
}

impl DType {
    pub const BOOL: DType = DType::Bool;
    pub const INT8: DType = DType::Int(IntWidth::W8);
    pub const INT16: DType = DType::Int(IntWidth::W16);
    pub const INT32: DType = DType::Int(IntWidth::W32);
    pub const INT64: DType = DType::Int(IntWidth::W64);
    pub const UINT8: DType = DType::UInt(IntWidth::W8);
    pub const UINT16: DType = DType::UInt(IntWidth::W16);
    pub const UINT32: DType = DType::UInt(IntWidth::W32);
    pub const UINT64: DType = DType::UInt(IntWidth::W64);
    pub const FLOAT32: DType = DType::Float(FloatWidth::F32);
    pub const FLOAT64: DType = DType::Float(FloatWidth::F64);
    pub const COMPLEX64: DType = DType::Complex(ComplexWidth::C64);
    pub const COMPLEX128: DType = DType::Complex(ComplexWidth::C128);
    pub const DATETIME_NS: DType = DType::DateTime { tz: None };
    pub const DURATION_NS: DType = DType::Duration;
    pub const OBJECT: DType = DType::Object;

    /// Builds a datetime dtype, rejecting every unit except nanoseconds.
    pub fn datetime(unit: TimeUnit, tz: Option<String>) -> Result<Self, CastError> {
        match unit {
            TimeUnit::Nanosecond => Ok(DType::DateTime { tz }),
            unit => Err(CastError::NonNanosecondUnit {
                kind: "datetime",
                unit,
            }),
        }
    }

    /// Builds a duration dtype, rejecting every unit except nanoseconds.
    pub fn duration(unit: TimeUnit) -> Result<Self, CastError> {
        match unit {
            TimeUnit::Nanosecond => Ok(DType::Duration),
            unit => Err(CastError::NonNanosecondUnit {
                kind: "timedelta",
                unit,
            }),
        }
    }

    /// A timezone-aware nanosecond datetime dtype.
    pub fn datetime_tz(tz: impl Into<String>) -> Self {
        DType::DateTime {
            tz: Some(tz.into()),
        }
    }

    pub fn categorical() -> Self {
        DType::Extension(ExtensionDType::categorical())
    }

    pub fn kind(&self) -> DTypeKind {
        match self {
            DType::Bool => DTypeKind::Bool,
            DType::Int(_) => DTypeKind::Int,
            DType::UInt(_) => DTypeKind::UInt,
            DType::Float(_) => DTypeKind::Float,
            DType::Complex(_) => DTypeKind::Complex,
            DType::DateTime { .. } => DTypeKind::DateTime,
            DType::Duration => DTypeKind::Duration,
            DType::Str => DTypeKind::Str,
            DType::Object => DTypeKind::Object,
            DType::Extension(_) => DTypeKind::Extension,
        }
    }

    /// Size of one element in bytes. Object-like dtypes report a pointer width.
    pub fn itemsize(&self) -> usize {
        match self {
            DType::Bool => 1,
            DType::Int(w) | DType::UInt(w) => w.bytes(),
            DType::Float(FloatWidth::F32) => 4,
            DType::Float(FloatWidth::F64) => 8,
            DType::Complex(ComplexWidth::C64) => 8,
            DType::Complex(ComplexWidth::C128) => 16,
            DType::DateTime { .. } | DType::Duration => 8,
            DType::Str | DType::Object | DType::Extension(_) => 8,
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, DType::Bool)
    }

    /// Signed or unsigned integer.
    pub fn is_integer(&self) -> bool {
        matches!(self, DType::Int(_) | DType::UInt(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DType::Float(_))
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, DType::Complex(_))
    }

    /// Integer, float or complex. Booleans are not numbers here.
    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_float() || self.is_complex()
    }

    /// Timezone-naive nanosecond datetime.
    pub fn is_datetime(&self) -> bool {
        matches!(self, DType::DateTime { tz: None })
    }

    pub fn is_datetime_tz(&self) -> bool {
        matches!(self, DType::DateTime { tz: Some(_) })
    }

    pub fn is_duration(&self) -> bool {
        matches!(self, DType::Duration)
    }

    /// Any datetime (naive or aware) or duration.
    pub fn is_datetimelike(&self) -> bool {
        matches!(self, DType::DateTime { .. } | DType::Duration)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, DType::Object)
    }

    pub fn is_extension(&self) -> bool {
        matches!(self, DType::Extension(_))
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, DType::Extension(ext) if ext.is_categorical())
    }

    pub fn tz(&self) -> Option<&str> {
        match self {
            DType::DateTime { tz } => tz.as_deref(),
            _ => None,
        }
    }

    /// The family sentinel for missing values, or `None` when the dtype cannot hold
    /// nulls without promotion.
    pub fn null_sentinel(&self) -> Option<NullSentinel> {
        match self {
            DType::DateTime { .. } | DType::Duration => Some(NullSentinel::NotATime),
            DType::Float(_) | DType::Complex(_) => Some(NullSentinel::NotANumber),
            DType::Object | DType::Extension(_) => Some(NullSentinel::ObjectNone),
            DType::Bool | DType::Int(_) | DType::UInt(_) | DType::Str => None,
        }
    }

    //==============================================================================
    // Arrow interop
    //==============================================================================

    /// Converts an Arrow `DataType` into a `DType`.
    ///
    /// Timestamps and durations of any unit map to the nanosecond dtype; the values
    /// are rescaled by the bridge. Strings map to Object.
    pub fn from_arrow_type(arrow_type: &ArrowDataType) -> Result<Self, CastError> {
        match arrow_type {
            ArrowDataType::Boolean => Ok(DType::Bool),
            ArrowDataType::Int8 => Ok(DType::INT8),
            ArrowDataType::Int16 => Ok(DType::INT16),
            ArrowDataType::Int32 => Ok(DType::INT32),
            ArrowDataType::Int64 => Ok(DType::INT64),
            ArrowDataType::UInt8 => Ok(DType::UINT8),
            ArrowDataType::UInt16 => Ok(DType::UINT16),
            ArrowDataType::UInt32 => Ok(DType::UINT32),
            ArrowDataType::UInt64 => Ok(DType::UINT64),
            ArrowDataType::Float32 => Ok(DType::FLOAT32),
            ArrowDataType::Float64 => Ok(DType::FLOAT64),
            ArrowDataType::Timestamp(_, tz) => Ok(DType::DateTime {
                tz: tz.as_ref().map(|t| t.to_string()),
            }),
            ArrowDataType::Duration(_) => Ok(DType::Duration),
            ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 | ArrowDataType::Null => {
                Ok(DType::Object)
            }
            dt => Err(CastError::UnsupportedType(format!(
                "Cannot convert Arrow type {:?} to DType",
                dt
            ))),
        }
    }

    /// Converts a `DType` back into an Arrow `DataType`.
    pub fn to_arrow_type(&self) -> Result<ArrowDataType, CastError> {
        Ok(match self {
            DType::Bool => ArrowDataType::Boolean,
            DType::Int(IntWidth::W8) => ArrowDataType::Int8,
            DType::Int(IntWidth::W16) => ArrowDataType::Int16,
            DType::Int(IntWidth::W32) => ArrowDataType::Int32,
            DType::Int(IntWidth::W64) => ArrowDataType::Int64,
            DType::UInt(IntWidth::W8) => ArrowDataType::UInt8,
            DType::UInt(IntWidth::W16) => ArrowDataType::UInt16,
            DType::UInt(IntWidth::W32) => ArrowDataType::UInt32,
            DType::UInt(IntWidth::W64) => ArrowDataType::UInt64,
            DType::Float(FloatWidth::F32) => ArrowDataType::Float32,
            DType::Float(FloatWidth::F64) => ArrowDataType::Float64,
            DType::DateTime { tz } => {
                ArrowDataType::Timestamp(TimeUnit::Nanosecond, tz.as_deref().map(Into::into))
            }
            DType::Duration => ArrowDataType::Duration(TimeUnit::Nanosecond),
            DType::Str => ArrowDataType::Utf8,
            other => {
                return Err(CastError::UnsupportedType(format!(
                    "{} has no Arrow equivalent",
                    other
                )))
            }
        })
    }
}

//==================================================================================
// 3. Names
//==================================================================================

/// Provides the canonical string name for a `DType` (`int64`, `datetime64[ns, UTC]`, ...).
impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Bool => write!(f, "bool"),
            DType::Int(w) => write!(f, "int{}", w.bytes() * 8),
            DType::UInt(w) => write!(f, "uint{}", w.bytes() * 8),
            DType::Float(FloatWidth::F32) => write!(f, "float32"),
            DType::Float(FloatWidth::F64) => write!(f, "float64"),
            DType::Complex(ComplexWidth::C64) => write!(f, "complex64"),
            DType::Complex(ComplexWidth::C128) => write!(f, "complex128"),
            DType::DateTime { tz: None } => write!(f, "datetime64[ns]"),
            DType::DateTime { tz: Some(tz) } => write!(f, "datetime64[ns, {}]", tz),
            DType::Duration => write!(f, "timedelta64[ns]"),
            DType::Str => write!(f, "str"),
            DType::Object => write!(f, "object"),
            DType::Extension(ext) => write!(f, "{}", ext.name),
        }
    }
}

fn parse_unit(unit: &str) -> Option<TimeUnit> {
    match unit {
        "s" => Some(TimeUnit::Second),
        "ms" => Some(TimeUnit::Millisecond),
        "us" => Some(TimeUnit::Microsecond),
        "ns" => Some(TimeUnit::Nanosecond),
        _ => None,
    }
}

/// Parses a dtype name. Datetime and timedelta names with a unit other than `ns`
/// are rejected with `CastError::NonNanosecondUnit`.
impl FromStr for DType {
    type Err = CastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let simple = match name {
            "bool" => Some(DType::Bool),
            "int8" => Some(DType::INT8),
            "int16" => Some(DType::INT16),
            "int32" => Some(DType::INT32),
            "int64" | "int" => Some(DType::INT64),
            "uint8" => Some(DType::UINT8),
            "uint16" => Some(DType::UINT16),
            "uint32" => Some(DType::UINT32),
            "uint64" => Some(DType::UINT64),
            "float32" => Some(DType::FLOAT32),
            "float64" | "float" => Some(DType::FLOAT64),
            "complex64" => Some(DType::COMPLEX64),
            "complex128" | "complex" => Some(DType::COMPLEX128),
            "timedelta64" => Some(DType::Duration),
            "datetime64" => Some(DType::DATETIME_NS),
            "str" => Some(DType::Str),
            "object" => Some(DType::Object),
            "category" => Some(DType::categorical()),
            _ => None,
        };
        if let Some(dtype) = simple {
            return Ok(dtype);
        }

        let unsupported = || CastError::UnsupportedType(format!("unknown dtype name {:?}", s));

        if let Some(inner) = name
            .strip_prefix("datetime64[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let mut parts = inner.splitn(2, ',');
            let unit = parts.next().map(str::trim).and_then(parse_unit);
            let tz = parts.next().map(|t| t.trim().to_string());
            return DType::datetime(unit.ok_or_else(unsupported)?, tz);
        }
        if let Some(inner) = name
            .strip_prefix("timedelta64[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let unit = parse_unit(inner.trim()).ok_or_else(unsupported)?;
            return DType::duration(unit);
        }
        Err(unsupported())
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_nanosecond_units_are_rejected() {
        assert!(matches!(
            DType::datetime(TimeUnit::Second, None),
            Err(CastError::NonNanosecondUnit { .. })
        ));
        assert!(matches!(
            "timedelta64[ms]".parse::<DType>(),
            Err(CastError::NonNanosecondUnit { .. })
        ));
        assert_eq!(DType::duration(TimeUnit::Nanosecond).unwrap(), DType::Duration);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("int64".parse::<DType>().unwrap(), DType::INT64);
        assert_eq!(
            "datetime64[ns, UTC]".parse::<DType>().unwrap(),
            DType::datetime_tz("UTC")
        );
        assert_eq!("datetime64[ns]".parse::<DType>().unwrap(), DType::DATETIME_NS);
        assert!("quux".parse::<DType>().is_err());
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for dtype in [
            DType::Bool,
            DType::UINT16,
            DType::FLOAT32,
            DType::COMPLEX128,
            DType::datetime_tz("+05:30"),
            DType::Duration,
            DType::Object,
            DType::categorical(),
        ] {
            assert_eq!(dtype.to_string().parse::<DType>().unwrap(), dtype);
        }
    }

    #[test]
    fn test_null_sentinels_per_family() {
        assert_eq!(DType::DATETIME_NS.null_sentinel(), Some(NullSentinel::NotATime));
        assert_eq!(DType::Duration.null_sentinel(), Some(NullSentinel::NotATime));
        assert_eq!(DType::FLOAT32.null_sentinel(), Some(NullSentinel::NotANumber));
        assert_eq!(DType::Object.null_sentinel(), Some(NullSentinel::ObjectNone));
        assert_eq!(DType::INT64.null_sentinel(), None);
        assert_eq!(DType::Bool.null_sentinel(), None);
    }

    #[test]
    fn test_arrow_mapping() {
        assert_eq!(
            DType::from_arrow_type(&ArrowDataType::Timestamp(TimeUnit::Millisecond, None))
                .unwrap(),
            DType::DATETIME_NS
        );
        assert_eq!(
            DType::UINT32.to_arrow_type().unwrap(),
            ArrowDataType::UInt32
        );
        assert!(DType::Object.to_arrow_type().is_err());
        assert!(DType::from_arrow_type(&ArrowDataType::Binary).is_err());
    }
}
