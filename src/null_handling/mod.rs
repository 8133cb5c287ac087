//! This module handles missing-value semantics: the per-family null sentinels, the
//! null predicate over dynamic values, and the conversion between Arrow validity
//! bitmaps and sentinel-encoded buffers.

pub mod bitmap;
pub mod sentinel;

use bitvec::prelude::*;

use crate::types::Value;

/// The nanosecond "not a time" sentinel.
pub const INAT: i64 = i64::MIN;

/// One bit per element; set bits select elements.
pub type Mask = BitVec<u8, Lsb0>;

/// True for every missing-value marker: `None`, `NaT`, float NaN, complex NaN and
/// datetime-like raw counts equal to `iNaT`.
pub fn is_null(value: &Value) -> bool {
    match value {
        Value::None | Value::NaT => true,
        Value::Float(f) => f.is_nan(),
        Value::Typed(n) => n.is_float() && n.to_f64().is_nan(),
        Value::Complex(c) => c.is_nan(),
        Value::DateTime64 { value, .. } | Value::Timedelta64 { value, .. } => *value == INAT,
        _ => false,
    }
}

pub fn is_not_null(value: &Value) -> bool {
    !is_null(value)
}

pub use sentinel::{null_fill, sentinel_value};
