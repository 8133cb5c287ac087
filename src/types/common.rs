//! Common-type resolution across a list of dtypes.
//!
//! The numeric part is an explicit lattice (`Bool < Int < Float < Complex`, with the
//! narrowest width that covers both operands) rather than a delegation to any
//! runtime promotion table. Every pair the lattice cannot unify resolves to Object.

use crate::error::CastError;
use crate::types::dtype::{ComplexWidth, DType, FloatWidth, IntWidth};

/// Returns the dtype that can hold values of every dtype in `dtypes`.
///
/// Identical entries are returned unchanged, so repeated tz-aware or categorical
/// dtypes survive. Any extension dtype among different entries forces Object; a set
/// of only datetimes (any timezones) resolves to naive `DateTime`.
pub fn common_type(dtypes: &[DType]) -> Result<DType, CastError> {
    let (first, rest) = dtypes.split_first().ok_or(CastError::EmptyTypeList)?;

    if rest.iter().all(|d| d == first) {
        return Ok(first.clone());
    }
    if dtypes.iter().any(DType::is_extension) {
        return Ok(DType::Object);
    }
    if dtypes.iter().all(|d| matches!(d, DType::DateTime { .. })) {
        return Ok(DType::DATETIME_NS);
    }
    if dtypes.iter().all(DType::is_duration) {
        return Ok(DType::Duration);
    }

    Ok(rest
        .iter()
        .try_fold(first.clone(), |acc, d| numeric_common_pair(&acc, d))
        .unwrap_or(DType::Object))
}

//==================================================================================
// Numeric Lattice
//==================================================================================

/// The common numeric dtype of two dtypes, or `None` when either is not numeric.
pub fn numeric_common_pair(a: &DType, b: &DType) -> Option<DType> {
    use DType::*;
    let common = match (a, b) {
        (Bool, Bool) => Bool,
        (Bool, x) | (x, Bool) if x.is_number() => x.clone(),

        (Int(x), Int(y)) => Int((*x).max(*y)),
        (UInt(x), UInt(y)) => UInt((*x).max(*y)),
        (Int(s), UInt(u)) | (UInt(u), Int(s)) => mixed_sign(*s, *u),

        (Float(x), Float(y)) => Float((*x).max(*y)),
        (Float(f), Int(w) | UInt(w)) | (Int(w) | UInt(w), Float(f)) => {
            Float(float_for_int(*f, *w))
        }

        (Complex(x), Complex(y)) => Complex((*x).max(*y)),
        (Complex(c), Float(f)) | (Float(f), Complex(c)) => {
            Complex(complex_for_float(*c, *f))
        }
        (Complex(c), Int(w) | UInt(w)) | (Int(w) | UInt(w), Complex(c)) => {
            Complex(complex_for_float(*c, float_for_int(FloatWidth::F32, *w)))
        }

        _ => return None,
    };
    Some(common)
}

/// Signed with unsigned: the signed width must strictly exceed the unsigned one.
/// `UInt64` has no signed cover and falls through to `Float64`.
fn mixed_sign(signed: IntWidth, unsigned: IntWidth) -> DType {
    if signed > unsigned {
        return DType::Int(signed);
    }
    match unsigned.wider() {
        Some(w) => DType::Int(w),
        None => DType::FLOAT64,
    }
}

/// Integers of 32 bits or more need a double to be covered.
fn float_for_int(float: FloatWidth, int: IntWidth) -> FloatWidth {
    if int >= IntWidth::W32 {
        FloatWidth::F64
    } else {
        float
    }
}

fn complex_for_float(complex: ComplexWidth, float: FloatWidth) -> ComplexWidth {
    match float {
        FloatWidth::F64 => ComplexWidth::C128,
        FloatWidth::F32 => complex,
    }
}

#[cfg(test)]
#[path = "common_tests.rs"]
mod common_tests;
