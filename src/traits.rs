//! This module defines shared traits used across the typed-array code paths.
//!
//! `NativeElement` is the bridge between a dynamic `Value` and the native element of
//! a typed buffer. Each implementation answers two questions: can this value be
//! stored *exactly* (used by masked writes), and what does a numpy-style `astype`
//! produce for it (used by explicit casts).

use num_traits::NumCast;
use std::fmt;

use crate::types::value::{Complex, NumericScalar};
use crate::types::{DType, Value};

/// A native element type that can back a `TypedArray` variant.
pub trait NativeElement: Copy + PartialEq + fmt::Debug + 'static {
    /// The dtype of a buffer of this element.
    fn dtype() -> DType;

    /// Lifts the element back into a dynamic value.
    fn to_value(self) -> Value;

    /// Converts a value without any loss of information, or refuses.
    fn from_value_exact(value: &Value) -> Option<Self>;

    /// Converts a value the way an explicit cast would: truncating floats, narrowing
    /// precision. Values with no numeric reading at all are refused.
    fn from_value_lossy(value: &Value) -> Option<Self>;

    /// True when the element is its family's null sentinel.
    fn is_null(self) -> bool {
        false
    }
}

//==================================================================================
// 1. Integers
//==================================================================================

macro_rules! impl_native_int {
    ($ty:ty, $dtype:expr, $variant:ident) => {
        impl NativeElement for $ty {
            fn dtype() -> DType {
                $dtype
            }

            fn to_value(self) -> Value {
                Value::Typed(NumericScalar::$variant(self))
            }

            fn from_value_exact(value: &Value) -> Option<Self> {
                if let Some(i) = value.as_i128() {
                    return <$ty as NumCast>::from(i);
                }
                match value {
                    Value::Complex(c) if c.im == 0.0 => {
                        integral_f64(c.re).and_then(<$ty as NumCast>::from)
                    }
                    _ => value
                        .as_f64()
                        .and_then(integral_f64)
                        .and_then(<$ty as NumCast>::from),
                }
            }

            fn from_value_lossy(value: &Value) -> Option<Self> {
                if let Some(i) = value.as_i128() {
                    return <$ty as NumCast>::from(i);
                }
                match value {
                    Value::Str(s) => {
                        let s = s.trim();
                        s.parse::<$ty>()
                            .ok()
                            .or_else(|| s.parse::<f64>().ok().and_then(<$ty as NumCast>::from))
                    }
                    Value::Complex(c) => <$ty as NumCast>::from(c.re),
                    _ => value.as_f64().and_then(<$ty as NumCast>::from),
                }
            }
        }
    };
}

/// Returns the float only when it holds an integral, finite value.
fn integral_f64(v: f64) -> Option<f64> {
    (v.is_finite() && v.fract() == 0.0).then_some(v)
}

impl_native_int!(i8, DType::INT8, I8);
impl_native_int!(i16, DType::INT16, I16);
impl_native_int!(i32, DType::INT32, I32);
impl_native_int!(i64, DType::INT64, I64);
impl_native_int!(u8, DType::UINT8, U8);
impl_native_int!(u16, DType::UINT16, U16);
impl_native_int!(u32, DType::UINT32, U32);
impl_native_int!(u64, DType::UINT64, U64);

//==================================================================================
// 2. Floats
//==================================================================================

macro_rules! impl_native_float {
    ($ty:ty, $dtype:expr, $variant:ident) => {
        impl NativeElement for $ty {
            fn dtype() -> DType {
                $dtype
            }

            fn to_value(self) -> Value {
                Value::Typed(NumericScalar::$variant(self))
            }

            fn from_value_exact(value: &Value) -> Option<Self> {
                if value.is_null() {
                    return Some(<$ty>::NAN);
                }
                if let Some(i) = value.as_i128() {
                    let f = i as $ty;
                    return (f as i128 == i).then_some(f);
                }
                let v = match value {
                    Value::Complex(c) if c.im == 0.0 => c.re,
                    _ => value.as_f64()?,
                };
                let f = v as $ty;
                (<f64 as From<$ty>>::from(f) == v || v.is_nan()).then_some(f)
            }

            fn from_value_lossy(value: &Value) -> Option<Self> {
                if value.is_null() {
                    return Some(<$ty>::NAN);
                }
                match value {
                    Value::Str(s) => s.trim().parse::<$ty>().ok(),
                    Value::Complex(c) => Some(c.re as $ty),
                    _ => value.as_f64().map(|v| v as $ty),
                }
            }

            fn is_null(self) -> bool {
                self.is_nan()
            }
        }
    };
}

impl_native_float!(f32, DType::FLOAT32, F32);
impl_native_float!(f64, DType::FLOAT64, F64);

//==================================================================================
// 3. Booleans
//==================================================================================

impl NativeElement for bool {
    fn dtype() -> DType {
        DType::Bool
    }

    fn to_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value_exact(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => match value.as_f64()? {
                v if v == 0.0 => Some(false),
                v if v == 1.0 => Some(true),
                _ => None,
            },
        }
    }

    fn from_value_lossy(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Complex(c) => Some(c.re != 0.0 || c.im != 0.0),
            // NaN is truthy.
            _ => value.as_f64().map(|v| v != 0.0),
        }
    }
}

//==================================================================================
// 4. Complex
//==================================================================================

macro_rules! impl_native_complex {
    ($ty:ty, $dtype:expr) => {
        impl NativeElement for Complex<$ty> {
            fn dtype() -> DType {
                $dtype
            }

            fn to_value(self) -> Value {
                Value::Complex(Complex::new(self.re.into(), self.im.into()))
            }

            fn from_value_exact(value: &Value) -> Option<Self> {
                match value {
                    Value::Complex(c) => {
                        let re = <$ty as NativeElement>::from_value_exact(&Value::Float(c.re))?;
                        let im = <$ty as NativeElement>::from_value_exact(&Value::Float(c.im))?;
                        Some(Complex::new(re, im))
                    }
                    v if v.is_null() => Some(Complex::nan()),
                    v => <$ty as NativeElement>::from_value_exact(v)
                        .map(|re| Complex::new(re, 0.0)),
                }
            }

            fn from_value_lossy(value: &Value) -> Option<Self> {
                match value {
                    Value::Complex(c) => Some(Complex::new(c.re as $ty, c.im as $ty)),
                    v => <$ty as NativeElement>::from_value_lossy(v)
                        .map(|re| Complex::new(re, 0.0)),
                }
            }

            fn is_null(self) -> bool {
                Complex::is_nan(&self)
            }
        }
    };
}

impl_native_complex!(f32, DType::COMPLEX64);
impl_native_complex!(f64, DType::COMPLEX128);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_int_conversion_refuses_loss() {
        assert_eq!(i64::from_value_exact(&Value::Float(5.0)), Some(5));
        assert_eq!(i64::from_value_exact(&Value::Float(1.5)), None);
        assert_eq!(i64::from_value_exact(&Value::Float(f64::NAN)), None);
        assert_eq!(i8::from_value_exact(&Value::Int(300)), None);
        assert_eq!(u8::from_value_exact(&Value::Int(-1)), None);
    }

    #[test]
    fn test_lossy_int_conversion_truncates() {
        assert_eq!(i64::from_value_lossy(&Value::Float(1.9)), Some(1));
        assert_eq!(i64::from_value_lossy(&Value::Str(" 42 ".into())), Some(42));
        assert_eq!(i64::from_value_lossy(&Value::Float(f64::NAN)), None);
    }

    #[test]
    fn test_float_nulls_become_nan() {
        assert!(f64::from_value_exact(&Value::None).unwrap().is_nan());
        assert!(f32::from_value_exact(&Value::NaT).unwrap().is_nan());
        assert_eq!(f32::from_value_exact(&Value::Float(0.1)), None);
        assert_eq!(f32::from_value_exact(&Value::Float(0.5)), Some(0.5));
    }

    #[test]
    fn test_bool_exact_only_accepts_zero_and_one() {
        assert_eq!(bool::from_value_exact(&Value::Int(1)), Some(true));
        assert_eq!(bool::from_value_exact(&Value::Int(2)), None);
        assert_eq!(bool::from_value_lossy(&Value::Int(2)), Some(true));
    }
}
