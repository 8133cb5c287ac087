//! This module defines the core, strongly-typed data representations used
//! throughout the dtypecast engine.
//!
//! It includes the closed `DType` enum, the dynamic `Value` scalar, the
//! `TypedArray` buffer standing in for columnar storage, and the explicit
//! common-type lattice used whenever two dtypes must be reconciled.

pub mod array;
pub mod common;
pub mod dtype;
pub mod value;

// Re-export the main types for easier access.
pub use array::TypedArray;
pub use common::common_type;
pub use dtype::{ComplexWidth, DType, DTypeKind, ExtensionDType, FloatWidth, IntWidth, NullSentinel};
pub use value::{Complex, Datum, NumericScalar, Value};
