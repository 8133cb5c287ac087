// In: src/error.rs

//! This module defines the single, unified error type for the entire dtypecast library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Only "hard" errors ever reach a caller: requests the caller must fix. Best-effort
//! conversions (downcasting, soft classification, direct masked writes) build the same
//! error internally and then discard it in favour of the untouched input.

use thiserror::Error;

use crate::types::DType;

#[derive(Error, Debug)]
pub enum CastError {
    // =========================================================================
    // === Hard Errors (explicit requests the caller must fix)
    // =========================================================================
    #[error("no types given")]
    EmptyTypeList,

    #[error("cannot convert {kind} to non-nanosecond unit {unit:?}")]
    NonNanosecondUnit {
        kind: &'static str,
        unit: arrow_schema::TimeUnit,
    },

    #[error("invalid conversion flags: {0}")]
    InvalidConversionFlags(String),

    #[error("Cannot convert NA to integer")]
    NaNToInteger,

    #[error("invalid array passed to scalar inference: expected 0 dimensions, got {0}")]
    InvalidNdim(usize),

    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("string dtypes are not allowed, use 'object' instead")]
    StringDTypeNotAllowed,

    // =========================================================================
    // === Conversion Errors (hard or soft depending on the caller)
    // =========================================================================
    #[error("cannot astype from {from} to {to}")]
    InvalidCast { from: DType, to: DType },

    #[error("value {value} does not fit in {to}")]
    ValueOutOfRange { value: String, to: DType },

    #[error("Out of bounds nanosecond timestamp: {0}")]
    OutOfBoundsDatetime(String),

    #[error("unable to parse {value:?} as {target}")]
    Parse { value: String, target: &'static str },

    #[error("unknown or unsupported timezone: {0}")]
    UnknownTimezone(String),

    #[error("Unsupported data type for this operation: {0}")]
    UnsupportedType(String),

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An I/O error, typically while opening a log file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while loading a `CastConfig`.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl CastError {
    /// Convenience constructor for parse failures.
    pub(crate) fn parse(value: impl std::fmt::Debug, target: &'static str) -> Self {
        CastError::Parse {
            value: format!("{:?}", value),
            target,
        }
    }
}
