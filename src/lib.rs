//! This file is the root of the `dtypecast` Rust crate.
//!
//! `dtypecast` decides and performs dtype conversions for homogeneous 1-D columns:
//! inferring the dtype of scalars and object arrays, promoting a dtype to hold a
//! fill value, safely narrowing computed results, writing under a mask with upcasting,
//! and explicit nan-safe casts. Arrow columns enter and leave through `bridge`.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library so the Rust compiler
//!     knows they exist.
//! 2.  Re-exporting the types and operations callers use day to day.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
pub mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod cast;
pub mod config;
pub mod error;
pub mod inference;
pub mod null_handling;
pub mod parsing;
pub mod traits;
pub mod types;
pub mod utils;

#[doc(hidden)]
pub use log as __log;

//==================================================================================
// 2. Public Surface
//==================================================================================
pub use cast::{
    astype_nansafe, cast_to_datetimelike, coerce_indexer_dtype, coerce_to_dtypes,
    convert_objects, downcast, infer_to_datetimelike, invalidate_string_dtypes, localize,
    maybe_convert_objects, maybe_upcast, maybe_upcast_putmask, promote, soft_convert,
    CastContext, DowncastTarget, Promotion,
};
pub use config::CastConfig;
pub use error::CastError;
pub use inference::{infer_kind, infer_scalar, InferredKind};
pub use null_handling::{is_null, is_not_null};
pub use observability::init_logging;
pub use parsing::ConversionMode;
pub use types::{common_type, DType, Datum, TypedArray, Value};
