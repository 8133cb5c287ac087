//! The casting engine: promotion, object classification, datetime-like casting,
//! safe downcasting, masked assignment and nan-safe `astype`.
//!
//! Every operation takes a `CastContext` carrying the shared, read-only
//! configuration and the parsing capability. Operations are pure: they never keep
//! references to their inputs beyond the call.

pub mod astype;
pub mod datetimelike;
pub mod downcast;
pub mod objects;
pub mod promote;
pub mod putmask;

use std::sync::Arc;

use crate::config::CastConfig;
use crate::parsing::{ChronoParsers, Parsers};

pub use astype::{
    astype_nansafe, coerce_indexer_dtype, coerce_to_dtypes, convert_platform,
    invalidate_string_dtypes, maybe_convert_string_to_object, possibly_castable,
};
pub use datetimelike::{cast_to_datetimelike, infer_to_datetimelike, localize};
pub use downcast::{downcast, downcast_array, DowncastTarget};
pub use objects::{
    convert_objects, maybe_convert_objects, soft_convert, ConvertFlag, ConvertObjectsOptions,
    MaybeConvertOptions, SoftConvertOptions,
};
pub use promote::{maybe_upcast, promote, Promotion};
pub use putmask::{maybe_upcast_putmask, PutmaskOutcome};

/// Shared, read-only state threaded through every casting operation.
#[derive(Debug, Clone)]
pub struct CastContext {
    pub config: Arc<CastConfig>,
    pub parsers: Arc<dyn Parsers>,
}

impl CastContext {
    /// A context using the default `chrono` parsers configured from `config`.
    pub fn new(config: CastConfig) -> Self {
        let parsers: Arc<dyn Parsers> = Arc::new(ChronoParsers::new(&config));
        Self {
            config: Arc::new(config),
            parsers,
        }
    }

    pub fn with_parsers(config: Arc<CastConfig>, parsers: Arc<dyn Parsers>) -> Self {
        Self { config, parsers }
    }
}

impl Default for CastContext {
    fn default() -> Self {
        Self::new(CastConfig::default())
    }
}
