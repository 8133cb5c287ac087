// In: src/config.rs

//! The single source of truth for all dtypecast tuning knobs.
//!
//! This module defines the unified `CastConfig` struct, which is designed to be
//! created once at the application boundary (e.g., from a JSON document) and then
//! passed down through the system via a shared, read-only `Arc<CastConfig>` held by
//! the `CastContext`.

use arrow_schema::TimeUnit;
use serde::{Deserialize, Serialize};

use crate::error::CastError;

//==================================================================================
// I. The Unified CastConfig
//==================================================================================

/// The single, unified configuration for inference, parsing and downcasting.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CastConfig {
    /// How many leading elements of an object array are sampled when deciding
    /// whether it holds datetimes or timedeltas.
    #[serde(default = "default_inference_sample_size")]
    pub inference_sample_size: usize,

    /// Relative tolerance of the `allclose` check that validates a downcast.
    #[serde(default = "default_rtol")]
    pub rtol: f64,

    /// Absolute tolerance of the `allclose` check that validates a downcast.
    #[serde(default = "default_atol")]
    pub atol: f64,

    /// `chrono` format strings tried, in order, by the default datetime parser
    /// after RFC 3339. Formats without a time component parse as midnight.
    #[serde(default = "default_datetime_formats")]
    pub datetime_formats: Vec<String>,

    /// The unit numbers are read in when they are parsed as datetimes.
    #[serde(default = "default_epoch_unit")]
    pub epoch_unit: TimeUnit,
}

impl CastConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CastError> {
        Ok(serde_json::from_str(json)?)
    }
}

// Default implementation to make constructing the config easier.
impl Default for CastConfig {
    fn default() -> Self {
        Self {
            inference_sample_size: default_inference_sample_size(),
            rtol: default_rtol(),
            atol: default_atol(),
            datetime_formats: default_datetime_formats(),
            epoch_unit: default_epoch_unit(),
        }
    }
}

/// Helper for `serde` to provide a default for `inference_sample_size`.
fn default_inference_sample_size() -> usize {
    3
}

fn default_rtol() -> f64 {
    1e-5
}

fn default_atol() -> f64 {
    1e-8
}

fn default_datetime_formats() -> Vec<String> {
    [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%Y%m%d",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_epoch_unit() -> TimeUnit {
    TimeUnit::Nanosecond
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = CastConfig::from_json("{}").unwrap();
        assert_eq!(config, CastConfig::default());
        assert_eq!(config.inference_sample_size, 3);
        assert_eq!(config.epoch_unit, TimeUnit::Nanosecond);
    }

    #[test]
    fn test_partial_json_overrides() {
        let config =
            CastConfig::from_json(r#"{"inference_sample_size": 10, "epoch_unit": "Second"}"#)
                .unwrap();
        assert_eq!(config.inference_sample_size, 10);
        assert_eq!(config.epoch_unit, TimeUnit::Second);
        assert_eq!(config.rtol, 1e-5);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            CastConfig::from_json("{not json"),
            Err(CastError::SerdeJson(_))
        ));
    }
}
