//! Airdrop tracking configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Tuning and naming parameters for the airdrop registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirdropConfig {
    /// Default interval between tracker samples (seconds).
    pub cadence_secs: f64,
    /// Weapon type that marks a released paratrooper.
    pub munition_type: String,
    /// Prefix for formation names.
    pub formation_prefix: String,
    /// Speed floor for sizing the impact probe (m/s).
    pub min_probe_speed: f64,
    /// Unit type spawned for each survivor.
    pub unit_type: String,
    /// Static object type used as a stand-in while the burst is open.
    pub placeholder_type: String,
    /// Steepest acceptable landing slope (rise over run). `None` accepts any dry ground.
    pub max_landing_slope: Option<f64>,
}

impl Default for AirdropConfig {
    fn default() -> Self {
        Self {
            cadence_secs: DEFAULT_CADENCE_SECS,
            munition_type: DEFAULT_MUNITION_TYPE.to_string(),
            formation_prefix: DEFAULT_FORMATION_PREFIX.to_string(),
            min_probe_speed: DEFAULT_MIN_PROBE_SPEED,
            unit_type: DEFAULT_UNIT_TYPE.to_string(),
            placeholder_type: DEFAULT_PLACEHOLDER_TYPE.to_string(),
            max_landing_slope: None,
        }
    }
}

impl AirdropConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AirdropConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check that the numeric parameters make sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cadence_secs <= 0.0 || !self.cadence_secs.is_finite() {
            return Err(ConfigError::Invalid {
                field: "cadence_secs",
                reason: "must be a positive number of seconds",
            });
        }
        if self.min_probe_speed <= 0.0 || !self.min_probe_speed.is_finite() {
            return Err(ConfigError::Invalid {
                field: "min_probe_speed",
                reason: "must be positive",
            });
        }
        if let Some(slope) = self.max_landing_slope {
            if slope.is_nan() || slope < 0.0 {
                return Err(ConfigError::Invalid {
                    field: "max_landing_slope",
                    reason: "must not be negative",
                });
            }
        }
        if self.munition_type.is_empty() {
            return Err(ConfigError::Invalid {
                field: "munition_type",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
