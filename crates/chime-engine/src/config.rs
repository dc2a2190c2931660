//! Engine configuration.
//!
//! Tuning knobs load from an optional TOML file and can be overridden
//! per-flag by the binary. Missing keys fall back to defaults, so an
//! empty file and no file behave identically.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_SLOT_CAPACITY: usize = 2;
pub const DEFAULT_MAX_WORKERS: usize = 64;

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// How often each worker rechecks its slots, in milliseconds.
    pub poll_interval_ms: u64,
    /// Alarms per worker before the pool grows. Also each worker's slot
    /// count.
    pub slot_capacity: usize,
    /// Hard ceiling on pool size. Hitting it makes submission fail.
    pub max_workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            slot_capacity: DEFAULT_SLOT_CAPACITY,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reads and validates a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Every knob must be positive; a zero would stall or starve the pool.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroValue {
                field: "poll_interval_ms",
            });
        }
        if self.slot_capacity == 0 {
            return Err(ConfigError::ZeroValue {
                field: "slot_capacity",
            });
        }
        if self.max_workers == 0 {
            return Err(ConfigError::ZeroValue {
                field: "max_workers",
            });
        }
        Ok(())
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config field {field} must be greater than zero")]
    ZeroValue { field: &'static str },
}

// ============================================================================
// Tests
// ============================================================================
