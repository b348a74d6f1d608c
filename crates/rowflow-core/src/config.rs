//! Module: config
//! Responsibility: execution tuning knobs shared by every processor.
//! Does not own: per-plan specs (join lookup, post-processing).
//! Boundary: TOML text in, validated `ExecConfig` out.

use crate::error::InternalError;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

pub const DEFAULT_LOOKUP_BATCH_SIZE: usize = 100;
pub const DEFAULT_GROUP_BUFFER_CAPACITY: usize = 64;

///
/// ExecConfig
///
/// Execution configuration. Missing keys fall back to defaults; unknown
/// keys are rejected.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecConfig {
    /// Input rows gathered into one batched lookup by the join reader.
    pub lookup_batch_size: usize,

    /// Initial row capacity reserved for a group accumulator buffer.
    pub group_buffer_capacity: usize,
}

impl ExecConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.lookup_batch_size == 0 {
            return Err(ConfigError::ZeroValue {
                field: "lookup_batch_size",
            });
        }
        if self.group_buffer_capacity == 0 {
            return Err(ConfigError::ZeroValue {
                field: "group_buffer_capacity",
            });
        }

        Ok(())
    }

    #[must_use]
    pub const fn with_lookup_batch_size(mut self, size: usize) -> Self {
        self.lookup_batch_size = size;
        self
    }
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            lookup_batch_size: DEFAULT_LOOKUP_BATCH_SIZE,
            group_buffer_capacity: DEFAULT_GROUP_BUFFER_CAPACITY,
        }
    }
}

///
/// ConfigError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(String),

    #[error("config field '{field}' must be non-zero")]
    ZeroValue { field: &'static str },
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::config_unsupported(err.to_string())
    }
}

///
/// TESTS
///
