//! Engine-wide runtime settings.

use std::path::Path;

use grainflow_core::CompileOrder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::file::{load_toml, save_toml};
use crate::validation::validate_engine_config;

/// Node placement order, as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileOrderConfig {
    /// Authoring insertion order.
    #[default]
    Insertion,
    /// Dependency order; nodes in cycles are not compiled.
    Topological,
}

impl From<CompileOrderConfig> for CompileOrder {
    fn from(order: CompileOrderConfig) -> Self {
        match order {
            CompileOrderConfig::Insertion => CompileOrder::Insertion,
            CompileOrderConfig::Topological => CompileOrder::Topological,
        }
    }
}

/// Engine settings.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// block_size = 256
/// arena_capacity = 2048
/// compile_order = "topological"
/// subscription_interval_blocks = 8
/// ```
///
/// Every key is optional; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per render callback.
    pub block_size: usize,
    /// Node state budget in bytes.
    pub arena_capacity: usize,
    /// Node placement order used when compiling graphs.
    pub compile_order: CompileOrderConfig,
    /// Blocks between node state snapshots sent to subscribers.
    pub subscription_interval_blocks: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 256,
            arena_capacity: 2048,
            compile_order: CompileOrderConfig::Insertion,
            subscription_interval_blocks: 8,
        }
    }
}

impl EngineConfig {
    /// Load a config from a TOML file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = load_toml(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from a TOML string and validate it.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the config to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        save_toml(path.as_ref(), self)
    }

    /// Convert the config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every setting against its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(validate_engine_config(self)?)
    }

    /// Sample rate as `f32`, the form the DSP code takes.
    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate as f32
    }
}
