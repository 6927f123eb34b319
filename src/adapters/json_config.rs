//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] over a single JSON document. Every field is
//! range-checked with [`BridgeConfig::validate`] on load and before save;
//! invalid values are rejected, never clamped.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::BridgeConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PULSEBRIDGE_CONFIG";

/// Config file used when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "pulsebridge.json";

pub struct JsonFileConfig {
    path: PathBuf,
}

impl JsonFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use the file named by `PULSEBRIDGE_CONFIG`, or `pulsebridge.json`.
    pub fn from_env() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonFileConfig {
    fn load(&self) -> Result<BridgeConfig, ConfigError> {
        let text = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::IoError(e.to_string()),
        })?;
        let config: BridgeConfig =
            serde_json::from_str(&text).map_err(|e| ConfigError::Corrupted(e.to_string()))?;
        config.validate()?;
        info!("Config: loaded {}", self.path.display());
        Ok(config)
    }

    fn save(&self, config: &BridgeConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        fs::write(&self.path, text).map_err(|e| ConfigError::IoError(e.to_string()))?;
        info!("Config: saved {}", self.path.display());
        Ok(())
    }
}
