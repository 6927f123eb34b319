//! Bridge configuration parameters
//!
//! All tunable parameters for the bridge. Values are read from a JSON file
//! through a [`ConfigPort`](crate::app::ports::ConfigPort); any field that is
//! missing from the file keeps its default.

use core::time::Duration;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Mailbox file name written by the game addon.
pub const MAILBOX_FILE_NAME: &str = "aac-av-mailbox.txt";

/// Core bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    // --- Device link ---
    /// Address of the device-control server
    pub server_address: String,
    /// Upper bound for the intensity sent to the device (0-1]
    pub max_intensity: f64,

    // --- Mixer ---
    /// Mixer tick period (milliseconds)
    pub mix_interval_ms: u64,
    /// Minimum intensity change that triggers a new send
    pub debounce_epsilon: f64,

    // --- Mailbox ---
    /// Mailbox poll period (milliseconds)
    pub poll_interval_ms: u64,
    /// Explicit mailbox location; `None` uses the addon's default folder
    pub mailbox_path: Option<PathBuf>,

    // --- Discovery ---
    /// How long each scan runs before the device list is inspected (milliseconds)
    pub scan_window_ms: u64,
    /// Pause between scans that found nothing (milliseconds)
    pub scan_retry_delay_ms: u64,
    /// Pause between failed connection attempts (milliseconds)
    pub connect_retry_delay_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            // Device link
            server_address: "ws://127.0.0.1:12345".into(),
            max_intensity: 1.0,

            // Mixer
            mix_interval_ms: 50, // 20 Hz
            debounce_epsilon: 0.01,

            // Mailbox
            poll_interval_ms: 20, // 50 Hz
            mailbox_path: None,

            // Discovery
            scan_window_ms: 2000,
            scan_retry_delay_ms: 1000,
            connect_retry_delay_ms: 1000,
        }
    }
}

impl BridgeConfig {
    /// Range-check every field. Out-of-range values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_address.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("server_address must not be empty"));
        }
        if !(self.max_intensity > 0.0 && self.max_intensity <= 1.0) {
            return Err(ConfigError::ValidationFailed("max_intensity must be in (0, 1]"));
        }
        if !(0.0..=0.5).contains(&self.debounce_epsilon) {
            return Err(ConfigError::ValidationFailed("debounce_epsilon must be in [0, 0.5]"));
        }
        if !(5..=1000).contains(&self.mix_interval_ms) {
            return Err(ConfigError::ValidationFailed("mix_interval_ms must be 5-1000"));
        }
        if !(5..=1000).contains(&self.poll_interval_ms) {
            return Err(ConfigError::ValidationFailed("poll_interval_ms must be 5-1000"));
        }
        if !(100..=60_000).contains(&self.scan_window_ms) {
            return Err(ConfigError::ValidationFailed("scan_window_ms must be 100-60000"));
        }
        if !(10..=60_000).contains(&self.scan_retry_delay_ms) {
            return Err(ConfigError::ValidationFailed("scan_retry_delay_ms must be 10-60000"));
        }
        if !(10..=60_000).contains(&self.connect_retry_delay_ms) {
            return Err(ConfigError::ValidationFailed("connect_retry_delay_ms must be 10-60000"));
        }
        Ok(())
    }

    pub fn mix_interval(&self) -> Duration {
        Duration::from_millis(self.mix_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn scan_window(&self) -> Duration {
        Duration::from_millis(self.scan_window_ms)
    }

    pub fn scan_retry_delay(&self) -> Duration {
        Duration::from_millis(self.scan_retry_delay_ms)
    }

    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_millis(self.connect_retry_delay_ms)
    }

    /// The configured mailbox path, or the addon's default location.
    pub fn resolved_mailbox_path(&self) -> PathBuf {
        self.mailbox_path
            .clone()
            .unwrap_or_else(default_mailbox_path)
    }
}

/// `<home>/Documents/AAClassic/Addon/auto_vibrator/aac-av-mailbox.txt`
///
/// Falls back to the working directory when no home directory is known.
pub fn default_mailbox_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_default();
    home.join("Documents")
        .join("AAClassic")
        .join("Addon")
        .join("auto_vibrator")
        .join(MAILBOX_FILE_NAME)
}
