//! Port traits: the hexagonal boundary between the bridge core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Session / Discovery (domain)
//! ```
//!
//! Driven adapters (device transport, mailbox, status output, config file)
//! implement these traits. The session controller and discovery loop consume
//! them via generics, so the core never touches a socket or a file directly.
//!
//! All ports take `&self`: within a session the mixer and the command loop
//! drive the same link concurrently, so adapters use interior mutability.

use core::fmt;

use crate::config::BridgeConfig;
use crate::error::{LinkError, SourceError};

// ───────────────────────────────────────────────────────────────
// Device identity
// ───────────────────────────────────────────────────────────────

/// A device known to the device-control server.
///
/// Identity is the server-assigned `index`; `name` is for display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    pub index: u32,
    pub name: String,
}

impl DeviceHandle {
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }

    /// Whether `other` refers to the same physical device.
    pub fn same_device(&self, other: &DeviceHandle) -> bool {
        self.index == other.index
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.index)
    }
}

// ───────────────────────────────────────────────────────────────
// Device link port (driven adapter: domain → device-control server)
// ───────────────────────────────────────────────────────────────

/// Write-side port to the device-control server.
///
/// Device-added / device-removed / server-disconnected notifications are not
/// part of this trait; adapters publish them on the
/// [`DeviceEventHub`](crate::channels::DeviceEventHub).
#[allow(async_fn_in_trait)]
pub trait DeviceLink {
    /// Connect to the server. Retryable.
    async fn connect(&self, address: &str) -> Result<(), LinkError>;

    /// Begin scanning for devices.
    async fn start_scan(&self) -> Result<(), LinkError>;

    /// End the current scan.
    async fn stop_scan(&self) -> Result<(), LinkError>;

    /// Devices currently known to the server, in server order.
    fn known_devices(&self) -> Vec<DeviceHandle>;

    /// Drive `device` at `value` (0–1).
    async fn send_intensity(&self, device: &DeviceHandle, value: f64) -> Result<(), LinkError>;

    /// Stop every output on every device. Callers treat this as best-effort.
    async fn stop_all(&self) -> Result<(), LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Command source port (driven adapter: mailbox → domain)
// ───────────────────────────────────────────────────────────────

/// The polled inbox through which timed commands arrive.
pub trait CommandSource {
    /// Make the inbox ready for polling and discard any stale payload.
    fn prepare(&self) -> Result<(), SourceError>;

    /// Current raw payload; an empty string means "no command".
    fn poll(&self) -> Result<String, SourceError>;

    /// Overwrite the inbox with nothing so a payload is not processed twice.
    fn clear(&self) -> Result<(), SourceError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → status output)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`BridgeEvent`](super::events::BridgeEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&self, event: &super::events::BridgeEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ config file)
// ───────────────────────────────────────────────────────────────

/// Loads and persists bridge configuration.
///
/// Implementations MUST validate with [`BridgeConfig::validate`] on both
/// load and save; invalid ranges are rejected, never silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    fn load(&self) -> Result<BridgeConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &BridgeConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No config file exists (first run).
    NotFound,
    /// Stored config could not be parsed.
    Corrupted(String),
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted(msg) => write!(f, "config corrupted: {}", msg),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
