//! Error types for the bridge's outward-facing ports.
//!
//! Each collaborator reports failures through its own small enum with a
//! hand-written `Display`, keeping the session and discovery loops'
//! error handling uniform: they match on the variant, never on a string.

use core::fmt;

// ---------------------------------------------------------------------------
// Device link errors
// ---------------------------------------------------------------------------

/// Failures reported by a [`DeviceLink`](crate::app::ports::DeviceLink).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The device-control server could not be reached.
    ConnectFailed(String),
    /// A scan could not be started or stopped.
    ScanFailed(String),
    /// The device rejected or never acknowledged an intensity command.
    SendFailed(String),
    /// The addressed device is no longer known to the server.
    DeviceGone,
    /// The connection to the device-control server has been lost.
    Disconnected,
    /// The device event hub has no free subscription slot.
    TooManySubscribers,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed(msg) => write!(f, "connect failed: {msg}"),
            Self::ScanFailed(msg) => write!(f, "scan failed: {msg}"),
            Self::SendFailed(msg) => write!(f, "send failed: {msg}"),
            Self::DeviceGone => write!(f, "device no longer available"),
            Self::Disconnected => write!(f, "server disconnected"),
            Self::TooManySubscribers => write!(f, "device event hub is full"),
        }
    }
}

impl std::error::Error for LinkError {}

// ---------------------------------------------------------------------------
// Command source errors
// ---------------------------------------------------------------------------

/// Failures reported by a [`CommandSource`](crate::app::ports::CommandSource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The mailbox could not be read this cycle (locked, mid-write, absent).
    Unavailable(String),
    /// The directory the mailbox lives in does not exist.
    MissingDirectory(String),
    /// The mailbox could not be written.
    Io(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "mailbox unavailable: {msg}"),
            Self::MissingDirectory(dir) => write!(f, "mailbox directory not found: {dir}"),
            Self::Io(msg) => write!(f, "mailbox I/O error: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}
