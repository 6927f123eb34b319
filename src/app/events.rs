//! Outbound bridge events.
//!
//! The session controller and discovery loop emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them; the default one writes status lines to
//! the log.

use core::time::Duration;

use crate::error::{LinkError, SourceError};
use crate::session::EndReason;

use super::ports::DeviceHandle;

/// Structured status events emitted by the bridge core.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    // ── Connection ────────────────────────────────────────────
    /// First failed connection attempt (later ones are `ConnectRetry`).
    ConnectFailed { address: String, error: LinkError },

    /// A further failed connection attempt; `attempt` counts from 2.
    ConnectRetry { attempt: u32 },

    /// Connected to the device-control server.
    Connected { address: String },

    /// The device-control server went away. Not recoverable.
    ServerLost,

    // ── Discovery ─────────────────────────────────────────────
    /// Started looking for devices.
    Searching,

    /// A scan could not be started or stopped.
    ScanFailed(LinkError),

    /// A scan window closed with no known devices.
    NoDeviceYet,

    /// The server announced a new device.
    DeviceAdded(DeviceHandle),

    // ── Session ───────────────────────────────────────────────
    /// A session was bound to this device.
    DeviceBound(DeviceHandle),

    /// The bound device was removed by the server.
    DeviceRemoved(DeviceHandle),

    /// The bound device rejected an intensity update.
    SendFailed(LinkError),

    /// The session reached its terminal state.
    SessionEnded(EndReason),

    // ── Mailbox ───────────────────────────────────────────────
    /// The mailbox is prepared and being polled.
    MailboxReady,

    /// The mailbox could not be prepared; the session cannot take commands.
    MailboxUnavailable(SourceError),

    /// A `VIBE` command added a pulse.
    PulseApplied { amount: f64, duration: Duration },

    /// A `STOP` command cleared all pulses.
    PulsesCleared,

    /// The mailbox held a tag the bridge does not understand.
    UnknownCommand(String),
}
