//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one status line per [`BridgeEvent`]
//! through the `log` facade, tagged with an upper-case category so the
//! console output can be grepped. Repetitive status goes to `debug`.

use log::{debug, info, warn};

use crate::app::events::BridgeEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`BridgeEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &BridgeEvent) {
        match event {
            BridgeEvent::ConnectFailed { address, error } => {
                warn!("LINK | cannot reach device server at {} ({})", address, error);
                warn!("LINK | is the device server running, or on a different address?");
            }
            BridgeEvent::ConnectRetry { attempt } => {
                debug!("LINK | connect attempt {} failed, retrying", attempt);
            }
            BridgeEvent::Connected { address } => {
                info!("LINK | connected to {}", address);
            }
            BridgeEvent::ServerLost => {
                warn!("LINK | device server disconnected; make sure it is running and restart");
            }
            BridgeEvent::Searching => {
                info!("SCAN | searching for devices..");
            }
            BridgeEvent::ScanFailed(error) => {
                warn!("SCAN | error scanning for devices: {}", error);
            }
            BridgeEvent::NoDeviceYet => {
                debug!("SCAN | no device found yet");
            }
            BridgeEvent::DeviceAdded(device) => {
                info!("SCAN | device connected: {}", device.name);
            }
            BridgeEvent::DeviceBound(device) => {
                info!("SESSION | using device: {}", device.name);
            }
            BridgeEvent::DeviceRemoved(device) => {
                info!("SESSION | device removed: {} (ending session)", device.name);
            }
            BridgeEvent::SendFailed(error) => {
                warn!("SESSION | {} (ending session)", error);
            }
            BridgeEvent::SessionEnded(reason) => {
                info!("SESSION | ended: {}", reason);
            }
            BridgeEvent::MailboxReady => {
                info!("MAILBOX | ready and awaiting addon output..");
            }
            BridgeEvent::MailboxUnavailable(error) => {
                warn!("MAILBOX | {}; is the addon installed in the default folder?", error);
            }
            BridgeEvent::PulseApplied { amount, duration } => {
                info!(
                    "PULSE | +{:.0}% for {:.3}s (stackable)",
                    amount * 100.0,
                    duration.as_secs_f64()
                );
            }
            BridgeEvent::PulsesCleared => {
                info!("PULSE | stopping all devices and clearing pulses");
            }
            BridgeEvent::UnknownCommand(payload) => {
                warn!("MAILBOX | unknown command: {}", payload);
            }
        }
    }
}
