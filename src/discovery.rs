//! Discovery loop: connect, scan until a device is known, run a session,
//! scan again.
//!
//! ```text
//!  connect ──(retry)──▶ scan window ──none──▶ pause ──┐
//!                          ▲    │                     │
//!                          │    └──device──▶ Session  │
//!                          └───────────────────┴──────┘
//! ```
//!
//! The loop never ends on device loss. It only returns once the
//! device-control server is gone, after the active session has been torn
//! down.

use core::convert::Infallible;
use core::time::Duration;

use futures_lite::future;
use log::{debug, info};

use crate::app::events::BridgeEvent;
use crate::app::ports::{CommandSource, DeviceHandle, DeviceLink, EventSink};
use crate::channels::{DeviceEventHub, LinkEvent, Subscription};
use crate::config::BridgeConfig;
use crate::error::LinkError;
use crate::session::{EndReason, Session};

/// Failed connection attempts since the last success.
#[derive(Debug, Default)]
struct ConnectAttempts {
    failures: u32,
}

impl ConnectAttempts {
    /// Record a failure; returns the attempt number (1-based).
    fn record_failure(&mut self) -> u32 {
        self.failures = self.failures.saturating_add(1);
        self.failures
    }

    /// Whether the connect error has already been reported in full.
    fn error_shown(&self) -> bool {
        self.failures > 1
    }
}

pub struct Discovery<'a, L, S, E> {
    link: &'a L,
    source: &'a S,
    sink: &'a E,
    hub: &'a DeviceEventHub,
    config: &'a BridgeConfig,
}

impl<'a, L, S, E> Discovery<'a, L, S, E>
where
    L: DeviceLink,
    S: CommandSource,
    E: EventSink,
{
    pub fn new(
        link: &'a L,
        source: &'a S,
        sink: &'a E,
        hub: &'a DeviceEventHub,
        config: &'a BridgeConfig,
    ) -> Self {
        Self {
            link,
            source,
            sink,
            hub,
            config,
        }
    }

    /// Run until the server disconnects.
    ///
    /// Only ever returns an error: [`LinkError::Disconnected`] when the
    /// server went away, or [`LinkError::TooManySubscribers`] if the event
    /// hub is misconfigured.
    pub async fn run(&self) -> Result<Infallible, LinkError> {
        self.connect().await;

        loop {
            let (device, subscription) = match self.wait_for_device().await {
                Ok(found) => found,
                Err(LinkError::Disconnected) => return Err(self.server_lost()),
                Err(e) => return Err(e),
            };

            let session = Session::new(
                self.link,
                self.source,
                self.sink,
                device,
                subscription,
                self.config,
            );
            let reason = session.run().await;

            if reason == EndReason::ServerLost || self.hub.is_server_lost() {
                return Err(self.server_lost());
            }
            info!("Discovery: session ended ({}), returning to device search", reason);
        }
    }

    /// Connect, retrying forever. The first failure is reported in full,
    /// later ones only by attempt number.
    pub async fn connect(&self) {
        let address = self.config.server_address.as_str();
        let mut attempts = ConnectAttempts::default();

        loop {
            match self.link.connect(address).await {
                Ok(()) => {
                    self.sink.emit(&BridgeEvent::Connected {
                        address: address.to_string(),
                    });
                    return;
                }
                Err(error) => {
                    let attempt = attempts.record_failure();
                    if attempts.error_shown() {
                        self.sink.emit(&BridgeEvent::ConnectRetry { attempt });
                    } else {
                        self.sink.emit(&BridgeEvent::ConnectFailed {
                            address: address.to_string(),
                            error,
                        });
                    }
                    async_io_mini::Timer::after(self.config.connect_retry_delay()).await;
                }
            }
        }
    }

    /// Scan until the server knows at least one device.
    ///
    /// The returned subscription was attached before the device list was
    /// read, so the session it is handed to cannot miss that device's
    /// removal.
    pub async fn wait_for_device(&self) -> Result<(DeviceHandle, Subscription<'a>), LinkError> {
        let mut subscription = self.hub.subscribe()?;
        self.sink.emit(&BridgeEvent::Searching);

        loop {
            let scanned = self.scan_window(&mut subscription).await;
            if subscription.is_server_lost() {
                subscription.detach();
                return Err(LinkError::Disconnected);
            }

            if let Err(e) = scanned {
                self.sink.emit(&BridgeEvent::ScanFailed(e));
                if !pause(&mut subscription, self.config.scan_retry_delay()).await {
                    subscription.detach();
                    return Err(LinkError::Disconnected);
                }
                continue;
            }

            // Anything queued so far is already reflected in the device list.
            while let Some(event) = subscription.try_next() {
                debug!("Discovery: drained {:?}", event);
            }
            if let Some(device) = self.link.known_devices().into_iter().next() {
                return Ok((device, subscription));
            }

            self.sink.emit(&BridgeEvent::NoDeviceYet);
            if !pause(&mut subscription, self.config.scan_retry_delay()).await {
                subscription.detach();
                return Err(LinkError::Disconnected);
            }
        }
    }

    /// One start-scan / wait / stop-scan cycle.
    async fn scan_window(&self, subscription: &mut Subscription<'_>) -> Result<(), LinkError> {
        self.link.start_scan().await?;
        pause(subscription, self.config.scan_window()).await;
        self.link.stop_scan().await
    }

    fn server_lost(&self) -> LinkError {
        self.sink.emit(&BridgeEvent::ServerLost);
        LinkError::Disconnected
    }
}

/// Wait `period`, or less if the server disconnects first.
///
/// Returns `true` if the full period elapsed.
async fn pause(subscription: &mut Subscription<'_>, period: Duration) -> bool {
    future::or(
        async {
            subscription.server_lost().await;
            false
        },
        async {
            async_io_mini::Timer::after(period).await;
            true
        },
    )
    .await
}

/// Report every device the server announces, for as long as it is up.
///
/// Runs for the lifetime of the process alongside the discovery loop. The
/// subscription is taken by the caller so no announcement published before
/// the task is first polled is lost.
pub async fn announce_devices<E: EventSink>(mut subscription: Subscription<'_>, sink: &E) {
    loop {
        match subscription.next().await {
            LinkEvent::DeviceAdded(device) => sink.emit(&BridgeEvent::DeviceAdded(device)),
            LinkEvent::DeviceRemoved(device) => debug!("Announcer: '{}' removed", device),
            LinkEvent::ServerDisconnected => {
                debug!("Announcer: server gone, stopping");
                subscription.detach();
                return;
            }
        }
    }
}
