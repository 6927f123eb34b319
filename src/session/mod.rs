//! Session controller: the lifetime of one bound device.
//!
//! ```text
//!            ┌──────────── Bound ─────────────┐
//!            │  Mixer ∥ CommandLoop ∥ Watch   │
//!            └───────────────┬────────────────┘
//!     removal · send failure · loop end · server lost · shutdown
//!                            ▼
//!                      Terminating ── await loops, StopAll, detach
//!                            ▼
//!                        Terminal ──▶ EndReason to the discovery loop
//! ```
//!
//! The three loops are polled concurrently on the caller's task and joined,
//! so teardown always waits for the mixer before stopping the device.

mod cancel;
mod command_loop;

use core::cell::Cell;
use core::fmt;

use futures_lite::future;
use log::{debug, info, warn};

use crate::app::events::BridgeEvent;
use crate::app::ports::{CommandSource, DeviceHandle, DeviceLink, EventSink};
use crate::channels::{LinkEvent, Subscription};
use crate::config::BridgeConfig;
use crate::mixer::{Mixer, MixerSettings};
use crate::pulses::PulseStore;

pub use cancel::Cancellation;
pub use command_loop::CommandLoop;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The server removed the bound device.
    DeviceRemoved,
    /// An intensity update to the bound device failed.
    SendFailed,
    /// The command loop ended, e.g. because the mailbox was unavailable.
    CommandsStopped,
    /// The device-control server disconnected.
    ServerLost,
    /// The owner asked the session to end.
    Shutdown,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceRemoved => write!(f, "device removed"),
            Self::SendFailed => write!(f, "send failed"),
            Self::CommandsStopped => write!(f, "command loop stopped"),
            Self::ServerLost => write!(f, "server lost"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Bound,
    Terminating,
    Terminal,
}

/// Mutable state shared by the loops of one session.
pub struct SessionState {
    device: DeviceHandle,
    last_sent: Cell<Option<f64>>,
    cancellation: Cancellation,
}

impl SessionState {
    pub fn new(device: DeviceHandle) -> Self {
        Self {
            device,
            last_sent: Cell::new(None),
            cancellation: Cancellation::new(),
        }
    }

    pub fn device(&self) -> &DeviceHandle {
        &self.device
    }

    /// Intensity most recently accepted by the device, unset until the
    /// first successful send.
    pub fn last_sent(&self) -> Option<f64> {
        self.last_sent.get()
    }

    pub fn record_sent(&self, value: f64) {
        self.last_sent.set(Some(value));
    }

    /// Forget the last value so the next mixer tick sends unconditionally.
    pub fn reset_last_sent(&self) {
        self.last_sent.set(None);
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }
}

/// One bound device, from binding to teardown.
pub struct Session<'a, L, S, E> {
    link: &'a L,
    source: &'a S,
    sink: &'a E,
    config: &'a BridgeConfig,
    subscription: Cell<Option<Subscription<'a>>>,
    state: SessionState,
    store: PulseStore,
    phase: Cell<SessionPhase>,
}

impl<'a, L, S, E> Session<'a, L, S, E>
where
    L: DeviceLink,
    S: CommandSource,
    E: EventSink,
{
    /// Bind a session to `device`. `subscription` must have been attached
    /// before the device was chosen so no removal is missed.
    pub fn new(
        link: &'a L,
        source: &'a S,
        sink: &'a E,
        device: DeviceHandle,
        subscription: Subscription<'a>,
        config: &'a BridgeConfig,
    ) -> Self {
        Self {
            link,
            source,
            sink,
            config,
            subscription: Cell::new(Some(subscription)),
            state: SessionState::new(device),
            store: PulseStore::new(),
            phase: Cell::new(SessionPhase::Bound),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn store(&self) -> &PulseStore {
        &self.store
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase.get()
    }

    /// Ask the session to end. Idempotent; returns `true` on the first call
    /// that actually cancelled.
    pub fn shutdown(&self) -> bool {
        self.state.cancellation().cancel(EndReason::Shutdown)
    }

    /// Drive the session to its terminal state.
    pub async fn run(&self) -> EndReason {
        let device = self.state.device().clone();
        info!("Session '{}': bound", device);
        self.sink.emit(&BridgeEvent::DeviceBound(device.clone()));

        let subscription = self.subscription.take();

        let mixer = Mixer::new(
            self.link,
            &self.store,
            &self.state,
            MixerSettings::from(self.config),
        );
        let commands = CommandLoop::new(
            self.link,
            self.source,
            self.sink,
            &self.store,
            &self.state,
            self.config.poll_interval(),
        );

        let ((mixed, ()), subscription) = future::zip(
            future::zip(
                async {
                    let result = mixer.run().await;
                    if let Err(e) = &result {
                        self.sink.emit(&BridgeEvent::SendFailed(e.clone()));
                    }
                    result
                },
                async {
                    if let Err(e) = commands.run().await {
                        debug!("Session '{}': command loop ended: {}", device, e);
                    }
                    self.state.cancellation().cancel(EndReason::CommandsStopped);
                },
            ),
            self.watch(subscription),
        )
        .await;
        self.enter(SessionPhase::Terminating);

        if mixed.is_err() {
            debug!("Session '{}': mixer ended on send failure", device);
        }
        if let Err(e) = self.link.stop_all().await {
            warn!("Session '{}': stop-all during teardown failed: {}", device, e);
        }
        self.store.clear();
        if let Some(subscription) = subscription {
            subscription.detach();
        }

        let reason = self
            .state
            .cancellation()
            .reason()
            .unwrap_or(EndReason::Shutdown);
        self.enter(SessionPhase::Terminal);
        info!("Session '{}': ended ({})", device, reason);
        self.sink.emit(&BridgeEvent::SessionEnded(reason));
        reason
    }

    /// Watch the device-event subscription until the session is cancelled,
    /// cancelling it on removal of the bound device or loss of the server.
    /// Hands the subscription back for teardown.
    async fn watch(&self, subscription: Option<Subscription<'a>>) -> Option<Subscription<'a>> {
        let mut subscription = subscription?;
        let cancel = self.state.cancellation();
        future::or(
            async {
                cancel.cancelled().await;
            },
            async {
                if subscription.is_server_lost() {
                    cancel.cancel(EndReason::ServerLost);
                    return;
                }
                loop {
                    let event = match subscription.next_or_lagged().await {
                        Ok(event) => event,
                        Err(missed) => {
                            warn!("Session: {} device events overwritten", missed);
                            if let Some(reason) = self.recheck_after_lag(&subscription) {
                                cancel.cancel(reason);
                                return;
                            }
                            continue;
                        }
                    };
                    match event {
                        LinkEvent::DeviceRemoved(removed)
                            if removed.same_device(self.state.device()) =>
                        {
                            self.sink.emit(&BridgeEvent::DeviceRemoved(removed));
                            cancel.cancel(EndReason::DeviceRemoved);
                            return;
                        }
                        LinkEvent::DeviceRemoved(other) => {
                            debug!("Session: ignoring removal of unbound '{}'", other);
                        }
                        LinkEvent::ServerDisconnected => {
                            cancel.cancel(EndReason::ServerLost);
                            return;
                        }
                        LinkEvent::DeviceAdded(_) => {}
                    }
                }
            },
        )
        .await;
        Some(subscription)
    }

    /// After missed events, read the link's state directly: a latched
    /// disconnect or a bound device no longer listed ends the session.
    fn recheck_after_lag(&self, subscription: &Subscription<'a>) -> Option<EndReason> {
        if subscription.is_server_lost() {
            return Some(EndReason::ServerLost);
        }
        let device = self.state.device();
        if self.link.known_devices().iter().any(|d| d.same_device(device)) {
            return None;
        }
        self.sink.emit(&BridgeEvent::DeviceRemoved(device.clone()));
        Some(EndReason::DeviceRemoved)
    }

    fn enter(&self, next: SessionPhase) {
        let current = self.phase.replace(next);
        if current != next {
            info!(
                "Session '{}': {:?} -> {:?}",
                self.state.device().name,
                current,
                next
            );
        }
    }
}
