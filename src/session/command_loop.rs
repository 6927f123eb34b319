//! Mailbox polling loop of a session.
//!
//! Polls the [`CommandSource`] at a fixed period, decodes whatever it finds
//! and applies it to the session's pulse store. A processed payload is
//! always cleared from the source; a blank one is left alone.

use core::time::Duration;
use std::time::Instant;

use log::{debug, warn};

use crate::app::commands::{self, Command};
use crate::app::events::BridgeEvent;
use crate::app::ports::{CommandSource, DeviceLink, EventSink};
use crate::error::SourceError;
use crate::pulses::{Pulse, PulseStore};

use super::SessionState;

pub struct CommandLoop<'s, L, S, E> {
    link: &'s L,
    source: &'s S,
    sink: &'s E,
    store: &'s PulseStore,
    state: &'s SessionState,
    interval: Duration,
}

impl<'s, L, S, E> CommandLoop<'s, L, S, E>
where
    L: DeviceLink,
    S: CommandSource,
    E: EventSink,
{
    pub fn new(
        link: &'s L,
        source: &'s S,
        sink: &'s E,
        store: &'s PulseStore,
        state: &'s SessionState,
        interval: Duration,
    ) -> Self {
        Self {
            link,
            source,
            sink,
            store,
            state,
            interval,
        }
    }

    /// Prepare the source, then poll until the session is cancelled.
    ///
    /// Returns the preparation error if the source never became usable.
    pub async fn run(&self) -> Result<(), SourceError> {
        if let Err(e) = self.source.prepare() {
            warn!("Mailbox: not usable: {}", e);
            self.sink.emit(&BridgeEvent::MailboxUnavailable(e.clone()));
            return Err(e);
        }
        self.sink.emit(&BridgeEvent::MailboxReady);

        let cancel = self.state.cancellation();
        while !cancel.is_cancelled() {
            self.poll_once(Instant::now()).await;
            if !cancel.sleep(self.interval).await {
                break;
            }
        }
        debug!("Mailbox: polling stopped");
        Ok(())
    }

    /// Run one poll cycle at `now` and return the command it applied.
    pub async fn poll_once(&self, now: Instant) -> Option<Command> {
        if self.state.cancellation().is_cancelled() {
            return None;
        }

        let raw = match self.source.poll() {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Mailbox: read failed: {}", e);
                return None;
            }
        };
        if raw.trim().is_empty() {
            return None;
        }

        let command = commands::decode(&raw);
        if let Some(command) = &command {
            self.dispatch(command, now).await;
        }
        if let Err(e) = self.source.clear() {
            debug!("Mailbox: clear failed: {}", e);
        }
        command
    }

    async fn dispatch(&self, command: &Command, now: Instant) {
        debug!("Mailbox: {} received", command.tag());
        match command {
            Command::Vibe { amount, duration } => {
                self.store.add(Pulse::starting_at(now, *amount, *duration));
                self.sink.emit(&BridgeEvent::PulseApplied {
                    amount: *amount,
                    duration: *duration,
                });
            }
            Command::Stop => {
                self.store.clear();
                self.state.reset_last_sent();
                if let Err(e) = self.link.stop_all().await {
                    debug!("Mailbox: stop-all failed: {}", e);
                }
                self.sink.emit(&BridgeEvent::PulsesCleared);
            }
            Command::Conf(args) => {
                debug!("Mailbox: CONF ignored ({} args)", args.len());
            }
            Command::Unknown(payload) => {
                self.sink.emit(&BridgeEvent::UnknownCommand(payload.clone()));
            }
        }
    }
}
