//! Intensity mixer.
//!
//! Each tick reduces the session's [`PulseStore`] to one clamped target and
//! forwards it to the bound device, but only when it moved by at least the
//! debounce epsilon since the last successful send. The first tick after a
//! session starts (or after `STOP`) always sends, re-establishing the
//! device's baseline.
//!
//! ```text
//!  PulseStore ──sum_live──▶ clamp(0, max) ──Δ ≥ ε?──▶ DeviceLink::send_intensity
//! ```
//!
//! A send failure is fatal to the session: the mixer cancels it and exits.

use core::time::Duration;
use std::time::Instant;

use log::{debug, warn};

use crate::app::ports::DeviceLink;
use crate::config::BridgeConfig;
use crate::error::LinkError;
use crate::pulses::PulseStore;
use crate::session::{EndReason, SessionState};

/// Mixer tunables, split out of [`BridgeConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixerSettings {
    pub interval: Duration,
    pub max_intensity: f64,
    pub epsilon: f64,
}

impl From<&BridgeConfig> for MixerSettings {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            interval: config.mix_interval(),
            max_intensity: config.max_intensity,
            epsilon: config.debounce_epsilon,
        }
    }
}

/// Clamp a pulse sum into `[0, max_intensity]`. An empty sum (`-0.0`) or a
/// NaN maps to a plain `0.0`.
pub fn mix_target(sum: f64, max_intensity: f64) -> f64 {
    if sum > 0.0 { sum.min(max_intensity) } else { 0.0 }
}

/// Debounce rule: always send when nothing has been sent yet, otherwise
/// only when the target moved by at least `epsilon`.
pub fn should_send(last_sent: Option<f64>, target: f64, epsilon: f64) -> bool {
    match last_sent {
        None => true,
        Some(previous) => (target - previous).abs() >= epsilon,
    }
}

/// Periodic reducer bound to one session.
pub struct Mixer<'s, L> {
    link: &'s L,
    store: &'s PulseStore,
    state: &'s SessionState,
    settings: MixerSettings,
}

impl<'s, L: DeviceLink> Mixer<'s, L> {
    pub fn new(
        link: &'s L,
        store: &'s PulseStore,
        state: &'s SessionState,
        settings: MixerSettings,
    ) -> Self {
        Self {
            link,
            store,
            state,
            settings,
        }
    }

    /// Run one tick at `now`.
    ///
    /// Returns the value sent, `None` when debounced (or the session is
    /// already cancelled), or the link error that made the send fail.
    pub async fn tick(&self, now: Instant) -> Result<Option<f64>, LinkError> {
        let sum = self.store.sum_live(now);
        let target = mix_target(sum, self.settings.max_intensity);

        if !should_send(self.state.last_sent(), target, self.settings.epsilon) {
            return Ok(None);
        }
        if self.state.cancellation().is_cancelled() {
            return Ok(None);
        }

        self.link.send_intensity(self.state.device(), target).await?;
        self.state.record_sent(target);
        debug!(
            "Mixer: '{}' -> {:.2} (sum {:.2})",
            self.state.device().name,
            target,
            sum
        );
        Ok(Some(target))
    }

    /// Tick until the session is cancelled or a send fails.
    ///
    /// On send failure the session is cancelled with
    /// [`EndReason::SendFailed`] and the error is returned. Cancellation
    /// from elsewhere ends the loop without a final send.
    pub async fn run(&self) -> Result<(), LinkError> {
        let cancel = self.state.cancellation();
        while !cancel.is_cancelled() {
            if let Err(e) = self.tick(Instant::now()).await {
                warn!("Mixer: send to '{}' failed: {}", self.state.device().name, e);
                cancel.cancel(EndReason::SendFailed);
                return Err(e);
            }
            if !cancel.sleep(self.settings.interval).await {
                break;
            }
        }
        debug!("Mixer: stopped");
        Ok(())
    }
}
