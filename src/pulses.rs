//! Timed intensity pulses and the store the mixer reduces them from.
//!
//! ```text
//!  CommandLoop ──add/clear──▶ ┌────────────┐ ──sum_live(now)──▶ Mixer
//!                             │ PulseStore │
//!                             └────────────┘
//! ```
//!
//! Every operation runs inside one blocking-mutex critical section, so a
//! mixer tick prunes and sums a consistent snapshot: a pulse added or
//! cleared concurrently is either fully in the tick or fully out of it.

use core::cell::RefCell;
use core::time::Duration;
use std::time::Instant;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// One timed contribution to output intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    amount: f64,
    expires_at: Instant,
}

impl Pulse {
    /// A pulse of `amount` (clamped to 0–1) that stops counting at `expires_at`.
    pub fn new(amount: f64, expires_at: Instant) -> Self {
        let amount = if amount.is_finite() { amount.clamp(0.0, 1.0) } else { 0.0 };
        Self { amount, expires_at }
    }

    /// A pulse that starts at `now` and lasts `duration`.
    pub fn starting_at(now: Instant, amount: f64, duration: Duration) -> Self {
        Self::new(amount, now + duration)
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Expired pulses never contribute, including at the exact expiry instant.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Live pulses of one session.
pub struct PulseStore {
    pulses: Mutex<CriticalSectionRawMutex, RefCell<Vec<Pulse>>>,
}

impl Default for PulseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseStore {
    pub const fn new() -> Self {
        Self {
            pulses: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    pub fn add(&self, pulse: Pulse) {
        self.pulses.lock(|p| p.borrow_mut().push(pulse));
    }

    pub fn clear(&self) {
        self.pulses.lock(|p| p.borrow_mut().clear());
    }

    /// Drop every pulse expired at `now`, then sum what is left.
    pub fn sum_live(&self, now: Instant) -> f64 {
        self.pulses.lock(|p| {
            let mut pulses = p.borrow_mut();
            pulses.retain(|pulse| !pulse.is_expired(now));
            pulses.iter().map(Pulse::amount).sum()
        })
    }

    /// Stored pulses, including any that expired since the last prune.
    pub fn len(&self) -> usize {
        self.pulses.lock(|p| p.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
