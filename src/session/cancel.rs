//! Per-session cancellation signal.
//!
//! One `Cancellation` lives in each [`SessionState`](super::SessionState).
//! Any party may trigger it; the first [`EndReason`] wins and later calls
//! are no-ops. Every pending waiter is woken at once, so the mixer and the
//! mailbox loop leave their tick sleeps immediately instead of at the next
//! tick.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;
use core::time::Duration;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::waitqueue::MultiWakerRegistration;
use futures_lite::future;
use log::debug;

use super::EndReason;

/// Distinct tasks that may wait on one signal at the same time.
const MAX_WAITERS: usize = 4;

struct Inner {
    reason: Option<EndReason>,
    waiters: MultiWakerRegistration<MAX_WAITERS>,
}

/// Idempotent, multi-waiter cancellation flag.
pub struct Cancellation {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner>>,
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                reason: None,
                waiters: MultiWakerRegistration::new(),
            })),
        }
    }

    /// Trigger the signal. Returns `true` only for the call that actually
    /// cancelled; the first reason is kept.
    pub fn cancel(&self, reason: EndReason) -> bool {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if inner.reason.is_some() {
                return false;
            }
            debug!("Session cancelled: {}", reason);
            inner.reason = Some(reason);
            inner.waiters.wake();
            true
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Why the session was cancelled, if it was.
    pub fn reason(&self) -> Option<EndReason> {
        self.inner.lock(|cell| cell.borrow().reason)
    }

    /// Resolve once the signal fires.
    pub async fn cancelled(&self) -> EndReason {
        poll_fn(|cx| {
            self.inner.lock(|cell| {
                let mut inner = cell.borrow_mut();
                match inner.reason {
                    Some(reason) => Poll::Ready(reason),
                    None => {
                        inner.waiters.register(cx.waker());
                        Poll::Pending
                    }
                }
            })
        })
        .await
    }

    /// Sleep for `period` unless cancelled first.
    ///
    /// Returns `true` if the full period elapsed, `false` on cancellation.
    pub async fn sleep(&self, period: Duration) -> bool {
        future::or(
            async {
                self.cancelled().await;
                false
            },
            async {
                async_io_mini::Timer::after(period).await;
                true
            },
        )
        .await
    }
}
