//! Device event hub.
//!
//! Uses an `embassy-sync` pub/sub channel to fan device-link notifications
//! out to every interested task. The link adapter publishes; the discovery
//! loop, the active session and the device announcer each hold their own
//! [`Subscription`], which detaches when dropped.
//!
//! ```text
//!                         ┌──────────────┐──▶ Announcer
//! ┌──────────────┐ event  │              │
//! │ Device link  │──────▶│ EventHub     │──▶ Discovery (while scanning)
//! │ (adapter)    │        │ (pub/sub)    │
//! └──────────────┘        │              │──▶ Session (bound device)
//!                         └──────────────┘
//! ```
//!
//! A server disconnect is also latched in a flag, so a consumer that
//! subscribes after the event was published still learns about it.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pubsub::{PubSubChannel, Subscriber, WaitResult};
use log::debug;

use crate::app::ports::DeviceHandle;
use crate::error::LinkError;

/// Notifications published by the device link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    DeviceAdded(DeviceHandle),
    DeviceRemoved(DeviceHandle),
    ServerDisconnected,
}

/// Events buffered per subscriber before the oldest is overwritten.
const EVENT_DEPTH: usize = 8;

/// Concurrent subscriptions: announcer, discovery, session, one spare.
const MAX_SUBSCRIBERS: usize = 4;

/// Publishers are not counted; adapters publish immediately.
const MAX_PUBLISHERS: usize = 1;

type EventChannel = PubSubChannel<
    CriticalSectionRawMutex,
    LinkEvent,
    EVENT_DEPTH,
    MAX_SUBSCRIBERS,
    MAX_PUBLISHERS,
>;

type EventSubscriber<'a> = Subscriber<
    'a,
    CriticalSectionRawMutex,
    LinkEvent,
    EVENT_DEPTH,
    MAX_SUBSCRIBERS,
    MAX_PUBLISHERS,
>;

/// Process-wide fan-out point for [`LinkEvent`]s.
pub struct DeviceEventHub {
    channel: EventChannel,
    server_lost: AtomicBool,
}

impl Default for DeviceEventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceEventHub {
    pub const fn new() -> Self {
        Self {
            channel: PubSubChannel::new(),
            server_lost: AtomicBool::new(false),
        }
    }

    /// Deliver `event` to every current subscriber without waiting.
    /// A subscriber that has fallen `EVENT_DEPTH` events behind loses the oldest.
    pub fn publish(&self, event: LinkEvent) {
        if event == LinkEvent::ServerDisconnected {
            self.server_lost.store(true, Ordering::Release);
        }
        self.channel.immediate_publisher().publish_immediate(event);
    }

    /// Attach a new subscription. Only events published afterwards are seen.
    pub fn subscribe(&self) -> Result<Subscription<'_>, LinkError> {
        let inner = self
            .channel
            .subscriber()
            .map_err(|_| LinkError::TooManySubscribers)?;
        Ok(Subscription { hub: self, inner })
    }

    /// Whether a `ServerDisconnected` has ever been published.
    pub fn is_server_lost(&self) -> bool {
        self.server_lost.load(Ordering::Acquire)
    }
}

/// One consumer's view of the hub.
pub struct Subscription<'a> {
    hub: &'a DeviceEventHub,
    inner: EventSubscriber<'a>,
}

impl Subscription<'_> {
    /// Wait for the next event.
    pub async fn next(&mut self) -> LinkEvent {
        self.inner.next_message_pure().await
    }

    /// Wait for the next event, or `Err(missed)` when the queue overflowed
    /// and `missed` events were overwritten before this subscriber saw them.
    pub async fn next_or_lagged(&mut self) -> Result<LinkEvent, u64> {
        match self.inner.next_message().await {
            WaitResult::Message(event) => Ok(event),
            WaitResult::Lagged(missed) => Err(missed),
        }
    }

    /// The next event if one is already queued.
    pub fn try_next(&mut self) -> Option<LinkEvent> {
        self.inner.try_next_message_pure()
    }

    /// Resolve once the server is gone, discarding other events meanwhile.
    pub async fn server_lost(&mut self) {
        while !self.hub.is_server_lost() {
            if self.next().await == LinkEvent::ServerDisconnected {
                return;
            }
        }
    }

    pub fn is_server_lost(&self) -> bool {
        self.hub.is_server_lost()
    }

    /// Stop receiving events.
    pub fn detach(self) {
        debug!("Event hub: subscription detached");
    }
}
