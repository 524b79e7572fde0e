//! Session events.
//!
//! Every asynchronous completion becomes exactly one typed [`Event`],
//! delivered in emission order to all subscribers attached at that moment.
//! There is no replay: a subscriber that attaches after an event fires
//! never sees it.

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::pubsub::{DynSubscriber, PubSubChannel, WaitResult};

use crate::classify::Payload;
use crate::config;
use crate::types::uuid::Uuid;
use crate::Error;

/// An asynchronous completion reported by the session.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The connection to the peripheral is up.
    Connected,
    /// The connection to the peripheral is down.
    Disconnected,
    /// Service discovery completed; the catalog is available.
    ServicesDiscovered,
    /// A characteristic value arrived, from a read completion or an
    /// unsolicited notification.
    DataAvailable {
        /// The value, rendered by the characteristic's policy.
        payload: Payload,
    },
    /// A characteristic write completed.
    DataWritten {
        /// The written value, rendered by the characteristic's policy.
        payload: Payload,
    },
    /// A notification-enabling descriptor write completed.
    NotificationEnabled {
        /// The descriptor that was written.
        descriptor: Uuid,
    },
}

/// The outward notification channel of a session.
pub struct EventBus {
    channel: PubSubChannel<NoopRawMutex, Event, { config::EVENT_QUEUE_SIZE }, { config::EVENT_MAX_SUBSCRIBERS }, 1>,
}

impl EventBus {
    pub(crate) const fn new() -> Self {
        Self {
            channel: PubSubChannel::new(),
        }
    }

    /// Attach a listener. Only events published from this point on are
    /// delivered to it.
    pub fn subscribe(&self) -> Result<EventListener<'_>, Error> {
        match self.channel.dyn_subscriber() {
            Ok(subscriber) => Ok(EventListener { subscriber }),
            Err(_) => Err(Error::SubscriberLimitReached),
        }
    }

    pub(crate) fn publish(&self, event: Event) {
        self.channel.immediate_publisher().publish_immediate(event);
    }
}

/// A subscription to a session's events.
pub struct EventListener<'bus> {
    subscriber: DynSubscriber<'bus, Event>,
}

impl EventListener<'_> {
    /// Wait for the next event.
    pub async fn next(&mut self) -> Event {
        loop {
            if let WaitResult::Message(event) = self.subscriber.next_message().await {
                return event;
            }
        }
    }

    /// The next event if one is already queued.
    pub fn try_next(&mut self) -> Option<Event> {
        loop {
            match self.subscriber.try_next_message() {
                Some(WaitResult::Message(event)) => return Some(event),
                Some(WaitResult::Lagged(_)) => continue,
                None => return None,
            }
        }
    }
}
