//! # Event Publisher
//!
//! Publishing side of the protocol event bus.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::events::{EventFilter, EventTopic, ProtocolEvent};
use crate::subscriber::{EventStream, EventSubscriber, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;

/// Interface roles use to emit events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event. Returns the number of subscribers that got it.
    async fn publish(&self, event: ProtocolEvent) -> usize;

    /// Total number of events published.
    fn events_published(&self) -> u64;
}

/// In-process bus on `tokio::sync::broadcast`.
///
/// Events are delivered to every receiver and filtered on receipt, so a
/// run with nobody listening still counts what was published per topic.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<ProtocolEvent>,
    published: RwLock<HashMap<EventTopic, u64>>,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Stream of matching events.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Events published on `topic` so far. `EventTopic::All` sums every topic.
    #[must_use]
    pub fn published_on(&self, topic: EventTopic) -> u64 {
        let published = self.published.read();
        match topic {
            EventTopic::All => published.values().sum(),
            topic => published.get(&topic).copied().unwrap_or(0),
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, side = ?filter.side, "[bus] subscription opened");
        Subscription::new(self.sender.subscribe(), filter)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: ProtocolEvent) -> usize {
        let topic = event.topic();
        *self.published.write().entry(topic).or_insert(0) += 1;

        // Err only means nobody is listening.
        let receivers = self.sender.send(event).unwrap_or(0);
        trace!(?topic, receivers, "[bus] event published");
        receivers
    }

    fn events_published(&self) -> u64 {
        self.published_on(EventTopic::All)
    }
}
