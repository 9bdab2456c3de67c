//! # Event Subscriber
//!
//! Subscription side of the protocol event bus.

use std::pin::Pin;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use crate::events::{EventFilter, ProtocolEvent};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("event bus closed")]
    Closed,
}

/// Subscribing side of a bus.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe to events matching a filter.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

/// Filtered receiver. Dropping it leaves the bus.
pub struct Subscription {
    receiver: broadcast::Receiver<ProtocolEvent>,
    filter: EventFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<ProtocolEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Next matching event, `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<ProtocolEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(RecvError::Closed) => return None,
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "[bus] subscriber fell behind, events lost");
                    continue;
                }
            };
            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Next matching event without waiting.
    pub fn try_recv(&mut self) -> Result<Option<ProtocolEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
                Err(TryRecvError::Lagged(_)) => continue,
            };
            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    /// Every matching event already buffered.
    pub fn drain(&mut self) -> Vec<ProtocolEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = self.try_recv() {
            events.push(event);
        }
        events
    }

    #[must_use]
    pub fn event_filter(&self) -> &EventFilter {
        &self.filter
    }
}

/// `Stream` adapter over a subscription. Lagged gaps are skipped.
pub struct EventStream {
    filter: EventFilter,
    inner: Pin<Box<dyn Stream<Item = ProtocolEvent> + Send>>,
}

impl EventStream {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        let Subscription { receiver, filter } = subscription;
        let matcher = filter.clone();
        let inner = BroadcastStream::new(receiver)
            .filter_map(move |item| item.ok().filter(|event| matcher.matches(event)));
        Self {
            filter,
            inner: Box::pin(inner),
        }
    }

    #[must_use]
    pub fn event_filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = ProtocolEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
