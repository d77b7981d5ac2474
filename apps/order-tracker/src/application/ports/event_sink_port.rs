//! Event Sink Port (Driven Port)
//!
//! Interface for delivering market events to subscribers.

use std::sync::{Mutex, PoisonError};

use crate::domain::order_tracking::events::{MarketEvent, MarketEventTag};

/// Failure reported by an event listener.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListenerError {
    /// Listener could not handle the event.
    #[error("Listener '{listener}' failed to handle {event}: {message}")]
    HandlerFailed {
        /// Listener name.
        listener: String,
        /// Event type.
        event: MarketEventTag,
        /// Failure description.
        message: String,
    },
}

/// Port for publishing market events.
///
/// Delivery is synchronous. Implementations must not let subscriber
/// failures propagate to the caller.
pub trait EventSink: Send + Sync {
    /// Publish a single event.
    fn publish(&self, event: &MarketEvent);

    /// Publish events in order.
    fn publish_all(&self, events: &[MarketEvent]) {
        for event in events {
            self.publish(event);
        }
    }
}

/// Subscriber to market events.
pub trait EventListener: Send + Sync {
    /// Name used in logs when the listener fails.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Handle one event.
    fn on_event(&self, event: &MarketEvent) -> Result<(), ListenerError>;
}

/// No-op event sink for testing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn publish(&self, _event: &MarketEvent) {}
}

/// Event sink that keeps every published event, for tests and replays.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<MarketEvent>>,
}

impl RecordingEventSink {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, in publication order.
    #[must_use]
    pub fn events(&self) -> Vec<MarketEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Tags of the events recorded so far.
    #[must_use]
    pub fn tags(&self) -> Vec<MarketEventTag> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(MarketEvent::tag)
            .collect()
    }

    /// Remove and return every recorded event.
    pub fn take(&self) -> Vec<MarketEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventSink for RecordingEventSink {
    fn publish(&self, event: &MarketEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

impl EventListener for RecordingEventSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn on_event(&self, event: &MarketEvent) -> Result<(), ListenerError> {
        self.publish(event);
        Ok(())
    }
}
