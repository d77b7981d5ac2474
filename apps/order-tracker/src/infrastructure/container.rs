//! Dependency Injection Container
//!
//! Wires the tracker to the in-process event bus with the default listeners.

use std::sync::Arc;

use crate::application::ports::EventSink;
use crate::application::services::InFlightOrderTracker;
use crate::config::TrackerConfig;
use crate::domain::shared::{Clock, SystemClock};
use crate::infrastructure::events::{EventBus, EventLogger};

/// Tracker and the event bus it publishes to.
#[derive(Debug, Clone)]
pub struct Container {
    tracker: Arc<InFlightOrderTracker>,
    event_bus: Arc<EventBus>,
}

impl Container {
    /// Build a tracker publishing to a fresh event bus.
    ///
    /// An [`EventLogger`] is subscribed to every event kind.
    #[must_use]
    pub fn new(config: &TrackerConfig, clock: Arc<dyn Clock>) -> Self {
        let event_bus = Arc::new(EventBus::new());
        event_bus.add_listener_for_all(Arc::new(EventLogger::new()));

        let tracker = Arc::new(InFlightOrderTracker::new(
            config,
            Arc::clone(&event_bus) as Arc<dyn EventSink>,
            clock,
        ));

        Self { tracker, event_bus }
    }

    /// Build with the system clock.
    #[must_use]
    pub fn with_system_clock(config: &TrackerConfig) -> Self {
        Self::new(config, Arc::new(SystemClock::new()))
    }

    /// Get the tracker.
    pub fn tracker(&self) -> Arc<InFlightOrderTracker> {
        Arc::clone(&self.tracker)
    }

    /// Get the event bus, to subscribe further listeners.
    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }
}
