//! Event Delivery Adapters
//!
//! In-process implementation of the event sink port and default listeners.

pub mod event_bus;
pub mod event_logger;

pub use event_bus::{EventBus, ListenerId};
pub use event_logger::EventLogger;
