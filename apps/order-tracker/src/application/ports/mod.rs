//! Application Ports (Driven)
//!
//! Ports define interfaces for interacting with external systems.

mod event_sink_port;

pub use event_sink_port::{
    EventListener, EventSink, ListenerError, NoOpEventSink, RecordingEventSink,
};
