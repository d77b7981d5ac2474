//! Infrastructure Layer
//!
//! Adapters implementing the ports defined in the application layer:
//!
//! - `cache/`: Bounded TTL cache for retired orders
//! - `persistence/`: Active and cached order storage
//! - `events/`: In-process event bus and logging listener
//! - `container`: Wiring of the tracker to the event bus

pub mod cache;
pub mod container;
pub mod events;
pub mod persistence;
