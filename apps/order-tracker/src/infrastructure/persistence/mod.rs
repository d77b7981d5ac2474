//! Persistence Adapters
//!
//! In-memory storage for active and recently retired orders.

pub mod tracking_store;

pub use tracking_store::{SharedOrder, TrackedOrder, TrackingStore};
