//! Application Services
//!
//! The tracker that processes venue updates, and the background task that
//! keeps its cache trimmed.

mod cache_sweeper;
mod order_tracker;

pub use cache_sweeper::spawn_cache_sweeper;
pub use order_tracker::{InFlightOrderTracker, ProcessResult, TrackerStatus};
