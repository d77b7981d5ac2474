//! Shared Domain Types
//!
//! Value objects and the clock abstraction shared across the tracker.

pub mod clock;
pub mod value_objects;

pub use clock::{Clock, ManualClock, SystemClock};
pub use value_objects::{ClientOrderId, ExchangeOrderId, Timestamp, TradeId};
