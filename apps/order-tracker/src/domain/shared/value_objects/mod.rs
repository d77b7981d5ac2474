//! Shared Value Objects
//!
//! Immutable domain types used across the tracker.
//! Value objects are compared by value, not identity.

mod identifiers;
mod timestamp;

pub use identifiers::{ClientOrderId, ExchangeOrderId, TradeId};
pub use timestamp::Timestamp;
