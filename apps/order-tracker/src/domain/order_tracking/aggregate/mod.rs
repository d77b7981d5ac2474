//! In-Flight Order Aggregate
//!
//! The in-flight order is the root entity for a tracked order's lifecycle.

mod in_flight_order;

pub use in_flight_order::{CreateOrderCommand, InFlightOrder, split_trading_pair};
