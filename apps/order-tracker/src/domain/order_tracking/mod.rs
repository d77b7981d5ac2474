//! Order Tracking Bounded Context
//!
//! Holds the authoritative state of submitted orders and turns venue
//! updates into lifecycle events.
//!
//! # Key Concepts
//!
//! - **In-Flight Order**: The aggregate applying status and fill updates
//! - **Per-Channel Sequencing**: Status and trade channels are ordered independently
//! - **Market Events**: Created, filled, completed, cancelled and failure notifications

pub mod aggregate;
pub mod errors;
pub mod events;
pub mod services;
pub mod value_objects;

pub use aggregate::{CreateOrderCommand, InFlightOrder};
pub use errors::TrackingError;
pub use events::{
    MarketEvent, MarketEventTag, OrderCancelledEvent, OrderCompletedEvent, OrderCreatedEvent,
    OrderFailureEvent, OrderFilledEvent,
};
pub use services::{EventEmissionPolicy, OrderSnapshot, OrderStateMachine, TerminalEventPolicy};
pub use value_objects::{
    OrderState, OrderType, OrderUpdate, TradeFee, TradeType, TradeUpdate, UpdateChannel,
    UpdateOutcome, UpdateRejection,
};
