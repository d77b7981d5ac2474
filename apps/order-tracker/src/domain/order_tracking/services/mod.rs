//! Order Tracking Domain Services
//!
//! Stateless business logic that doesn't fit in the aggregate.

mod event_emission_policy;
mod order_state_machine;

pub use event_emission_policy::{EventEmissionPolicy, OrderSnapshot, TerminalEventPolicy};
pub use order_state_machine::OrderStateMachine;
