//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Aggregates**: The in-flight order and its invariants
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Events**: Market events published to subscribers
//! - **Domain Services**: The state machine and event emission policy
//!
//! # Bounded Contexts
//!
//! - [`order_tracking`]: In-flight order lifecycle and event emission

pub mod order_tracking;
pub mod shared;
