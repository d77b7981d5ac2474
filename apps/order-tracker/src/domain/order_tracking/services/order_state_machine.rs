//! Order State Machine Service
//!
//! Validates forward-only lifecycle transitions.

use crate::domain::order_tracking::errors::TrackingError;
use crate::domain::order_tracking::value_objects::OrderState;

/// Order State Machine for validating transitions.
///
/// Staying in the same state is not a transition and is never valid here;
/// callers treat it as a no-op before consulting the machine.
pub struct OrderStateMachine;

impl OrderStateMachine {
    /// Check if a state transition is valid.
    #[must_use]
    pub const fn is_valid_transition(from: OrderState, to: OrderState) -> bool {
        matches!(
            (from, to),
            // From PendingCreate
            (
                OrderState::PendingCreate,
                OrderState::Open
                    | OrderState::PartiallyFilled
                    | OrderState::Filled
                    | OrderState::Cancelled
                    | OrderState::Failed
            )
            // From Open
            | (
                OrderState::Open,
                OrderState::PartiallyFilled
                    | OrderState::Filled
                    | OrderState::Cancelled
                    | OrderState::Failed
            )
            // From PartiallyFilled (venues may flip back to OPEN)
            | (
                OrderState::PartiallyFilled,
                OrderState::Open
                    | OrderState::Filled
                    | OrderState::Cancelled
                    | OrderState::Failed
            )
        )
    }

    /// Validate a state transition.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::InvalidTransition`] if `to` is unreachable from `from`.
    pub fn validate_transition(
        client_order_id: &str,
        from: OrderState,
        to: OrderState,
    ) -> Result<(), TrackingError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(TrackingError::InvalidTransition {
                client_order_id: client_order_id.to_string(),
                from,
                to,
            })
        }
    }

    /// Get all valid next states from a given state.
    #[must_use]
    pub fn valid_next_states(from: OrderState) -> Vec<OrderState> {
        match from {
            OrderState::PendingCreate => vec![
                OrderState::Open,
                OrderState::PartiallyFilled,
                OrderState::Filled,
                OrderState::Cancelled,
                OrderState::Failed,
            ],
            OrderState::Open => vec![
                OrderState::PartiallyFilled,
                OrderState::Filled,
                OrderState::Cancelled,
                OrderState::Failed,
            ],
            OrderState::PartiallyFilled => vec![
                OrderState::Open,
                OrderState::Filled,
                OrderState::Cancelled,
                OrderState::Failed,
            ],
            // Terminal states
            OrderState::Filled | OrderState::Cancelled | OrderState::Failed => vec![],
        }
    }
}
