//! Order tracking errors.
//!
//! None of these are fatal: the tracker absorbs them, logs them and counts
//! them, and reports them back to the caller as part of a process result.

use thiserror::Error;

use super::value_objects::{OrderState, UpdateChannel};

/// Conditions under which an update is not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    /// Update references an id absent from both the active and cached sets.
    #[error("Order {client_order_id} is no longer being tracked")]
    UnknownOrder {
        /// Order id carried by the update.
        client_order_id: String,
    },

    /// Update sequence does not exceed the last applied one for its channel.
    #[error(
        "Stale {channel} update for order {client_order_id}: sequence {sequence} <= {last_sequence}"
    )]
    StaleUpdate {
        /// Order id.
        client_order_id: String,
        /// Channel the update arrived on.
        channel: UpdateChannel,
        /// Sequence carried by the update.
        sequence: u64,
        /// Last sequence applied on the channel.
        last_sequence: u64,
    },

    /// Update requests a state not reachable from the current state.
    #[error("Invalid transition for order {client_order_id}: {from} -> {to}")]
    InvalidTransition {
        /// Order id.
        client_order_id: String,
        /// Current state.
        from: OrderState,
        /// Requested state.
        to: OrderState,
    },

    /// Update refused for another reason (duplicate fill, empty fill, ...).
    #[error("Rejected {channel} update for order {client_order_id}: {reason}")]
    RejectedUpdate {
        /// Order id.
        client_order_id: String,
        /// Channel the update arrived on.
        channel: UpdateChannel,
        /// Human-readable reason.
        reason: String,
    },
}

impl TrackingError {
    /// Order id the error refers to.
    #[must_use]
    pub fn client_order_id(&self) -> &str {
        match self {
            Self::UnknownOrder { client_order_id }
            | Self::StaleUpdate {
                client_order_id, ..
            }
            | Self::InvalidTransition {
                client_order_id, ..
            }
            | Self::RejectedUpdate {
                client_order_id, ..
            } => client_order_id,
        }
    }
}
