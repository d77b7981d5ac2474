//! Result of applying an update to an order record.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::OrderState;
use crate::domain::shared::TradeId;

/// Channel an update arrived on. Sequences are tracked per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateChannel {
    /// Status-only order updates.
    Status,
    /// Trade/fill updates.
    Trade,
}

impl UpdateChannel {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Trade => "trade",
        }
    }
}

impl fmt::Display for UpdateChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an in-sequence update was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateRejection {
    /// Requested state is not reachable from the current one.
    InvalidTransition {
        /// Current state.
        from: OrderState,
        /// Requested state.
        to: OrderState,
    },
    /// The fill was already applied.
    DuplicateTrade {
        /// Fill id seen twice.
        trade_id: TradeId,
    },
    /// The fill carried no base quantity.
    EmptyFill,
    /// The update names a different order.
    MismatchedOrder,
}

impl UpdateRejection {
    /// Label used in metrics.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::DuplicateTrade { .. } => "duplicate_trade",
            Self::EmptyFill => "empty_fill",
            Self::MismatchedOrder => "mismatched_order",
        }
    }
}

impl fmt::Display for UpdateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTransition { from, to } => write!(f, "invalid transition {from} -> {to}"),
            Self::DuplicateTrade { trade_id } => write!(f, "duplicate trade {trade_id}"),
            Self::EmptyFill => write!(f, "fill with no base amount"),
            Self::MismatchedOrder => write!(f, "update addressed to another order"),
        }
    }
}

/// Outcome of applying one update to an order record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The record changed.
    Applied,
    /// Accepted in sequence, but nothing observable changed.
    Unchanged,
    /// Sequence not newer than the last applied one on this channel.
    Stale {
        /// Last sequence applied on the channel.
        last_sequence: u64,
    },
    /// Refused without touching the record's state or fills.
    Rejected(UpdateRejection),
}

impl UpdateOutcome {
    /// True iff the record changed and events must be evaluated.
    #[must_use]
    pub const fn changed(&self) -> bool {
        matches!(self, Self::Applied)
    }
}
