//! Order state in the tracked lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an in-flight order.
///
/// ```text
/// PENDING_CREATE ──► OPEN ◄──► PARTIALLY_FILLED
///        │             │              │
///        └─────────────┴──────────────┴──► FILLED | CANCELLED | FAILED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Order submitted, awaiting venue acknowledgment.
    PendingCreate,
    /// Order acknowledged and resting at the venue.
    Open,
    /// Order partially filled.
    PartiallyFilled,
    /// Order canceled.
    Cancelled,
    /// Order completely filled.
    Filled,
    /// Order rejected or lost by the venue.
    Failed,
}

impl OrderState {
    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Failed)
    }

    /// Returns true if the order is still in flight.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(
            self,
            Self::PendingCreate | Self::Open | Self::PartiallyFilled
        )
    }

    /// Position along the lifecycle graph; OPEN and PARTIALLY_FILLED share a rank.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::PendingCreate => 0,
            Self::Open | Self::PartiallyFilled => 1,
            Self::Cancelled | Self::Filled | Self::Failed => 2,
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PendingCreate => write!(f, "PENDING_CREATE"),
            Self::Open => write!(f, "OPEN"),
            Self::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Filled => write!(f, "FILLED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}
