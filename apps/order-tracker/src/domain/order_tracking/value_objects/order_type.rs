//! Order type (market, limit, etc.).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order type specifying execution behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Market order - execute at best available price.
    Market,
    /// Limit order - execute at specified price or better.
    Limit,
    /// Post-only limit order - rejected instead of taking liquidity.
    LimitMaker,
}

impl OrderType {
    /// Returns true if this order type rests at a limit price.
    #[must_use]
    pub const fn is_limit_type(&self) -> bool {
        matches!(self, Self::Limit | Self::LimitMaker)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "MARKET"),
            Self::Limit => write!(f, "LIMIT"),
            Self::LimitMaker => write!(f, "LIMIT_MAKER"),
        }
    }
}
