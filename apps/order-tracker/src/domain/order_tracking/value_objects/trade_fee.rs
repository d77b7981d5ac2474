//! Fee charged on a single fill.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fee paid for one fill, denominated in a single asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFee {
    /// Asset the fee is paid in.
    pub asset: String,
    /// Fee amount in `asset` units.
    pub amount: Decimal,
}

impl TradeFee {
    /// Create a new fee.
    #[must_use]
    pub fn new(asset: impl Into<String>, amount: Decimal) -> Self {
        Self {
            asset: asset.into(),
            amount,
        }
    }

    /// A zero fee in the given asset.
    #[must_use]
    pub fn zero(asset: impl Into<String>) -> Self {
        Self::new(asset, Decimal::ZERO)
    }

    /// Returns true if nothing was charged.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for TradeFee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.asset)
    }
}
