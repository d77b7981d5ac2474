//! Status-only update reported by a venue.

use serde::{Deserialize, Serialize};

use super::OrderState;
use crate::domain::shared::{ClientOrderId, ExchangeOrderId};

/// Order status notification (acknowledged, cancelled, rejected, ...).
///
/// `sequence` increases strictly per order on the status channel and is the
/// only field used for staleness detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    /// Order this update refers to.
    pub client_order_id: ClientOrderId,
    /// Venue id, when the venue reports one.
    #[serde(default)]
    pub exchange_order_id: Option<ExchangeOrderId>,
    /// State reported by the venue.
    pub new_state: OrderState,
    /// Per-channel sequence number.
    pub sequence: u64,
    /// Venue timestamp in Unix milliseconds.
    #[serde(default)]
    pub update_timestamp: i64,
}

impl OrderUpdate {
    /// Create a new order update.
    #[must_use]
    pub fn new(
        client_order_id: impl Into<ClientOrderId>,
        new_state: OrderState,
        sequence: u64,
    ) -> Self {
        Self {
            client_order_id: client_order_id.into(),
            exchange_order_id: None,
            new_state,
            sequence,
            update_timestamp: 0,
        }
    }

    /// Attach the venue's order id.
    #[must_use]
    pub fn with_exchange_order_id(mut self, id: impl Into<ExchangeOrderId>) -> Self {
        self.exchange_order_id = Some(id.into());
        self
    }

    /// Attach the venue timestamp.
    #[must_use]
    pub fn with_update_timestamp(mut self, unix_millis: i64) -> Self {
        self.update_timestamp = unix_millis;
        self
    }
}
