//! Event logging listener.
//!
//! Writes every market event to the tracing log.

use crate::application::ports::{EventListener, ListenerError};
use crate::domain::order_tracking::events::MarketEvent;

/// Listener that logs each event it receives.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventLogger;

impl EventLogger {
    /// Create an event logger.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EventListener for EventLogger {
    fn name(&self) -> &str {
        "event_logger"
    }

    fn on_event(&self, event: &MarketEvent) -> Result<(), ListenerError> {
        match event {
            MarketEvent::BuyOrderCreated(e) | MarketEvent::SellOrderCreated(e) => {
                tracing::debug!(
                    event = event.event_type(),
                    client_order_id = %e.client_order_id,
                    trading_pair = %e.trading_pair,
                    amount = %e.amount,
                    price = %e.price,
                    "Market event"
                );
            }
            MarketEvent::OrderFilled(e) => {
                tracing::debug!(
                    event = event.event_type(),
                    client_order_id = %e.client_order_id,
                    trading_pair = %e.trading_pair,
                    price = %e.price,
                    amount = %e.amount,
                    fee = %e.trade_fee,
                    "Market event"
                );
            }
            MarketEvent::BuyOrderCompleted(e) | MarketEvent::SellOrderCompleted(e) => {
                tracing::debug!(
                    event = event.event_type(),
                    client_order_id = %e.client_order_id,
                    base_amount = %e.base_asset_amount,
                    quote_amount = %e.quote_asset_amount,
                    fee = %e.fee_amount,
                    fee_asset = %e.fee_asset,
                    "Market event"
                );
            }
            MarketEvent::OrderCancelled(_) | MarketEvent::OrderFailure(_) => {
                tracing::debug!(
                    event = event.event_type(),
                    client_order_id = %event.client_order_id(),
                    "Market event"
                );
            }
        }
        Ok(())
    }
}
