//! Fill notification reported by a venue.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TradeFee;
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, TradeId};

/// One fill against an order.
///
/// Amounts are incremental: the record derives new cumulative totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeUpdate {
    /// Venue id of the fill.
    pub trade_id: TradeId,
    /// Order this fill belongs to.
    pub client_order_id: ClientOrderId,
    /// Venue id of the order, when reported.
    #[serde(default)]
    pub exchange_order_id: Option<ExchangeOrderId>,
    /// Execution price.
    pub fill_price: Decimal,
    /// Filled quantity in base asset.
    pub fill_base_amount: Decimal,
    /// Filled notional in quote asset.
    pub fill_quote_amount: Decimal,
    /// Fee charged for this fill.
    pub fee: TradeFee,
    /// Per-channel sequence number.
    pub sequence: u64,
    /// Venue timestamp in Unix milliseconds.
    #[serde(default)]
    pub fill_timestamp: i64,
}

impl TradeUpdate {
    /// Create a fill whose quote amount is `price * base_amount`.
    #[must_use]
    pub fn new(
        trade_id: impl Into<TradeId>,
        client_order_id: impl Into<ClientOrderId>,
        fill_price: Decimal,
        fill_base_amount: Decimal,
        fee: TradeFee,
        sequence: u64,
    ) -> Self {
        Self {
            trade_id: trade_id.into(),
            client_order_id: client_order_id.into(),
            exchange_order_id: None,
            fill_price,
            fill_base_amount,
            fill_quote_amount: fill_price * fill_base_amount,
            fee,
            sequence,
            fill_timestamp: 0,
        }
    }

    /// Attach the venue's order id.
    #[must_use]
    pub fn with_exchange_order_id(mut self, id: impl Into<ExchangeOrderId>) -> Self {
        self.exchange_order_id = Some(id.into());
        self
    }

    /// Override the quote amount reported by the venue.
    #[must_use]
    pub fn with_quote_amount(mut self, quote: Decimal) -> Self {
        self.fill_quote_amount = quote;
        self
    }

    /// Attach the venue timestamp.
    #[must_use]
    pub fn with_fill_timestamp(mut self, unix_millis: i64) -> Self {
        self.fill_timestamp = unix_millis;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn trade_update_derives_quote_amount() {
        let trade = TradeUpdate::new("t-1", "A", dec!(100), dec!(4), TradeFee::zero("USDT"), 1);
        assert_eq!(trade.fill_quote_amount, dec!(400));
    }

    #[test]
    fn trade_update_quote_override() {
        let trade = TradeUpdate::new("t-1", "A", dec!(100), dec!(4), TradeFee::zero("USDT"), 1)
            .with_quote_amount(dec!(399.5));
        assert_eq!(trade.fill_quote_amount, dec!(399.5));
    }
}
