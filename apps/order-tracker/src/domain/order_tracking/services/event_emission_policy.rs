//! Event Emission Policy
//!
//! Decides which market events an accepted update produced by diffing the
//! order against its pre-update snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_tracking::aggregate::InFlightOrder;
use crate::domain::order_tracking::events::{
    MarketEvent, OrderCancelledEvent, OrderCompletedEvent, OrderCreatedEvent, OrderFailureEvent,
    OrderFilledEvent,
};
use crate::domain::order_tracking::value_objects::{
    OrderState, TradeFee, TradeType, UpdateChannel,
};
use crate::domain::shared::Timestamp;

/// Order state and fill total captured before an update is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSnapshot {
    /// State before the update.
    pub state: OrderState,
    /// Executed base amount before the update.
    pub executed_amount_base: Decimal,
}

/// What to do when an order that already published its terminal event
/// changes again (a late fill or fee correction reaching a cached order).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminalEventPolicy {
    /// Publish the terminal event once per lifecycle.
    #[default]
    Once,
    /// Publish the terminal event again with the corrected totals.
    Replay,
}

/// Maps an order change to the events it produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventEmissionPolicy;

impl EventEmissionPolicy {
    /// Events for an accepted update, in emission order: created, filled,
    /// then terminal.
    #[must_use]
    pub fn events_for(
        previous: &OrderSnapshot,
        order: &InFlightOrder,
        channel: UpdateChannel,
        now: Timestamp,
        terminal_policy: TerminalEventPolicy,
    ) -> Vec<MarketEvent> {
        let mut events = Vec::new();

        if channel == UpdateChannel::Status
            && previous.state == OrderState::PendingCreate
            && order.current_state() == OrderState::Open
        {
            events.push(Self::created_event(order, now));
        }

        let delta = order.executed_amount_base() - previous.executed_amount_base;
        if delta > Decimal::ZERO {
            events.push(Self::filled_event(order, delta, now));
        }

        if order.is_done()
            && (!order.terminal_event_emitted() || terminal_policy == TerminalEventPolicy::Replay)
        {
            if let Some(event) = Self::terminal_event(order, now) {
                events.push(event);
            }
        }

        events
    }

    /// Build the creation event for an order.
    #[must_use]
    pub fn created_event(order: &InFlightOrder, now: Timestamp) -> MarketEvent {
        let payload = OrderCreatedEvent {
            client_order_id: order.client_order_id().clone(),
            exchange_order_id: order.exchange_order_id().cloned(),
            trading_pair: order.trading_pair().to_string(),
            order_type: order.order_type(),
            amount: order.amount(),
            price: order.price(),
            creation_timestamp: order.creation_timestamp(),
            timestamp: now,
        };

        match order.trade_type() {
            TradeType::Buy => MarketEvent::BuyOrderCreated(payload),
            TradeType::Sell => MarketEvent::SellOrderCreated(payload),
        }
    }

    /// Build a fill event for `amount` of newly executed base.
    #[must_use]
    pub fn filled_event(order: &InFlightOrder, amount: Decimal, now: Timestamp) -> MarketEvent {
        let trade_fee = order
            .latest_trade_fee()
            .cloned()
            .unwrap_or_else(|| TradeFee::zero(order.quote_asset()));

        MarketEvent::OrderFilled(OrderFilledEvent {
            client_order_id: order.client_order_id().clone(),
            exchange_order_id: order.exchange_order_id().cloned(),
            trading_pair: order.trading_pair().to_string(),
            trade_type: order.trade_type(),
            order_type: order.order_type(),
            price: order.last_filled_price(),
            amount,
            trade_fee,
            timestamp: now,
        })
    }

    /// Build the terminal event matching the order's state, if it is terminal.
    #[must_use]
    pub fn terminal_event(order: &InFlightOrder, now: Timestamp) -> Option<MarketEvent> {
        match order.current_state() {
            OrderState::Filled => {
                let payload = OrderCompletedEvent {
                    client_order_id: order.client_order_id().clone(),
                    exchange_order_id: order.exchange_order_id().cloned(),
                    base_asset: order.base_asset().to_string(),
                    quote_asset: order.quote_asset().to_string(),
                    fee_asset: order
                        .fee_asset()
                        .unwrap_or_else(|| order.quote_asset())
                        .to_string(),
                    base_asset_amount: order.executed_amount_base(),
                    quote_asset_amount: order.executed_amount_quote(),
                    fee_amount: order.cumulative_fee_paid(),
                    order_type: order.order_type(),
                    timestamp: now,
                };
                Some(match order.trade_type() {
                    TradeType::Buy => MarketEvent::BuyOrderCompleted(payload),
                    TradeType::Sell => MarketEvent::SellOrderCompleted(payload),
                })
            }
            OrderState::Cancelled => Some(MarketEvent::OrderCancelled(OrderCancelledEvent {
                client_order_id: order.client_order_id().clone(),
                exchange_order_id: order.exchange_order_id().cloned(),
                timestamp: now,
            })),
            OrderState::Failed => Some(MarketEvent::OrderFailure(OrderFailureEvent {
                client_order_id: order.client_order_id().clone(),
                order_type: order.order_type(),
                timestamp: now,
            })),
            OrderState::PendingCreate | OrderState::Open | OrderState::PartiallyFilled => None,
        }
    }
}
