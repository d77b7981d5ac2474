//! Market events published for tracked orders.
//!
//! Each event is emitted at most once per observed change and carries the
//! tracker's clock reading at emission time.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value_objects::{OrderType, TradeFee, TradeType};
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Timestamp};

/// All events published by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketEvent {
    /// Buy order acknowledged by the venue.
    BuyOrderCreated(OrderCreatedEvent),
    /// Sell order acknowledged by the venue.
    SellOrderCreated(OrderCreatedEvent),
    /// Fill observed for an order.
    OrderFilled(OrderFilledEvent),
    /// Buy order completely filled.
    BuyOrderCompleted(OrderCompletedEvent),
    /// Sell order completely filled.
    SellOrderCompleted(OrderCompletedEvent),
    /// Order cancelled.
    OrderCancelled(OrderCancelledEvent),
    /// Order failed.
    OrderFailure(OrderFailureEvent),
}

impl MarketEvent {
    /// Get the subscription tag for this event.
    #[must_use]
    pub const fn tag(&self) -> MarketEventTag {
        match self {
            Self::BuyOrderCreated(_) => MarketEventTag::BuyOrderCreated,
            Self::SellOrderCreated(_) => MarketEventTag::SellOrderCreated,
            Self::OrderFilled(_) => MarketEventTag::OrderFilled,
            Self::BuyOrderCompleted(_) => MarketEventTag::BuyOrderCompleted,
            Self::SellOrderCompleted(_) => MarketEventTag::SellOrderCompleted,
            Self::OrderCancelled(_) => MarketEventTag::OrderCancelled,
            Self::OrderFailure(_) => MarketEventTag::OrderFailure,
        }
    }

    /// Get the client order ID this event refers to.
    #[must_use]
    pub const fn client_order_id(&self) -> &ClientOrderId {
        match self {
            Self::BuyOrderCreated(e) | Self::SellOrderCreated(e) => &e.client_order_id,
            Self::OrderFilled(e) => &e.client_order_id,
            Self::BuyOrderCompleted(e) | Self::SellOrderCompleted(e) => &e.client_order_id,
            Self::OrderCancelled(e) => &e.client_order_id,
            Self::OrderFailure(e) => &e.client_order_id,
        }
    }

    /// Get the emission timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> Timestamp {
        match self {
            Self::BuyOrderCreated(e) | Self::SellOrderCreated(e) => e.timestamp,
            Self::OrderFilled(e) => e.timestamp,
            Self::BuyOrderCompleted(e) | Self::SellOrderCompleted(e) => e.timestamp,
            Self::OrderCancelled(e) => e.timestamp,
            Self::OrderFailure(e) => e.timestamp,
        }
    }

    /// Get the event type name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        self.tag().as_str()
    }

    /// Whether this event ends the order's lifecycle.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.tag().is_terminal()
    }
}

/// Subscription key for [`MarketEvent`] kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketEventTag {
    /// See [`MarketEvent::BuyOrderCreated`].
    BuyOrderCreated,
    /// See [`MarketEvent::SellOrderCreated`].
    SellOrderCreated,
    /// See [`MarketEvent::OrderFilled`].
    OrderFilled,
    /// See [`MarketEvent::BuyOrderCompleted`].
    BuyOrderCompleted,
    /// See [`MarketEvent::SellOrderCompleted`].
    SellOrderCompleted,
    /// See [`MarketEvent::OrderCancelled`].
    OrderCancelled,
    /// See [`MarketEvent::OrderFailure`].
    OrderFailure,
}

impl MarketEventTag {
    /// Every tag, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::BuyOrderCreated,
        Self::SellOrderCreated,
        Self::OrderFilled,
        Self::BuyOrderCompleted,
        Self::SellOrderCompleted,
        Self::OrderCancelled,
        Self::OrderFailure,
    ];

    /// Get the tag name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BuyOrderCreated => "BUY_ORDER_CREATED",
            Self::SellOrderCreated => "SELL_ORDER_CREATED",
            Self::OrderFilled => "ORDER_FILLED",
            Self::BuyOrderCompleted => "BUY_ORDER_COMPLETED",
            Self::SellOrderCompleted => "SELL_ORDER_COMPLETED",
            Self::OrderCancelled => "ORDER_CANCELLED",
            Self::OrderFailure => "ORDER_FAILURE",
        }
    }

    /// Completed, cancelled and failure tags.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::BuyOrderCompleted
                | Self::SellOrderCompleted
                | Self::OrderCancelled
                | Self::OrderFailure
        )
    }
}

impl fmt::Display for MarketEventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event: order acknowledged by the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    /// Client order ID.
    pub client_order_id: ClientOrderId,
    /// Exchange order ID, if known.
    pub exchange_order_id: Option<ExchangeOrderId>,
    /// Trading pair.
    pub trading_pair: String,
    /// Order type.
    pub order_type: OrderType,
    /// Requested amount.
    pub amount: Decimal,
    /// Requested price.
    pub price: Decimal,
    /// Order submission time (Unix ms).
    pub creation_timestamp: i64,
    /// When the event was emitted.
    pub timestamp: Timestamp,
}

/// Event: fill observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilledEvent {
    /// Client order ID.
    pub client_order_id: ClientOrderId,
    /// Exchange order ID, if known.
    pub exchange_order_id: Option<ExchangeOrderId>,
    /// Trading pair.
    pub trading_pair: String,
    /// Order side.
    pub trade_type: TradeType,
    /// Order type.
    pub order_type: OrderType,
    /// Price of the fill.
    pub price: Decimal,
    /// Base amount filled since the previous fill event.
    pub amount: Decimal,
    /// Fee of the most recent fill.
    pub trade_fee: TradeFee,
    /// When the event was emitted.
    pub timestamp: Timestamp,
}

/// Event: order completely filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCompletedEvent {
    /// Client order ID.
    pub client_order_id: ClientOrderId,
    /// Exchange order ID, if known.
    pub exchange_order_id: Option<ExchangeOrderId>,
    /// Base asset.
    pub base_asset: String,
    /// Quote asset.
    pub quote_asset: String,
    /// Asset the fee was charged in (quote asset when no fee was charged).
    pub fee_asset: String,
    /// Cumulative executed amount in base.
    pub base_asset_amount: Decimal,
    /// Cumulative executed amount in quote.
    pub quote_asset_amount: Decimal,
    /// Cumulative fee paid in `fee_asset`.
    pub fee_amount: Decimal,
    /// Order type.
    pub order_type: OrderType,
    /// When the event was emitted.
    pub timestamp: Timestamp,
}

/// Event: order cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    /// Client order ID.
    pub client_order_id: ClientOrderId,
    /// Exchange order ID, if known.
    pub exchange_order_id: Option<ExchangeOrderId>,
    /// When the event was emitted.
    pub timestamp: Timestamp,
}

/// Event: order failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFailureEvent {
    /// Client order ID.
    pub client_order_id: ClientOrderId,
    /// Order type.
    pub order_type: OrderType,
    /// When the event was emitted.
    pub timestamp: Timestamp,
}
