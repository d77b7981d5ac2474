//! In-Flight Order Aggregate Root
//!
//! The in-flight order is the per-order state entity. It owns the lifecycle
//! state machine and the monotonic fill accounting, and it is the only place
//! where order or trade updates mutate order state.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_tracking::services::{OrderSnapshot, OrderStateMachine};
use crate::domain::order_tracking::value_objects::{
    OrderState, OrderType, OrderUpdate, TradeFee, TradeType, TradeUpdate, UpdateOutcome,
    UpdateRejection,
};
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, TradeId};

/// Command to start tracking a newly submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderCommand {
    /// Caller-assigned id. A fresh one is generated when omitted.
    #[serde(default = "ClientOrderId::generate")]
    pub client_order_id: ClientOrderId,
    /// Instrument, e.g. `BTC-USDT`.
    pub trading_pair: String,
    /// Order type.
    pub order_type: OrderType,
    /// Order side.
    pub trade_type: TradeType,
    /// Requested size in base asset.
    pub amount: Decimal,
    /// Limit price (zero for market orders).
    #[serde(default)]
    pub price: Decimal,
    /// Venue id, if already known at submission time.
    #[serde(default)]
    pub exchange_order_id: Option<ExchangeOrderId>,
    /// Submission time in Unix milliseconds.
    #[serde(default)]
    pub creation_timestamp: i64,
}

/// Split a trading pair into base and quote assets.
///
/// Accepts `BASE-QUOTE` and `BASE/QUOTE`. Pairs without a separator are
/// treated as base-only.
#[must_use]
pub fn split_trading_pair(trading_pair: &str) -> (String, String) {
    trading_pair
        .split_once(['-', '/'])
        .map_or_else(
            || (trading_pair.to_string(), String::new()),
            |(base, quote)| (base.to_string(), quote.to_string()),
        )
}

/// In-Flight Order Aggregate Root.
///
/// Invariants held by every mutation:
/// - `executed_amount_base` never decreases;
/// - `current_state` only moves along the lifecycle graph and never leaves a
///   terminal state;
/// - `exchange_order_id` is written at most once;
/// - each channel only accepts strictly increasing sequences.
#[allow(clippy::struct_field_names)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlightOrder {
    client_order_id: ClientOrderId,
    exchange_order_id: Option<ExchangeOrderId>,
    trading_pair: String,
    base_asset: String,
    quote_asset: String,
    trade_type: TradeType,
    order_type: OrderType,
    amount: Decimal,
    price: Decimal,
    executed_amount_base: Decimal,
    executed_amount_quote: Decimal,
    fee_asset: Option<String>,
    fees_paid: BTreeMap<String, Decimal>,
    last_filled_price: Decimal,
    last_filled_amount: Decimal,
    latest_trade_fee: Option<TradeFee>,
    current_state: OrderState,
    creation_timestamp: i64,
    last_update_timestamp: i64,
    last_status_sequence: Option<u64>,
    last_trade_sequence: Option<u64>,
    applied_trades: HashSet<TradeId>,
    terminal_event_emitted: bool,
}

impl InFlightOrder {
    /// Create a new order in `PENDING_CREATE`.
    #[must_use]
    pub fn new(cmd: CreateOrderCommand) -> Self {
        let (base_asset, quote_asset) = split_trading_pair(&cmd.trading_pair);

        Self {
            client_order_id: cmd.client_order_id,
            exchange_order_id: cmd.exchange_order_id,
            trading_pair: cmd.trading_pair,
            base_asset,
            quote_asset,
            trade_type: cmd.trade_type,
            order_type: cmd.order_type,
            amount: cmd.amount,
            price: cmd.price,
            executed_amount_base: Decimal::ZERO,
            executed_amount_quote: Decimal::ZERO,
            fee_asset: None,
            fees_paid: BTreeMap::new(),
            last_filled_price: Decimal::ZERO,
            last_filled_amount: Decimal::ZERO,
            latest_trade_fee: None,
            current_state: OrderState::PendingCreate,
            creation_timestamp: cmd.creation_timestamp,
            last_update_timestamp: cmd.creation_timestamp,
            last_status_sequence: None,
            last_trade_sequence: None,
            applied_trades: HashSet::new(),
            terminal_event_emitted: false,
        }
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Get the client order ID.
    #[must_use]
    pub const fn client_order_id(&self) -> &ClientOrderId {
        &self.client_order_id
    }

    /// Get the exchange order ID, if acknowledged.
    #[must_use]
    pub const fn exchange_order_id(&self) -> Option<&ExchangeOrderId> {
        self.exchange_order_id.as_ref()
    }

    /// Get the trading pair.
    #[must_use]
    pub fn trading_pair(&self) -> &str {
        &self.trading_pair
    }

    /// Get the base asset.
    #[must_use]
    pub fn base_asset(&self) -> &str {
        &self.base_asset
    }

    /// Get the quote asset.
    #[must_use]
    pub fn quote_asset(&self) -> &str {
        &self.quote_asset
    }

    /// Get the order side.
    #[must_use]
    pub const fn trade_type(&self) -> TradeType {
        self.trade_type
    }

    /// Get the order type.
    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Get the requested amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Get the requested price.
    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// Cumulative filled quantity in base asset.
    #[must_use]
    pub const fn executed_amount_base(&self) -> Decimal {
        self.executed_amount_base
    }

    /// Cumulative filled notional in quote asset.
    #[must_use]
    pub const fn executed_amount_quote(&self) -> Decimal {
        self.executed_amount_quote
    }

    /// Asset the cumulative fee is reported in (first fee asset seen).
    #[must_use]
    pub fn fee_asset(&self) -> Option<&str> {
        self.fee_asset.as_deref()
    }

    /// Cumulative fee paid in [`Self::fee_asset`].
    #[must_use]
    pub fn cumulative_fee_paid(&self) -> Decimal {
        self.fee_asset
            .as_ref()
            .and_then(|asset| self.fees_paid.get(asset))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Cumulative fee paid per asset.
    #[must_use]
    pub const fn fees_paid(&self) -> &BTreeMap<String, Decimal> {
        &self.fees_paid
    }

    /// Price of the most recent fill.
    #[must_use]
    pub const fn last_filled_price(&self) -> Decimal {
        self.last_filled_price
    }

    /// Base quantity of the most recent fill.
    #[must_use]
    pub const fn last_filled_amount(&self) -> Decimal {
        self.last_filled_amount
    }

    /// Fee of the most recent fill.
    #[must_use]
    pub const fn latest_trade_fee(&self) -> Option<&TradeFee> {
        self.latest_trade_fee.as_ref()
    }

    /// Get the current state.
    #[must_use]
    pub const fn current_state(&self) -> OrderState {
        self.current_state
    }

    /// Submission time in Unix milliseconds.
    #[must_use]
    pub const fn creation_timestamp(&self) -> i64 {
        self.creation_timestamp
    }

    /// Latest venue timestamp seen on any accepted update.
    #[must_use]
    pub const fn last_update_timestamp(&self) -> i64 {
        self.last_update_timestamp
    }

    /// Last sequence applied on the status channel.
    #[must_use]
    pub const fn last_status_sequence(&self) -> Option<u64> {
        self.last_status_sequence
    }

    /// Last sequence applied on the trade channel.
    #[must_use]
    pub const fn last_trade_sequence(&self) -> Option<u64> {
        self.last_trade_sequence
    }

    /// Volume-weighted average execution price, if anything was filled.
    #[must_use]
    pub fn average_executed_price(&self) -> Option<Decimal> {
        if self.executed_amount_base > Decimal::ZERO {
            Some(self.executed_amount_quote / self.executed_amount_base)
        } else {
            None
        }
    }

    /// State and fill totals used to diff against after an update.
    #[must_use]
    pub const fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            state: self.current_state,
            executed_amount_base: self.executed_amount_base,
        }
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    /// Order is still in flight.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.current_state.is_open()
    }

    /// Order reached a terminal state.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.current_state.is_terminal()
    }

    /// Order awaits venue acknowledgment.
    #[must_use]
    pub const fn is_pending_create(&self) -> bool {
        matches!(self.current_state, OrderState::PendingCreate)
    }

    /// Order was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.current_state, OrderState::Cancelled)
    }

    /// Order was completely filled.
    #[must_use]
    pub const fn is_filled(&self) -> bool {
        matches!(self.current_state, OrderState::Filled)
    }

    /// Order failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.current_state, OrderState::Failed)
    }

    /// Whether the terminal event for this lifecycle has been published.
    #[must_use]
    pub const fn terminal_event_emitted(&self) -> bool {
        self.terminal_event_emitted
    }

    /// Record that the terminal event has been published.
    pub const fn mark_terminal_event_emitted(&mut self) {
        self.terminal_event_emitted = true;
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Apply a status update.
    ///
    /// Returns [`UpdateOutcome::Applied`] only when the state changed. A newly
    /// reported exchange order id is adopted even when the state is unchanged
    /// or the requested transition is refused.
    pub fn apply_order_update(&mut self, update: &OrderUpdate) -> UpdateOutcome {
        if update.client_order_id != self.client_order_id {
            return UpdateOutcome::Rejected(UpdateRejection::MismatchedOrder);
        }
        if let Some(last_sequence) = self.last_status_sequence {
            if update.sequence <= last_sequence {
                return UpdateOutcome::Stale { last_sequence };
            }
        }

        self.last_status_sequence = Some(update.sequence);
        self.touch(update.update_timestamp);
        self.adopt_exchange_order_id(update.exchange_order_id.as_ref());

        if update.new_state == self.current_state {
            return UpdateOutcome::Unchanged;
        }
        if !OrderStateMachine::is_valid_transition(self.current_state, update.new_state) {
            return UpdateOutcome::Rejected(UpdateRejection::InvalidTransition {
                from: self.current_state,
                to: update.new_state,
            });
        }

        self.current_state = update.new_state;
        UpdateOutcome::Applied
    }

    /// Apply a fill.
    ///
    /// Accumulates the fill into the executed totals and fees, overwrites the
    /// latest-fill snapshot, and moves the order to `FILLED` once the executed
    /// base amount reaches the requested amount. Fills arriving after another
    /// terminal state still update the totals but never change the state.
    pub fn apply_trade_update(&mut self, trade: &TradeUpdate) -> UpdateOutcome {
        if trade.client_order_id != self.client_order_id {
            return UpdateOutcome::Rejected(UpdateRejection::MismatchedOrder);
        }
        if let Some(last_sequence) = self.last_trade_sequence {
            if trade.sequence <= last_sequence {
                return UpdateOutcome::Stale { last_sequence };
            }
        }

        self.last_trade_sequence = Some(trade.sequence);

        if trade.fill_base_amount <= Decimal::ZERO {
            return UpdateOutcome::Rejected(UpdateRejection::EmptyFill);
        }
        if self.applied_trades.contains(&trade.trade_id) {
            return UpdateOutcome::Rejected(UpdateRejection::DuplicateTrade {
                trade_id: trade.trade_id.clone(),
            });
        }

        self.applied_trades.insert(trade.trade_id.clone());
        self.touch(trade.fill_timestamp);
        self.adopt_exchange_order_id(trade.exchange_order_id.as_ref());

        self.executed_amount_base += trade.fill_base_amount;
        self.executed_amount_quote += trade.fill_quote_amount.max(Decimal::ZERO);
        self.record_fee(&trade.fee);
        self.last_filled_price = trade.fill_price;
        self.last_filled_amount = trade.fill_base_amount;
        self.latest_trade_fee = Some(trade.fee.clone());

        if self.executed_amount_base >= self.amount
            && OrderStateMachine::is_valid_transition(self.current_state, OrderState::Filled)
        {
            self.current_state = OrderState::Filled;
        }

        UpdateOutcome::Applied
    }

    // ========================================================================
    // Private Helpers
    // ========================================================================

    fn adopt_exchange_order_id(&mut self, reported: Option<&ExchangeOrderId>) {
        if self.exchange_order_id.is_none() {
            self.exchange_order_id = reported.cloned();
        }
    }

    fn record_fee(&mut self, fee: &TradeFee) {
        if fee.amount <= Decimal::ZERO {
            return;
        }
        if self.fee_asset.is_none() {
            self.fee_asset = Some(fee.asset.clone());
        }
        *self.fees_paid.entry(fee.asset.clone()).or_insert(Decimal::ZERO) += fee.amount;
    }

    const fn touch(&mut self, venue_timestamp: i64) {
        if venue_timestamp > self.last_update_timestamp {
            self.last_update_timestamp = venue_timestamp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_order(amount: Decimal) -> InFlightOrder {
        InFlightOrder::new(CreateOrderCommand {
            client_order_id: ClientOrderId::new("A"),
            trading_pair: "BTC-USDT".to_string(),
            order_type: OrderType::Limit,
            trade_type: TradeType::Buy,
            amount,
            price: dec!(100),
            exchange_order_id: None,
            creation_timestamp: 1_000,
        })
    }

    fn fill(trade_id: &str, amount: Decimal, sequence: u64) -> TradeUpdate {
        TradeUpdate::new(
            trade_id,
            "A",
            dec!(100),
            amount,
            TradeFee::new("USDT", dec!(0.1)),
            sequence,
        )
    }

    #[test]
    fn new_order_is_pending_create() {
        let order = make_order(dec!(10));

        assert!(order.is_pending_create());
        assert!(order.is_open());
        assert_eq!(order.base_asset(), "BTC");
        assert_eq!(order.quote_asset(), "USDT");
        assert_eq!(order.executed_amount_base(), Decimal::ZERO);
        assert!(order.average_executed_price().is_none());
    }

    #[test]
    fn command_without_id_gets_a_generated_one() {
        let json = r#"{"trading_pair":"BTC-USDT","order_type":"LIMIT","trade_type":"BUY","amount":"1"}"#;
        let first: CreateOrderCommand = serde_json::from_str(json).unwrap();
        let second: CreateOrderCommand = serde_json::from_str(json).unwrap();

        assert!(!first.client_order_id.as_str().is_empty());
        assert_ne!(first.client_order_id, second.client_order_id);
        assert_eq!(first.price, Decimal::ZERO);
    }

    #[test]
    fn command_keeps_supplied_id() {
        let json = r#"{"client_order_id":"A","trading_pair":"BTC-USDT","order_type":"MARKET","trade_type":"SELL","amount":"2"}"#;
        let cmd: CreateOrderCommand = serde_json::from_str(json).unwrap();

        assert_eq!(cmd.client_order_id, ClientOrderId::new("A"));
        assert_eq!(cmd.trade_type, TradeType::Sell);
    }

    #[test]
    fn split_trading_pair_variants() {
        assert_eq!(
            split_trading_pair("ETH/BTC"),
            ("ETH".to_string(), "BTC".to_string())
        );
        assert_eq!(split_trading_pair("XYZ"), ("XYZ".to_string(), String::new()));
    }

    #[test]
    fn order_update_opens_order_and_sets_exchange_id() {
        let mut order = make_order(dec!(10));

        let outcome = order.apply_order_update(
            &OrderUpdate::new("A", OrderState::Open, 1).with_exchange_order_id("EX-1"),
        );

        assert_eq!(outcome, UpdateOutcome::Applied);
        assert_eq!(order.current_state(), OrderState::Open);
        assert_eq!(order.exchange_order_id().unwrap().as_str(), "EX-1");
    }

    #[test]
    fn exchange_order_id_is_write_once() {
        let mut order = make_order(dec!(10));
        order.apply_order_update(
            &OrderUpdate::new("A", OrderState::Open, 1).with_exchange_order_id("EX-1"),
        );

        order.apply_order_update(
            &OrderUpdate::new("A", OrderState::Cancelled, 2).with_exchange_order_id("EX-2"),
        );

        assert_eq!(order.exchange_order_id().unwrap().as_str(), "EX-1");
    }

    #[test]
    fn stale_order_update_is_ignored() {
        let mut order = make_order(dec!(10));
        order.apply_order_update(&OrderUpdate::new("A", OrderState::Open, 5));

        let outcome = order.apply_order_update(&OrderUpdate::new("A", OrderState::Cancelled, 5));

        assert_eq!(outcome, UpdateOutcome::Stale { last_sequence: 5 });
        assert_eq!(order.current_state(), OrderState::Open);
    }

    #[test]
    fn same_state_update_is_unchanged() {
        let mut order = make_order(dec!(10));
        order.apply_order_update(&OrderUpdate::new("A", OrderState::Open, 1));

        let outcome = order.apply_order_update(
            &OrderUpdate::new("A", OrderState::Open, 2).with_exchange_order_id("EX-late"),
        );

        assert_eq!(outcome, UpdateOutcome::Unchanged);
        assert_eq!(order.exchange_order_id().unwrap().as_str(), "EX-late");
        assert_eq!(order.last_status_sequence(), Some(2));
    }

    #[test]
    fn backward_transition_is_rejected() {
        let mut order = make_order(dec!(10));
        order.apply_order_update(&OrderUpdate::new("A", OrderState::Cancelled, 1));

        let outcome = order.apply_order_update(&OrderUpdate::new("A", OrderState::Open, 2));

        assert!(matches!(
            outcome,
            UpdateOutcome::Rejected(UpdateRejection::InvalidTransition { .. })
        ));
        assert!(order.is_cancelled());
    }

    #[test]
    fn update_for_other_order_is_rejected() {
        let mut order = make_order(dec!(10));
        let outcome = order.apply_order_update(&OrderUpdate::new("B", OrderState::Open, 1));

        assert_eq!(
            outcome,
            UpdateOutcome::Rejected(UpdateRejection::MismatchedOrder)
        );
        assert!(order.last_status_sequence().is_none());
    }

    #[test]
    fn partial_fill_accumulates_without_state_change() {
        let mut order = make_order(dec!(10));
        order.apply_order_update(&OrderUpdate::new("A", OrderState::Open, 1));

        let outcome = order.apply_trade_update(&fill("t-1", dec!(4), 1));

        assert_eq!(outcome, UpdateOutcome::Applied);
        assert_eq!(order.executed_amount_base(), dec!(4));
        assert_eq!(order.executed_amount_quote(), dec!(400));
        assert_eq!(order.last_filled_amount(), dec!(4));
        assert_eq!(order.cumulative_fee_paid(), dec!(0.1));
        assert_eq!(order.fee_asset(), Some("USDT"));
        assert!(order.is_open());
    }

    #[test]
    fn completing_fill_moves_to_filled() {
        let mut order = make_order(dec!(10));
        order.apply_order_update(&OrderUpdate::new("A", OrderState::Open, 1));
        order.apply_trade_update(&fill("t-1", dec!(4), 1));

        order.apply_trade_update(&fill("t-2", dec!(6), 2));

        assert!(order.is_filled());
        assert_eq!(order.executed_amount_base(), dec!(10));
        assert_eq!(order.cumulative_fee_paid(), dec!(0.2));
        assert_eq!(order.average_executed_price(), Some(dec!(100)));
    }

    #[test]
    fn trade_channel_is_independent_of_status_channel() {
        let mut order = make_order(dec!(10));
        order.apply_order_update(&OrderUpdate::new("A", OrderState::Open, 7));

        let outcome = order.apply_trade_update(&fill("t-1", dec!(1), 1));

        assert_eq!(outcome, UpdateOutcome::Applied);
    }

    #[test]
    fn replayed_trade_is_stale() {
        let mut order = make_order(dec!(10));
        order.apply_trade_update(&fill("t-1", dec!(4), 1));

        let outcome = order.apply_trade_update(&fill("t-1", dec!(4), 1));

        assert_eq!(outcome, UpdateOutcome::Stale { last_sequence: 1 });
        assert_eq!(order.executed_amount_base(), dec!(4));
    }

    #[test]
    fn duplicate_trade_id_with_new_sequence_is_rejected() {
        let mut order = make_order(dec!(10));
        order.apply_trade_update(&fill("t-1", dec!(4), 1));

        let outcome = order.apply_trade_update(&fill("t-1", dec!(4), 2));

        assert!(matches!(
            outcome,
            UpdateOutcome::Rejected(UpdateRejection::DuplicateTrade { .. })
        ));
        assert_eq!(order.executed_amount_base(), dec!(4));
    }

    #[test]
    fn empty_fill_is_rejected() {
        let mut order = make_order(dec!(10));
        let outcome = order.apply_trade_update(&fill("t-1", Decimal::ZERO, 1));

        assert_eq!(outcome, UpdateOutcome::Rejected(UpdateRejection::EmptyFill));
        assert_eq!(order.executed_amount_base(), Decimal::ZERO);
    }

    #[test]
    fn late_fill_on_cancelled_order_keeps_state() {
        let mut order = make_order(dec!(10));
        order.apply_order_update(&OrderUpdate::new("A", OrderState::Cancelled, 1));

        let outcome = order.apply_trade_update(&fill("t-1", dec!(10), 1));

        assert_eq!(outcome, UpdateOutcome::Applied);
        assert!(order.is_cancelled());
        assert_eq!(order.executed_amount_base(), dec!(10));
    }

    #[test]
    fn fees_in_other_assets_are_kept_separately() {
        let mut order = make_order(dec!(10));
        order.apply_trade_update(&fill("t-1", dec!(1), 1));
        order.apply_trade_update(&TradeUpdate::new(
            "t-2",
            "A",
            dec!(100),
            dec!(1),
            TradeFee::new("BNB", dec!(0.01)),
            2,
        ));

        assert_eq!(order.cumulative_fee_paid(), dec!(0.1));
        assert_eq!(order.fees_paid().get("BNB"), Some(&dec!(0.01)));
        assert_eq!(order.latest_trade_fee().unwrap().asset, "BNB");
    }

    #[test]
    fn terminal_event_flag() {
        let mut order = make_order(dec!(10));
        assert!(!order.terminal_event_emitted());
        order.mark_terminal_event_emitted();
        assert!(order.terminal_event_emitted());
    }
}
