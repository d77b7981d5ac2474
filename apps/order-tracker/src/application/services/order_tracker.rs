//! In-Flight Order Tracker
//!
//! Routes order-status and fill updates to the matching tracked order,
//! publishes the lifecycle events each accepted change produced, and retires
//! orders into the cache once they reach a terminal state.
//!
//! Updates for the same order are serialized on the order's update lock,
//! which is held for apply, emission and retirement, so events of one order
//! reach listeners in the order they happened. The order data is only locked
//! while the update is applied; listeners run after that lock is released
//! and may read any order through the tracker. A listener must not submit an
//! update for the order whose event it is handling.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::application::ports::EventSink;
use crate::config::TrackerConfig;
use crate::domain::order_tracking::{
    EventEmissionPolicy, InFlightOrder, MarketEvent, OrderSnapshot, OrderUpdate,
    TerminalEventPolicy, TrackingError, TradeUpdate, UpdateChannel, UpdateOutcome,
    UpdateRejection,
};
use crate::domain::shared::{ClientOrderId, Clock, SystemClock};
use crate::infrastructure::persistence::{SharedOrder, TrackingStore};
use crate::observability;

/// Result of processing one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResult {
    /// The order changed; `events` were published in this order.
    Applied {
        /// Published events.
        events: Vec<MarketEvent>,
    },
    /// The update was accepted but changed nothing.
    Unchanged,
    /// The update was not applied.
    Ignored(TrackingError),
}

impl ProcessResult {
    /// Events published for this update.
    #[must_use]
    pub fn events(&self) -> &[MarketEvent] {
        match self {
            Self::Applied { events } => events,
            Self::Unchanged | Self::Ignored(_) => &[],
        }
    }

    /// Whether the order changed.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// The reason the update was not applied, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&TrackingError> {
        match self {
            Self::Ignored(e) => Some(e),
            Self::Applied { .. } | Self::Unchanged => None,
        }
    }
}

/// Monitoring snapshot of the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerStatus {
    /// Number of active orders.
    pub active_orders: usize,
    /// Number of live cached orders.
    pub cached_orders: usize,
    /// Active order ids, sorted.
    pub active_order_ids: Vec<ClientOrderId>,
    /// Cached order ids, sorted.
    pub cached_order_ids: Vec<ClientOrderId>,
    /// Tracker clock reading (Unix ms).
    pub timestamp: i64,
}

/// Events produced by an applied update.
struct Emission {
    events: Vec<MarketEvent>,
    /// Set when the order reached a terminal state.
    retire: Option<ClientOrderId>,
}

/// Tracks in-flight orders and turns their updates into market events.
pub struct InFlightOrderTracker {
    store: TrackingStore,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    terminal_policy: TerminalEventPolicy,
}

impl std::fmt::Debug for InFlightOrderTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightOrderTracker")
            .field("store", &self.store)
            .field("terminal_policy", &self.terminal_policy)
            .finish_non_exhaustive()
    }
}

impl InFlightOrderTracker {
    /// Create a tracker publishing to `sink` and reading time from `clock`.
    #[must_use]
    pub fn new(config: &TrackerConfig, sink: Arc<dyn EventSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: TrackingStore::new(config.cache_capacity, config.cache_ttl(), Arc::clone(&clock)),
            sink,
            clock,
            terminal_policy: config.terminal_event_policy,
        }
    }

    /// Create a tracker with default settings and the system clock.
    #[must_use]
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self::new(&TrackerConfig::default(), sink, Arc::new(SystemClock::new()))
    }

    /// Current tracker time in Unix milliseconds.
    #[must_use]
    pub fn current_timestamp(&self) -> i64 {
        self.clock.now().unix_millis()
    }

    /// Policy applied to changes on orders that already published their
    /// terminal event.
    #[must_use]
    pub const fn terminal_event_policy(&self) -> TerminalEventPolicy {
        self.terminal_policy
    }

    // ========================================================================
    // Tracking
    // ========================================================================

    /// Begin tracking an order, replacing any active order with the same id.
    pub fn start_tracking(&self, order: InFlightOrder) {
        tracing::debug!(
            client_order_id = %order.client_order_id(),
            trading_pair = order.trading_pair(),
            "Started tracking order"
        );
        self.store.start_tracking(order);
        self.report_gauges();
    }

    /// Move an active order into the cache. Returns whether it was active.
    pub fn stop_tracking(&self, id: &ClientOrderId) -> bool {
        let Some(evicted) = self.store.stop_tracking(id) else {
            return false;
        };
        tracing::debug!(client_order_id = %id, "Stopped tracking order");
        observability::record_cache_evictions(evicted);
        self.report_gauges();
        true
    }

    /// Snapshot of an active order.
    #[must_use]
    pub fn fetch_active(&self, id: &ClientOrderId) -> Option<InFlightOrder> {
        self.store.fetch_active(id)
    }

    /// Snapshot of a cached order.
    #[must_use]
    pub fn fetch_cached(&self, id: &ClientOrderId) -> Option<InFlightOrder> {
        self.store.fetch_cached(id)
    }

    /// Snapshot of the active order, else the cached one.
    #[must_use]
    pub fn fetch(&self, id: &ClientOrderId) -> Option<InFlightOrder> {
        self.store.fetch(id)
    }

    /// Snapshots of all active orders.
    #[must_use]
    pub fn active_orders(&self) -> HashMap<ClientOrderId, InFlightOrder> {
        self.store.active_orders()
    }

    /// Snapshots of all live cached orders.
    #[must_use]
    pub fn cached_orders(&self) -> HashMap<ClientOrderId, InFlightOrder> {
        self.store.cached_orders()
    }

    /// Drop expired cache entries. Returns the number dropped.
    pub fn purge_expired(&self) -> usize {
        let purged = self.store.purge_expired();
        if purged > 0 {
            observability::record_cache_evictions(purged);
            self.report_gauges();
        }
        purged
    }

    /// Monitoring snapshot.
    #[must_use]
    pub fn status(&self) -> TrackerStatus {
        let mut active_order_ids: Vec<_> = self.store.active_orders().into_keys().collect();
        let mut cached_order_ids: Vec<_> = self.store.cached_orders().into_keys().collect();
        active_order_ids.sort();
        cached_order_ids.sort();

        TrackerStatus {
            active_orders: active_order_ids.len(),
            cached_orders: cached_order_ids.len(),
            active_order_ids,
            cached_order_ids,
            timestamp: self.current_timestamp(),
        }
    }

    // ========================================================================
    // Update Processing
    // ========================================================================

    /// Apply an order-status update and publish the events it produced.
    pub fn process_order_update(&self, update: &OrderUpdate) -> ProcessResult {
        let channel = UpdateChannel::Status;
        let Some(handle) = self.store.resolve(&update.client_order_id) else {
            return self.unknown_order(&update.client_order_id, channel);
        };

        self.process(&handle, channel, update.sequence, |order| {
            order.apply_order_update(update)
        })
    }

    /// Apply a fill and publish the events it produced.
    pub fn process_trade_update(&self, trade: &TradeUpdate) -> ProcessResult {
        let channel = UpdateChannel::Trade;
        let Some(handle) = self.store.resolve(&trade.client_order_id) else {
            return self.unknown_order(&trade.client_order_id, channel);
        };

        self.process(&handle, channel, trade.sequence, |order| {
            order.apply_trade_update(trade)
        })
    }

    fn process(
        &self,
        handle: &SharedOrder,
        channel: UpdateChannel,
        sequence: u64,
        apply: impl FnOnce(&mut InFlightOrder) -> UpdateOutcome,
    ) -> ProcessResult {
        let _processing = handle.begin_update();

        let settled = {
            let mut order = handle.record();
            let previous = order.snapshot();
            let outcome = apply(&mut order);
            self.settle(&mut order, previous, outcome, channel, sequence)
        };
        let emission = match settled {
            Ok(emission) => emission,
            Err(result) => return result,
        };

        // Record lock released: listeners may read the tracker.
        self.sink.publish_all(&emission.events);

        if let Some(id) = emission.retire {
            self.stop_tracking(&id);
        }

        ProcessResult::Applied {
            events: emission.events,
        }
    }

    fn unknown_order(&self, id: &ClientOrderId, channel: UpdateChannel) -> ProcessResult {
        tracing::warn!(
            client_order_id = %id,
            channel = %channel,
            "Order {} no longer being tracked",
            id
        );
        observability::record_unknown_order(channel.as_str());
        ProcessResult::Ignored(TrackingError::UnknownOrder {
            client_order_id: id.to_string(),
        })
    }

    /// Turn an apply outcome into the events to publish, or the result to
    /// return when nothing is published.
    fn settle(
        &self,
        order: &mut InFlightOrder,
        previous: OrderSnapshot,
        outcome: UpdateOutcome,
        channel: UpdateChannel,
        sequence: u64,
    ) -> Result<Emission, ProcessResult> {
        let client_order_id = order.client_order_id().to_string();

        match outcome {
            UpdateOutcome::Applied => {}
            UpdateOutcome::Unchanged => return Err(ProcessResult::Unchanged),
            UpdateOutcome::Stale { last_sequence } => {
                tracing::debug!(
                    client_order_id = %client_order_id,
                    channel = %channel,
                    sequence,
                    last_sequence,
                    "Ignoring stale update"
                );
                observability::record_stale_update(channel.as_str());
                return Err(ProcessResult::Ignored(TrackingError::StaleUpdate {
                    client_order_id,
                    channel,
                    sequence,
                    last_sequence,
                }));
            }
            UpdateOutcome::Rejected(rejection) => {
                tracing::warn!(
                    client_order_id = %client_order_id,
                    channel = %channel,
                    sequence,
                    reason = %rejection,
                    "Rejected update"
                );
                observability::record_rejected_update(channel.as_str(), rejection.code());
                let error = match rejection {
                    UpdateRejection::InvalidTransition { from, to } => {
                        TrackingError::InvalidTransition {
                            client_order_id,
                            from,
                            to,
                        }
                    }
                    other => TrackingError::RejectedUpdate {
                        client_order_id,
                        channel,
                        reason: other.to_string(),
                    },
                };
                return Err(ProcessResult::Ignored(error));
            }
        }

        let events = EventEmissionPolicy::events_for(
            &previous,
            order,
            channel,
            self.clock.now(),
            self.terminal_policy,
        );

        for event in &events {
            log_event(order, event);
            observability::record_event_emitted(event.event_type());
        }
        if events.iter().any(MarketEvent::is_terminal) {
            order.mark_terminal_event_emitted();
        }

        Ok(Emission {
            events,
            retire: order.is_done().then(|| order.client_order_id().clone()),
        })
    }

    fn report_gauges(&self) {
        observability::update_tracked_orders(self.store.active_count(), self.store.cached_count());
    }
}

fn log_event(order: &InFlightOrder, event: &MarketEvent) {
    let id = order.client_order_id();
    match event {
        MarketEvent::BuyOrderCreated(_) | MarketEvent::SellOrderCreated(_) => {
            tracing::info!(
                client_order_id = %id,
                "Created {} {} order {} for {} {}.",
                order.order_type(),
                order.trade_type(),
                id,
                order.amount(),
                order.trading_pair()
            );
        }
        MarketEvent::OrderFilled(_) => {
            tracing::info!(
                client_order_id = %id,
                "The {} order {} amounting to {}/{} {} has been filled.",
                order.trade_type(),
                id,
                order.executed_amount_base(),
                order.amount(),
                order.base_asset()
            );
        }
        MarketEvent::BuyOrderCompleted(_) | MarketEvent::SellOrderCompleted(_) => {
            tracing::info!(
                client_order_id = %id,
                "{} order {} completely filled.",
                order.trade_type(),
                id
            );
        }
        MarketEvent::OrderCancelled(_) => {
            tracing::info!(client_order_id = %id, "Successfully cancelled order {}.", id);
        }
        MarketEvent::OrderFailure(_) => {
            tracing::info!(client_order_id = %id, "Order {} has failed.", id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::RecordingEventSink;
    use crate::domain::order_tracking::{
        CreateOrderCommand, MarketEventTag, OrderState, OrderType, TradeFee, TradeType,
    };
    use crate::domain::shared::ManualClock;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    struct Fixture {
        clock: Arc<ManualClock>,
        sink: Arc<RecordingEventSink>,
        tracker: InFlightOrderTracker,
    }

    fn fixture(policy: TerminalEventPolicy) -> Fixture {
        let clock = Arc::new(ManualClock::starting_at(1_700_000_000_000));
        let sink = Arc::new(RecordingEventSink::new());
        let config = TrackerConfig {
            terminal_event_policy: policy,
            ..TrackerConfig::default()
        };
        let tracker = InFlightOrderTracker::new(&config, sink.clone(), clock.clone());
        Fixture {
            clock,
            sink,
            tracker,
        }
    }

    fn order(id: &str, amount: rust_decimal::Decimal) -> InFlightOrder {
        InFlightOrder::new(CreateOrderCommand {
            client_order_id: ClientOrderId::new(id),
            trading_pair: "BTC-USDT".to_string(),
            order_type: OrderType::Limit,
            trade_type: TradeType::Buy,
            amount,
            price: dec!(100),
            exchange_order_id: None,
            creation_timestamp: 0,
        })
    }

    fn id(s: &str) -> ClientOrderId {
        ClientOrderId::new(s)
    }

    #[test]
    fn unknown_order_is_ignored() {
        let f = fixture(TerminalEventPolicy::Once);

        let result = f
            .tracker
            .process_order_update(&OrderUpdate::new("ghost", OrderState::Open, 1));

        assert!(matches!(
            result,
            ProcessResult::Ignored(TrackingError::UnknownOrder { .. })
        ));
        assert!(f.sink.events().is_empty());
    }

    #[test]
    fn open_emits_created_and_stays_active() {
        let f = fixture(TerminalEventPolicy::Once);
        f.tracker.start_tracking(order("A", dec!(10)));

        let result = f
            .tracker
            .process_order_update(&OrderUpdate::new("A", OrderState::Open, 1));

        assert!(result.is_applied());
        assert_eq!(f.sink.tags(), vec![MarketEventTag::BuyOrderCreated]);
        assert_eq!(
            f.sink.events()[0].timestamp().unix_millis(),
            f.tracker.current_timestamp()
        );
        assert!(f.tracker.fetch_active(&id("A")).is_some());
    }

    #[test]
    fn same_state_update_is_unchanged() {
        let f = fixture(TerminalEventPolicy::Once);
        f.tracker.start_tracking(order("A", dec!(10)));
        f.tracker
            .process_order_update(&OrderUpdate::new("A", OrderState::Open, 1));

        let result = f
            .tracker
            .process_order_update(&OrderUpdate::new("A", OrderState::Open, 2));

        assert_eq!(result, ProcessResult::Unchanged);
        assert_eq!(f.sink.events().len(), 1);
    }

    #[test]
    fn stale_update_reports_sequences() {
        let f = fixture(TerminalEventPolicy::Once);
        f.tracker.start_tracking(order("A", dec!(10)));
        f.tracker
            .process_order_update(&OrderUpdate::new("A", OrderState::Open, 4));

        let result = f
            .tracker
            .process_order_update(&OrderUpdate::new("A", OrderState::Cancelled, 3));

        assert_eq!(
            result.error(),
            Some(&TrackingError::StaleUpdate {
                client_order_id: "A".to_string(),
                channel: UpdateChannel::Status,
                sequence: 3,
                last_sequence: 4,
            })
        );
        assert!(f.tracker.fetch_active(&id("A")).is_some());
    }

    #[test]
    fn invalid_transition_is_reported() {
        let f = fixture(TerminalEventPolicy::Once);
        f.tracker.start_tracking(order("A", dec!(10)));
        f.tracker
            .process_order_update(&OrderUpdate::new("A", OrderState::Failed, 1));

        let result = f
            .tracker
            .process_order_update(&OrderUpdate::new("A", OrderState::Open, 2));

        assert!(matches!(
            result,
            ProcessResult::Ignored(TrackingError::InvalidTransition {
                from: OrderState::Failed,
                to: OrderState::Open,
                ..
            })
        ));
    }

    #[test]
    fn duplicate_trade_is_reported() {
        let f = fixture(TerminalEventPolicy::Once);
        f.tracker.start_tracking(order("A", dec!(10)));
        let fill = TradeUpdate::new("t-1", "A", dec!(100), dec!(1), TradeFee::zero("USDT"), 1);
        f.tracker.process_trade_update(&fill);

        let mut replay = fill;
        replay.sequence = 2;
        let result = f.tracker.process_trade_update(&replay);

        assert!(matches!(
            result,
            ProcessResult::Ignored(TrackingError::RejectedUpdate { .. })
        ));
        assert_eq!(
            f.tracker.fetch(&id("A")).unwrap().executed_amount_base(),
            dec!(1)
        );
    }

    #[test]
    fn terminal_update_retires_order() {
        let f = fixture(TerminalEventPolicy::Once);
        f.tracker.start_tracking(order("A", dec!(10)));

        f.tracker
            .process_order_update(&OrderUpdate::new("A", OrderState::Cancelled, 1));

        assert!(f.tracker.fetch_active(&id("A")).is_none());
        let cached = f.tracker.fetch_cached(&id("A")).unwrap();
        assert!(cached.is_cancelled());
        assert!(cached.terminal_event_emitted());
        assert_eq!(f.sink.tags(), vec![MarketEventTag::OrderCancelled]);
    }

    #[test]
    fn retired_order_expires_from_cache() {
        let f = fixture(TerminalEventPolicy::Once);
        f.tracker.start_tracking(order("A", dec!(10)));
        f.tracker
            .process_order_update(&OrderUpdate::new("A", OrderState::Cancelled, 1));

        f.clock.advance(Duration::from_secs(30));

        assert!(f.tracker.fetch(&id("A")).is_none());
        assert!(matches!(
            f.tracker
                .process_order_update(&OrderUpdate::new("A", OrderState::Cancelled, 2)),
            ProcessResult::Ignored(TrackingError::UnknownOrder { .. })
        ));
    }

    #[test]
    fn status_lists_ids() {
        let f = fixture(TerminalEventPolicy::Once);
        f.tracker.start_tracking(order("B", dec!(1)));
        f.tracker.start_tracking(order("A", dec!(1)));
        f.tracker.start_tracking(order("C", dec!(1)));
        f.tracker.stop_tracking(&id("C"));

        let status = f.tracker.status();

        assert_eq!(status.active_orders, 2);
        assert_eq!(status.active_order_ids, vec![id("A"), id("B")]);
        assert_eq!(status.cached_order_ids, vec![id("C")]);
        assert_eq!(status.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn with_sink_uses_default_settings() {
        let sink = Arc::new(RecordingEventSink::new());
        let tracker = InFlightOrderTracker::with_sink(sink.clone());
        tracker.start_tracking(order("A", dec!(1)));

        tracker.process_order_update(&OrderUpdate::new("A", OrderState::Failed, 1));

        assert_eq!(tracker.terminal_event_policy(), TerminalEventPolicy::Once);
        assert_eq!(sink.tags(), vec![MarketEventTag::OrderFailure]);
        assert!(tracker.current_timestamp() > 0);
    }

    #[test]
    fn stop_tracking_reports_whether_active() {
        let f = fixture(TerminalEventPolicy::Once);
        f.tracker.start_tracking(order("A", dec!(1)));

        assert!(f.tracker.stop_tracking(&id("A")));
        assert!(!f.tracker.stop_tracking(&id("A")));
    }

    #[test]
    fn purge_expired_drops_cached_orders() {
        let f = fixture(TerminalEventPolicy::Once);
        f.tracker.start_tracking(order("A", dec!(1)));
        f.tracker.stop_tracking(&id("A"));
        f.clock.advance(Duration::from_secs(31));

        assert_eq!(f.tracker.purge_expired(), 1);
        assert!(f.tracker.cached_orders().is_empty());
    }
}
