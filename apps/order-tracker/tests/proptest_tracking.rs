//! Property-Based Tests for Order Tracking
//!
//! Random interleavings of status and trade updates, including duplicates and
//! out-of-order deliveries, must never break the tracking guarantees.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use rust_decimal::Decimal;

use order_tracker::config::TrackerConfig;
use order_tracker::{
    BoundedTtlCache, ClientOrderId, CreateOrderCommand, InFlightOrder, InFlightOrderTracker,
    ManualClock, OrderState, OrderType, OrderUpdate, RecordingEventSink, TradeFee, TradeType,
    TradeUpdate,
};

// =============================================================================
// Strategies
// =============================================================================

#[derive(Debug, Clone)]
enum Step {
    Status { state: OrderState, sequence: u64 },
    Trade { trade: u8, amount: u32, sequence: u64 },
}

fn state_strategy() -> impl Strategy<Value = OrderState> {
    prop_oneof![
        Just(OrderState::PendingCreate),
        Just(OrderState::Open),
        Just(OrderState::PartiallyFilled),
        Just(OrderState::Filled),
        Just(OrderState::Cancelled),
        Just(OrderState::Failed),
    ]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (state_strategy(), 0u64..20).prop_map(|(state, sequence)| Step::Status { state, sequence }),
        (0u8..10, 0u32..50, 0u64..20).prop_map(|(trade, amount, sequence)| Step::Trade {
            trade,
            amount,
            sequence,
        }),
    ]
}

const fn rank(state: OrderState) -> u8 {
    match state {
        OrderState::PendingCreate => 0,
        OrderState::Open | OrderState::PartiallyFilled => 1,
        OrderState::Filled | OrderState::Cancelled | OrderState::Failed => 2,
    }
}

fn make_tracker() -> (Arc<RecordingEventSink>, InFlightOrderTracker) {
    let sink = Arc::new(RecordingEventSink::new());
    let tracker = InFlightOrderTracker::new(
        &TrackerConfig::default(),
        sink.clone(),
        Arc::new(ManualClock::starting_at(0)),
    );
    (sink, tracker)
}

fn make_order(amount: u32) -> InFlightOrder {
    InFlightOrder::new(CreateOrderCommand {
        client_order_id: ClientOrderId::new("P"),
        trading_pair: "SOL-USDC".to_string(),
        order_type: OrderType::Limit,
        trade_type: TradeType::Sell,
        amount: Decimal::from(amount),
        price: Decimal::from(150),
        exchange_order_id: None,
        creation_timestamp: 0,
    })
}

fn apply(tracker: &InFlightOrderTracker, step: &Step) {
    match *step {
        Step::Status { state, sequence } => {
            tracker.process_order_update(&OrderUpdate::new("P", state, sequence));
        }
        Step::Trade {
            trade,
            amount,
            sequence,
        } => {
            tracker.process_trade_update(&TradeUpdate::new(
                format!("T-{trade}"),
                "P",
                Decimal::from(150),
                Decimal::from(amount),
                TradeFee::zero("USDC"),
                sequence,
            ));
        }
    }
}

// =============================================================================
// Tracker Properties
// =============================================================================

proptest! {
    /// Executed amount never decreases and state never moves backwards.
    #[test]
    fn order_progress_is_monotonic(
        amount in 1u32..200,
        steps in prop::collection::vec(step_strategy(), 1..60),
    ) {
        let (_, tracker) = make_tracker();
        tracker.start_tracking(make_order(amount));
        let id = ClientOrderId::new("P");

        let mut executed = Decimal::ZERO;
        let mut state_rank = 0;
        for step in &steps {
            apply(&tracker, step);
            let order = tracker.fetch(&id).unwrap();

            prop_assert!(order.executed_amount_base() >= executed);
            prop_assert!(rank(order.current_state()) >= state_rank);
            if rank(order.current_state()) == 2 {
                // Terminal states are absorbing.
                prop_assert!(order.is_done());
            }
            executed = order.executed_amount_base();
            state_rank = rank(order.current_state());
        }
    }

    /// Each trade id contributes at most once to the executed amount.
    #[test]
    fn executed_never_exceeds_distinct_fills(
        steps in prop::collection::vec(step_strategy(), 1..60),
    ) {
        let (_, tracker) = make_tracker();
        tracker.start_tracking(make_order(1_000));

        let mut largest_per_trade = [0u32; 10];
        for step in &steps {
            if let Step::Trade { trade, amount, .. } = *step {
                let slot = &mut largest_per_trade[usize::from(trade)];
                *slot = (*slot).max(amount);
            }
            apply(&tracker, step);
        }

        let bound: u32 = largest_per_trade.iter().sum();
        let order = tracker.fetch(&ClientOrderId::new("P")).unwrap();
        prop_assert!(order.executed_amount_base() <= Decimal::from(bound));
    }

    /// At most one terminal event is published per order.
    #[test]
    fn at_most_one_terminal_event(
        amount in 1u32..100,
        steps in prop::collection::vec(step_strategy(), 1..60),
    ) {
        let (sink, tracker) = make_tracker();
        tracker.start_tracking(make_order(amount));

        for step in &steps {
            apply(&tracker, step);
        }

        let terminal = sink.events().iter().filter(|e| e.is_terminal()).count();
        prop_assert!(terminal <= 1);
    }

    /// Replaying an already-applied update changes nothing.
    #[test]
    fn redelivery_is_absorbed(
        steps in prop::collection::vec(step_strategy(), 1..40),
    ) {
        let (sink, tracker) = make_tracker();
        tracker.start_tracking(make_order(500));
        let id = ClientOrderId::new("P");

        for step in &steps {
            apply(&tracker, step);
            let before = tracker.fetch(&id).unwrap();
            let published = sink.events().len();

            apply(&tracker, step);

            prop_assert_eq!(tracker.fetch(&id).unwrap(), before);
            prop_assert_eq!(sink.events().len(), published);
        }
    }
}

// =============================================================================
// Cache Properties
// =============================================================================

proptest! {
    /// The cache never holds more than its capacity.
    #[test]
    fn cache_respects_capacity(
        capacity in 1usize..32,
        keys in prop::collection::vec(0u16..100, 0..200),
    ) {
        let clock = Arc::new(ManualClock::starting_at(0));
        let mut cache = BoundedTtlCache::new(capacity, Duration::from_secs(30), clock);

        for key in keys {
            cache.put(key, ());
            prop_assert!(cache.len() <= capacity);
        }
    }

    /// Entries older than the TTL are never returned.
    #[test]
    fn cache_never_returns_expired_entries(
        ttl_ms in 1u64..1_000,
        gaps in prop::collection::vec(0u64..500, 1..50),
    ) {
        let clock = Arc::new(ManualClock::starting_at(0));
        let ttl = Duration::from_millis(ttl_ms);
        let mut cache = BoundedTtlCache::new(64, ttl, clock.clone());

        for (i, gap) in gaps.iter().enumerate() {
            cache.put(i, *gap);
            clock.advance(Duration::from_millis(*gap));
        }

        let mut age = 0;
        for (i, gap) in gaps.iter().enumerate().rev() {
            age += gap;
            let live = cache.peek(&i).is_some();
            prop_assert_eq!(live, age < ttl_ms);
        }
    }

    /// The most recently touched key survives one overflow.
    #[test]
    fn cache_keeps_most_recently_used(
        capacity in 2usize..16,
        touch in 0usize..16,
    ) {
        let touch = touch % capacity;
        let clock = Arc::new(ManualClock::starting_at(0));
        let mut cache = BoundedTtlCache::new(capacity, Duration::from_secs(30), clock);
        for key in 0..capacity {
            cache.put(key, ());
        }

        cache.get(&touch);
        cache.put(capacity, ());

        prop_assert!(cache.contains(&touch));
        prop_assert_eq!(cache.len(), capacity);
    }
}
