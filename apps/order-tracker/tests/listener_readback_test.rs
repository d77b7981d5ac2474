//! Listeners reading the tracker while handling an event.
//!
//! Status collaborators subscribe to the event bus and look the order up
//! again from inside their handler; delivery must not block on the order
//! being processed.

#![allow(clippy::unwrap_used)]

use std::sync::mpsc;
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use rust_decimal_macros::dec;

use order_tracker::config::TrackerConfig;
use order_tracker::{
    ClientOrderId, Container, CreateOrderCommand, EventListener, InFlightOrder,
    InFlightOrderTracker, ListenerError, ManualClock, MarketEvent, MarketEventTag, OrderState,
    OrderType, OrderUpdate, TradeFee, TradeType, TradeUpdate,
};

const DEADLINE: Duration = Duration::from_secs(3);

/// Looks up the event's order and the tracker status on every event.
#[derive(Default)]
struct ReadBack {
    tracker: OnceLock<Arc<InFlightOrderTracker>>,
    seen: Mutex<Vec<(MarketEventTag, Option<OrderState>, usize)>>,
}

impl EventListener for ReadBack {
    fn on_event(&self, event: &MarketEvent) -> Result<(), ListenerError> {
        let tracker = self.tracker.get().unwrap();
        let state = tracker
            .fetch(event.client_order_id())
            .map(|order| order.current_state());
        let active = tracker.status().active_orders;
        assert_eq!(tracker.active_orders().len(), active);
        self.seen.lock().unwrap().push((event.tag(), state, active));
        Ok(())
    }
}

fn setup() -> (Arc<InFlightOrderTracker>, Arc<ReadBack>) {
    let container = Container::new(
        &TrackerConfig::default(),
        Arc::new(ManualClock::starting_at(0)),
    );
    let listener = Arc::new(ReadBack::default());
    container.event_bus().add_listener_for_all(listener.clone());
    let tracker = container.tracker();
    assert!(listener.tracker.set(Arc::clone(&tracker)).is_ok());

    tracker.start_tracking(InFlightOrder::new(CreateOrderCommand {
        client_order_id: ClientOrderId::new("R"),
        trading_pair: "BTC-USDT".to_string(),
        order_type: OrderType::Limit,
        trade_type: TradeType::Buy,
        amount: dec!(2),
        price: dec!(100),
        exchange_order_id: None,
        creation_timestamp: 0,
    }));
    (tracker, listener)
}

/// Run `work` on another thread, failing the test if it does not return in
/// time.
fn within_deadline(work: impl FnOnce() + Send + 'static) {
    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        work();
        done_tx.send(()).unwrap();
    });
    assert!(
        done_rx.recv_timeout(DEADLINE).is_ok(),
        "update processing did not return"
    );
}

#[test]
fn listener_can_fetch_order_being_processed() {
    let (tracker, listener) = setup();

    let worker = Arc::clone(&tracker);
    within_deadline(move || {
        worker.process_order_update(&OrderUpdate::new("R", OrderState::Open, 1));
    });

    assert_eq!(
        *listener.seen.lock().unwrap(),
        vec![(MarketEventTag::BuyOrderCreated, Some(OrderState::Open), 1)]
    );
}

#[test]
fn listener_sees_final_fill_before_retirement() {
    let (tracker, listener) = setup();

    let worker = Arc::clone(&tracker);
    within_deadline(move || {
        worker.process_trade_update(&TradeUpdate::new(
            "T-1",
            "R",
            dec!(100),
            dec!(2),
            TradeFee::zero("USDT"),
            1,
        ));
    });

    assert_eq!(
        *listener.seen.lock().unwrap(),
        vec![
            (MarketEventTag::OrderFilled, Some(OrderState::Filled), 1),
            (MarketEventTag::BuyOrderCompleted, Some(OrderState::Filled), 1),
        ]
    );
    assert!(tracker.fetch_active(&ClientOrderId::new("R")).is_none());
    assert!(tracker.fetch_cached(&ClientOrderId::new("R")).is_some());
}

#[test]
fn later_updates_proceed_after_listener_readback() {
    let (tracker, listener) = setup();

    let worker = Arc::clone(&tracker);
    within_deadline(move || {
        worker.process_order_update(&OrderUpdate::new("R", OrderState::Open, 1));
        worker.process_order_update(&OrderUpdate::new("R", OrderState::Cancelled, 2));
    });

    let tags: Vec<_> = listener.seen.lock().unwrap().iter().map(|s| s.0).collect();
    assert_eq!(
        tags,
        vec![MarketEventTag::BuyOrderCreated, MarketEventTag::OrderCancelled]
    );
    assert!(tracker.status().active_order_ids.is_empty());
}
