//! In-process event bus.
//!
//! Listeners subscribe per event tag and are called synchronously in
//! registration order. A listener that errors or panics is logged and counted;
//! delivery continues with the next listener.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::application::ports::{EventListener, EventSink};
use crate::domain::order_tracking::events::{MarketEvent, MarketEventTag};
use crate::observability;

/// Handle returned by [`EventBus::add_listener`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Subscribers = Vec<(ListenerId, Arc<dyn EventListener>)>;

/// Tag-keyed, synchronous event bus.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<BTreeMap<MarketEventTag, Subscribers>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: BTreeMap<MarketEventTag, usize> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(tag, subs)| (*tag, subs.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

impl EventBus {
    /// Create a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to events tagged `tag`.
    pub fn add_listener(&self, tag: MarketEventTag, listener: Arc<dyn EventListener>) -> ListenerId {
        let id = self.allocate_id();
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(tag)
            .or_default()
            .push((id, listener));
        id
    }

    /// Subscribe `listener` to every event tag under a single id.
    pub fn add_listener_for_all(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        let id = self.allocate_id();
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        for tag in MarketEventTag::ALL {
            listeners
                .entry(tag)
                .or_default()
                .push((id, Arc::clone(&listener)));
        }
        id
    }

    /// Unsubscribe a listener from one tag. Returns whether it was subscribed.
    pub fn remove_listener(&self, tag: MarketEventTag, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let Some(subs) = listeners.get_mut(&tag) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|(sub_id, _)| *sub_id != id);
        before != subs.len()
    }

    /// Unsubscribe a listener from every tag. Returns how many subscriptions
    /// were removed.
    pub fn remove_listener_from_all(&self, id: ListenerId) -> usize {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        listeners
            .values_mut()
            .map(|subs| {
                let before = subs.len();
                subs.retain(|(sub_id, _)| *sub_id != id);
                before - subs.len()
            })
            .sum()
    }

    /// Number of listeners subscribed to `tag`.
    #[must_use]
    pub fn listener_count(&self, tag: MarketEventTag) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tag)
            .map_or(0, Vec::len)
    }

    fn allocate_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn subscribers(&self, tag: MarketEventTag) -> Subscribers {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tag)
            .cloned()
            .unwrap_or_default()
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: &MarketEvent) {
        let tag = event.tag();

        // Listeners run without the registry lock so they may (un)subscribe.
        for (_, listener) in self.subscribers(tag) {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(
                        listener = listener.name(),
                        event = %tag,
                        client_order_id = %event.client_order_id(),
                        error = %e,
                        "Event listener failed"
                    );
                    observability::record_listener_failure(tag.as_str());
                }
                Err(_) => {
                    tracing::error!(
                        listener = listener.name(),
                        event = %tag,
                        client_order_id = %event.client_order_id(),
                        "Event listener panicked"
                    );
                    observability::record_listener_failure(tag.as_str());
                }
            }
        }
    }
}
