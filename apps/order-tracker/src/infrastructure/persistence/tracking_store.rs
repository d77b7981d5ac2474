//! In-memory tracking store.
//!
//! Owns the active order map and the cache of retired orders. Orders are
//! shared as [`TrackedOrder`] handles carrying two locks:
//!
//! - the update lock serializes processing of one order (apply, emission
//!   and retirement) while different orders proceed in parallel;
//! - the record lock guards the order data and is only held for short reads
//!   and writes, never across event delivery.
//!
//! Lock order is update, then record, then maps. Map locks are released
//! before any order lock is taken, and the record lock is never held while
//! taking a map lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::domain::order_tracking::InFlightOrder;
use crate::domain::shared::{ClientOrderId, Clock};
use crate::infrastructure::cache::BoundedTtlCache;

/// A tracked order and the locks coordinating access to it.
#[derive(Debug)]
pub struct TrackedOrder {
    update: Mutex<()>,
    record: Mutex<InFlightOrder>,
}

impl TrackedOrder {
    /// Wrap an order for tracking.
    #[must_use]
    pub fn new(order: InFlightOrder) -> Self {
        Self {
            update: Mutex::new(()),
            record: Mutex::new(order),
        }
    }

    /// Serialize update processing for this order. Reads through
    /// [`Self::record`] do not wait on this lock.
    pub fn begin_update(&self) -> MutexGuard<'_, ()> {
        self.update.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the order data, recovering the guard if a holder panicked.
    pub fn record(&self) -> MutexGuard<'_, InFlightOrder> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the order data.
    #[must_use]
    pub fn snapshot(&self) -> InFlightOrder {
        self.record().clone()
    }
}

/// Shared handle to a tracked order.
pub type SharedOrder = Arc<TrackedOrder>;

/// Active and recently retired orders.
#[derive(Debug)]
pub struct TrackingStore {
    active: RwLock<HashMap<ClientOrderId, SharedOrder>>,
    cached: Mutex<BoundedTtlCache<ClientOrderId, SharedOrder>>,
}

impl TrackingStore {
    /// Create an empty store whose cache holds `capacity` orders for `ttl`.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            active: RwLock::new(HashMap::new()),
            cached: Mutex::new(BoundedTtlCache::new(capacity, ttl, clock)),
        }
    }

    /// Begin tracking an order, replacing any active order with the same id.
    pub fn start_tracking(&self, order: InFlightOrder) -> SharedOrder {
        let id = order.client_order_id().clone();
        let handle = Arc::new(TrackedOrder::new(order));
        self.write_active().insert(id, Arc::clone(&handle));
        handle
    }

    /// Move an active order into the cache.
    ///
    /// Returns the number of cache entries displaced by the insert, or `None`
    /// when the order was not active.
    pub fn stop_tracking(&self, id: &ClientOrderId) -> Option<usize> {
        let handle = self.write_active().remove(id)?;
        Some(self.lock_cache().put(id.clone(), handle))
    }

    /// Handle of the active order, else the cached one.
    pub fn resolve(&self, id: &ClientOrderId) -> Option<SharedOrder> {
        self.active_handle(id).or_else(|| self.cached_handle(id))
    }

    /// Whether the order is actively tracked.
    #[must_use]
    pub fn is_active(&self, id: &ClientOrderId) -> bool {
        self.read_active().contains_key(id)
    }

    /// Snapshot of an active order.
    #[must_use]
    pub fn fetch_active(&self, id: &ClientOrderId) -> Option<InFlightOrder> {
        self.active_handle(id).map(|h| h.snapshot())
    }

    /// Snapshot of a cached order.
    #[must_use]
    pub fn fetch_cached(&self, id: &ClientOrderId) -> Option<InFlightOrder> {
        self.cached_handle(id).map(|h| h.snapshot())
    }

    /// Snapshot of the active order, else the cached one.
    #[must_use]
    pub fn fetch(&self, id: &ClientOrderId) -> Option<InFlightOrder> {
        self.resolve(id).map(|h| h.snapshot())
    }

    /// Snapshots of all active orders.
    #[must_use]
    pub fn active_orders(&self) -> HashMap<ClientOrderId, InFlightOrder> {
        let handles: Vec<(ClientOrderId, SharedOrder)> = self
            .read_active()
            .iter()
            .map(|(id, h)| (id.clone(), Arc::clone(h)))
            .collect();

        snapshot_all(handles)
    }

    /// Snapshots of all live cached orders.
    #[must_use]
    pub fn cached_orders(&self) -> HashMap<ClientOrderId, InFlightOrder> {
        let handles: Vec<(ClientOrderId, SharedOrder)> = self
            .lock_cache()
            .iter_live()
            .map(|(id, h)| (id.clone(), Arc::clone(h)))
            .collect();

        snapshot_all(handles)
    }

    /// Number of active orders.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.read_active().len()
    }

    /// Number of live cached orders.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.lock_cache().len()
    }

    /// Drop expired cache entries. Returns the number dropped.
    pub fn purge_expired(&self) -> usize {
        self.lock_cache().purge_expired()
    }

    fn active_handle(&self, id: &ClientOrderId) -> Option<SharedOrder> {
        self.read_active().get(id).cloned()
    }

    fn cached_handle(&self, id: &ClientOrderId) -> Option<SharedOrder> {
        self.lock_cache().get(id).cloned()
    }

    fn read_active(&self) -> RwLockReadGuard<'_, HashMap<ClientOrderId, SharedOrder>> {
        self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_active(&self) -> RwLockWriteGuard<'_, HashMap<ClientOrderId, SharedOrder>> {
        self.active.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cache(&self) -> MutexGuard<'_, BoundedTtlCache<ClientOrderId, SharedOrder>> {
        self.cached.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn snapshot_all(handles: Vec<(ClientOrderId, SharedOrder)>) -> HashMap<ClientOrderId, InFlightOrder> {
    handles
        .into_iter()
        .map(|(id, h)| (id, h.snapshot()))
        .collect()
}
