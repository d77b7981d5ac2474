//! Bounded TTL cache.
//!
//! Capacity- and age-limited key-value store with least-recently-used
//! eviction. Nodes live in a slab and are threaded onto two intrusive
//! doubly-linked lists: one by recency, one by insertion time. Expiry is lazy
//! and checked against the injected [`Clock`]; the insertion list keeps
//! counting and purging proportional to the number of expired entries.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::shared::Clock;

struct Node<K, V> {
    key: K,
    value: V,
    inserted_at: Duration,
    last_access: Duration,
    prev: Option<usize>,
    next: Option<usize>,
    older: Option<usize>,
    newer: Option<usize>,
}

/// Cache holding at most `capacity` entries, each reachable for `ttl`
/// after its last insertion.
pub struct BoundedTtlCache<K, V> {
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    index: HashMap<K, usize>,
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    /// Most recently used.
    head: Option<usize>,
    /// Least recently used.
    tail: Option<usize>,
    /// Earliest insertion.
    oldest: Option<usize>,
    /// Latest insertion.
    newest: Option<usize>,
}

impl<K, V> fmt::Debug for BoundedTtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedTtlCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("stored", &self.index.len())
            .finish_non_exhaustive()
    }
}

impl<K, V> BoundedTtlCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty cache.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            capacity,
            ttl,
            clock,
            index: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            oldest: None,
            newest: None,
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Time-to-live of each entry.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or overwrite an entry and mark it most recently used.
    ///
    /// Overwriting resets the entry's insertion time. When the insert pushes
    /// the cache over capacity, expired entries are dropped first and then
    /// least-recently-used ones. Returns the number of entries removed.
    pub fn put(&mut self, key: K, value: V) -> usize {
        let now = self.clock.monotonic();

        if let Some(&idx) = self.index.get(&key) {
            if let Some(node) = self.slots.get_mut(idx).and_then(Option::as_mut) {
                node.value = value;
                node.inserted_at = now;
                node.last_access = now;
            }
            self.move_to_front(idx);
            self.detach_age(idx);
            self.attach_newest(idx);
            return 0;
        }

        let idx = self.allocate(Node {
            key: key.clone(),
            value,
            inserted_at: now,
            last_access: now,
            prev: None,
            next: None,
            older: None,
            newer: None,
        });
        self.index.insert(key, idx);
        self.attach_front(idx);
        self.attach_newest(idx);

        let mut removed = 0;
        if self.index.len() > self.capacity {
            removed += self.purge_expired();
        }
        while self.index.len() > self.capacity {
            let Some(lru) = self.tail else { break };
            self.remove_slot(lru);
            removed += 1;
        }
        removed
    }

    /// Get a live entry and mark it most recently used.
    ///
    /// An expired entry is reclaimed and reported absent.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = self.clock.monotonic();
        let idx = *self.index.get(key)?;

        if self.slot_expired(idx, now) {
            self.remove_slot(idx);
            return None;
        }

        self.move_to_front(idx);
        let node = self.slots.get_mut(idx)?.as_mut()?;
        node.last_access = now;
        Some(&node.value)
    }

    /// Get a live entry without touching recency.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        let now = self.clock.monotonic();
        let idx = *self.index.get(key)?;
        let node = self.slots.get(idx)?.as_ref()?;
        self.is_live(node, now).then_some(&node.value)
    }

    /// Whether a live entry exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.peek(key).is_some()
    }

    /// Remove an entry, returning its value if it was still live.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let now = self.clock.monotonic();
        let idx = *self.index.get(key)?;
        let node = self.remove_slot(idx)?;
        self.is_live(&node, now).then_some(node.value)
    }

    /// Number of live entries.
    ///
    /// Only the expired prefix of the insertion list is visited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len() - self.expired_prefix().count()
    }

    /// Whether there are no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live entries from most to least recently used, without touching
    /// recency.
    pub fn iter_live(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            cursor: self.head,
            now: self.clock.monotonic(),
            ttl: self.ttl,
        }
    }

    /// Monotonic instant of the entry's last insertion, if live.
    #[must_use]
    pub fn inserted_at(&self, key: &K) -> Option<Duration> {
        self.live_node(key).map(|node| node.inserted_at)
    }

    /// Monotonic instant of the entry's last insertion or read, if live.
    #[must_use]
    pub fn last_access(&self, key: &K) -> Option<Duration> {
        self.live_node(key).map(|node| node.last_access)
    }

    /// Drop every expired entry. Returns the number dropped.
    pub fn purge_expired(&mut self) -> usize {
        let expired: Vec<usize> = self.expired_prefix().collect();
        for &idx in &expired {
            self.remove_slot(idx);
        }
        expired.len()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.oldest = None;
        self.newest = None;
    }

    // ========================================================================
    // Slab and list maintenance
    // ========================================================================

    fn is_live(&self, node: &Node<K, V>, now: Duration) -> bool {
        now.saturating_sub(node.inserted_at) < self.ttl
    }

    fn slot_expired(&self, idx: usize, now: Duration) -> bool {
        self.slots
            .get(idx)
            .and_then(Option::as_ref)
            .is_none_or(|node| !self.is_live(node, now))
    }

    /// Slots of expired entries, oldest first. Insertion times are
    /// non-decreasing along the insertion list, so expired entries form its
    /// prefix.
    fn expired_prefix(&self) -> impl Iterator<Item = usize> + '_ {
        let now = self.clock.monotonic();
        std::iter::successors(self.oldest, |&idx| {
            self.slots.get(idx).and_then(Option::as_ref)?.newer
        })
        .take_while(move |&idx| self.slot_expired(idx, now))
    }

    fn live_node(&self, key: &K) -> Option<&Node<K, V>> {
        let now = self.clock.monotonic();
        let idx = *self.index.get(key)?;
        let node = self.slots.get(idx)?.as_ref()?;
        self.is_live(node, now).then_some(node)
    }

    fn allocate(&mut self, node: Node<K, V>) -> usize {
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(node);
            idx
        } else {
            self.slots.push(Some(node));
            self.slots.len() - 1
        }
    }

    fn remove_slot(&mut self, idx: usize) -> Option<Node<K, V>> {
        self.detach(idx);
        self.detach_age(idx);
        let node = self.slots.get_mut(idx)?.take()?;
        self.index.remove(&node.key);
        self.free.push(idx);
        Some(node)
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head != Some(idx) {
            self.detach(idx);
            self.attach_front(idx);
        }
    }

    fn detach(&mut self, idx: usize) {
        let Some((prev, next)) = self
            .slots
            .get(idx)
            .and_then(Option::as_ref)
            .map(|node| (node.prev, node.next))
        else {
            return;
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.slots.get_mut(p).and_then(Option::as_mut) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.slots.get_mut(n).and_then(Option::as_mut) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(node) = self.slots.get_mut(idx).and_then(Option::as_mut) {
            node.prev = None;
            node.next = None;
        }
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots.get_mut(idx).and_then(Option::as_mut) {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            if let Some(node) = self.slots.get_mut(h).and_then(Option::as_mut) {
                node.prev = Some(idx);
            }
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}

impl<K, V> BoundedTtlCache<K, V> {
    fn detach_age(&mut self, idx: usize) {
        let Some((older, newer)) = self
            .slots
            .get(idx)
            .and_then(Option::as_ref)
            .map(|node| (node.older, node.newer))
        else {
            return;
        };

        match older {
            Some(o) => {
                if let Some(node) = self.slots.get_mut(o).and_then(Option::as_mut) {
                    node.newer = newer;
                }
            }
            None => self.oldest = newer,
        }
        match newer {
            Some(n) => {
                if let Some(node) = self.slots.get_mut(n).and_then(Option::as_mut) {
                    node.older = older;
                }
            }
            None => self.newest = older,
        }

        if let Some(node) = self.slots.get_mut(idx).and_then(Option::as_mut) {
            node.older = None;
            node.newer = None;
        }
    }

    fn attach_newest(&mut self, idx: usize) {
        let old_newest = self.newest;
        if let Some(node) = self.slots.get_mut(idx).and_then(Option::as_mut) {
            node.older = old_newest;
            node.newer = None;
        }
        if let Some(n) = old_newest {
            if let Some(node) = self.slots.get_mut(n).and_then(Option::as_mut) {
                node.newer = Some(idx);
            }
        }
        self.newest = Some(idx);
        if self.oldest.is_none() {
            self.oldest = Some(idx);
        }
    }
}

/// Iterator over live cache entries, most recently used first.
pub struct Iter<'a, K, V> {
    slots: &'a [Option<Node<K, V>>],
    cursor: Option<usize>,
    now: Duration,
    ttl: Duration,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(idx) = self.cursor {
            let node = self.slots.get(idx)?.as_ref()?;
            self.cursor = node.next;
            if self.now.saturating_sub(node.inserted_at) < self.ttl {
                return Some((&node.key, &node.value));
            }
        }
        None
    }
}
