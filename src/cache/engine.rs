//! Cache Engine Module
//!
//! Main cache engine combining the node store with LRU ordering and TTL
//! expiration.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::cache::lru::OrderingList;
use crate::cache::node::{CacheNode, Handle};
use crate::cache::store::NodeStore;
use crate::cache::stats::CacheStats;
use crate::cache::sync::Coordinator;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Cache State ==
/// Everything one cache operation reads or mutates.
///
/// Store membership and list membership change together inside every method
/// here; nothing outside this type touches either on its own.
struct CacheState<K, V> {
    store: NodeStore<K, V>,
    order: OrderingList,
    stats: CacheStats,
}

impl<K, V> CacheState<K, V>
where
    K: Hash + Eq + Clone,
{
    fn new(capacity: usize) -> Self {
        Self {
            store: NodeStore::with_capacity(capacity),
            order: OrderingList::new(),
            stats: CacheStats::new(),
        }
    }

    /// Unlinks and removes one node.
    fn detach(&mut self, handle: Handle) -> Option<CacheNode<K, V>> {
        self.order.unlink(&mut self.store, handle);
        self.store.remove_handle(handle)
    }

    /// Links a new node in front of the list.
    fn attach(&mut self, node: CacheNode<K, V>) {
        let handle = self.store.insert(node);
        self.order.push_front(&mut self.store, handle);
    }

    /// Evicts the node closest to the tail sentinel.
    fn evict_lru(&mut self) -> Option<CacheNode<K, V>> {
        let handle = self.order.back()?;
        let node = self.detach(handle)?;
        self.stats.record_eviction();
        Some(node)
    }

    /// Removes every node expired at `now` and returns how many were dropped.
    fn purge_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<Handle> = self
            .store
            .iter()
            .filter(|(_, node)| node.is_expired(now))
            .map(|(handle, _)| handle)
            .collect();

        for &handle in &expired {
            self.detach(handle);
        }
        self.debug_check();
        self.stats.record_expired(expired.len() as u64);
        expired.len()
    }

    /// List length and store size move together.
    fn debug_check(&self) {
        debug_assert_eq!(self.order.len(), self.store.size());
    }

    /// Collects keys from most to least recently used, keeping nodes that
    /// pass `keep`.
    fn recency_keys<F>(&self, keep: F) -> Vec<K>
    where
        F: Fn(&CacheNode<K, V>) -> bool,
    {
        self.order
            .iter(&self.store)
            .filter_map(|handle| self.store.node(handle))
            .filter(|node| keep(node))
            .map(|node| node.key.clone())
            .collect()
    }

    /// Returns the live node under `key` without touching recency or stats.
    fn live_node<Q>(&self, key: &Q, now: Instant) -> Option<&CacheNode<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lookup(key).filter(|node| !node.is_expired(now))
    }
}

// == LRU TTL Cache ==
/// Bounded cache with LRU eviction, per-entry TTL and lifetime statistics.
///
/// Built with a fixed capacity (entry count) and a concurrency mode. In
/// shared mode every operation holds one reader/writer lock for its full
/// duration; lookups count as writes because they reorder the recency list.
/// Without thread safety the caller must serialize access.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use lru_ttl_cache::LruTtlCache;
///
/// let cache = LruTtlCache::new(2, true).unwrap();
/// cache.put("a", 1);
/// cache.put_with_ttl("b", 2, Some(Duration::from_secs(60)));
/// assert_eq!(cache.get("a"), Some(1));
///
/// cache.put("c", 3); // evicts "b", the least recently used
/// assert_eq!(cache.get("b"), None);
/// assert_eq!(cache.stats().eviction_count, 1);
/// ```
pub struct LruTtlCache<K, V> {
    /// Maximum number of entries
    capacity: usize,
    /// Store, ordering list and stats behind the selected strategy
    state: Coordinator<CacheState<K, V>>,
}

impl<K, V> LruTtlCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a new cache.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, must be positive
    /// * `thread_safe` - Guard every operation with a reader/writer lock
    ///
    /// # Errors
    /// `CacheError::InvalidConfiguration` if `capacity` is zero.
    pub fn new(capacity: usize, thread_safe: bool) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidConfiguration(
                "capacity must be a positive integer".to_string(),
            ));
        }

        info!(capacity, thread_safe, "Cache initialized");
        Ok(Self {
            capacity,
            state: Coordinator::new(CacheState::new(capacity), thread_safe),
        })
    }

    /// Creates a cache from a validated [`CacheConfig`].
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.capacity, config.thread_safe)
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A hit moves the entry to the most recently used position. An expired
    /// entry is removed and counted both as a miss and as an expiration.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        self.state.exclusive(|state| {
            let Some(handle) = state.store.handle_of(key) else {
                state.stats.record_miss();
                trace!("Cache miss");
                return None;
            };

            let expired = state
                .store
                .node(handle)
                .map_or(true, |node| node.is_expired(now));
            if expired {
                state.detach(handle);
                state.debug_check();
                state.stats.record_miss();
                state.stats.record_expired(1);
                debug!("Expired entry removed on read");
                return None;
            }

            state.order.move_to_front(&mut state.store, handle);
            let node = state.store.node_mut(handle)?;
            node.touch(now);
            let value = node.value.clone();
            state.stats.record_hit();
            trace!("Cache hit");
            Some(value)
        })
    }

    // == Put ==
    /// Stores a value that never expires.
    pub fn put(&self, key: K, value: V) {
        self.put_with_ttl(key, value, None);
    }

    /// Stores a key-value pair with an optional TTL.
    ///
    /// If the key already exists, the value is overwritten, the TTL is
    /// recomputed from now and the entry becomes most recently used; the
    /// size does not change. Otherwise, if the cache is full, the least
    /// recently used entry is evicted first.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional time to live, None = never expires
    pub fn put_with_ttl(&self, key: K, value: V, ttl: Option<Duration>) {
        let now = Instant::now();
        let capacity = self.capacity;
        self.state.exclusive(|state| {
            state.stats.record_put();

            if let Some(handle) = state.store.handle_of(&key) {
                if let Some(node) = state.store.node_mut(handle) {
                    node.refresh(value, ttl, now);
                }
                state.order.move_to_front(&mut state.store, handle);
                return;
            }

            if state.store.size() >= capacity && state.evict_lru().is_some() {
                debug!(capacity, "Evicted least recently used entry");
            }
            state.attach(CacheNode::new(key, value, ttl, now));
            state.debug_check();
        });
    }

    // == Get Or Load ==
    /// Returns the cached value, or loads and caches it on a miss.
    ///
    /// The loader runs at most once per call and only on a miss. A `None`
    /// from the loader caches nothing. The loader runs outside the lock, so
    /// concurrent misses on the same key may each load; the last put wins.
    pub fn get_or_load<F>(&self, key: K, loader: F, ttl: Option<Duration>) -> Option<V>
    where
        F: FnOnce(&K) -> Option<V>,
    {
        if let Some(value) = self.get(&key) {
            return Some(value);
        }

        let value = loader(&key)?;
        self.put_with_ttl(key, value.clone(), ttl);
        Some(value)
    }

    /// Fallible variant of [`LruTtlCache::get_or_load`].
    ///
    /// A loader error is returned unchanged and nothing is cached.
    pub fn try_get_or_load<F, E>(
        &self,
        key: K,
        loader: F,
        ttl: Option<Duration>,
    ) -> std::result::Result<Option<V>, E>
    where
        F: FnOnce(&K) -> std::result::Result<Option<V>, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(Some(value));
        }

        match loader(&key)? {
            Some(value) => {
                self.put_with_ttl(key, value.clone(), ttl);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    // == Remove ==
    /// Removes an entry and returns its value.
    ///
    /// Statistics are not affected.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.state.exclusive(|state| {
            let handle = state.store.handle_of(key)?;
            state.order.unlink(&mut state.store, handle);
            let node = state.store.remove(key);
            state.debug_check();
            node.map(|node| node.value)
        })
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let removed = self.state.exclusive(|state| state.purge_expired(now));
        if removed > 0 {
            debug!(removed, "Expired entries purged");
        }
        removed
    }

    // == Clear ==
    /// Removes every entry. Statistics are kept.
    pub fn clear(&self) {
        self.state.exclusive(|state| {
            state.store.clear();
            state.order.clear();
        });
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.state.shared(|state| state.store.size())
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.state.shared(|state| state.store.is_empty())
    }

    // == Stats ==
    /// Returns a snapshot of the lifetime statistics.
    pub fn stats(&self) -> CacheStats {
        self.state.shared(|state| state.stats)
    }

    // == Introspection ==
    /// Returns the maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true when operations are serialized by a lock.
    pub fn is_thread_safe(&self) -> bool {
        self.state.is_thread_safe()
    }

    /// Checks for a live entry without touching recency or statistics.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        self.state
            .shared(|state| state.live_node(key, now).is_some())
    }

    /// Returns the remaining TTL of a live entry.
    ///
    /// None when the key is absent, expired, or never expires.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        self.state
            .shared(|state| state.live_node(key, now)?.ttl_remaining(now))
    }

    /// Returns the live keys from most to least recently used.
    ///
    /// Entries that expired but were not yet purged are skipped, the same
    /// way [`LruTtlCache::contains_key`] skips them.
    pub fn keys(&self) -> Vec<K> {
        let now = Instant::now();
        self.state
            .shared(|state| state.recency_keys(|node| !node.is_expired(now)))
    }

    /// Every linked key, expired or not, in recency order.
    #[cfg(test)]
    pub(crate) fn linked_keys(&self) -> Vec<K> {
        self.state.shared(|state| state.recency_keys(|_| true))
    }
}

impl<K, V> fmt::Debug for LruTtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruTtlCache")
            .field("capacity", &self.capacity)
            .field("thread_safe", &self.state.is_thread_safe())
            .finish_non_exhaustive()
    }
}
