//! Cache Node Module
//!
//! Defines a single cached entry with expiry metadata and ordering links.

use std::time::{Duration, Instant};

// == Handles ==
/// Stable address of a node slot inside the store arena.
pub type Handle = usize;

/// Reserved handle of the head sentinel (most recently used end).
pub const HEAD: Handle = 0;

/// Reserved handle of the tail sentinel (least recently used end).
pub const TAIL: Handle = 1;

/// First handle available to live nodes.
pub const FIRST_NODE: Handle = 2;

// == Cache Node ==
/// Represents a single cache entry with value, expiry metadata and the
/// intrusive links of the ordering list.
#[derive(Debug, Clone)]
pub struct CacheNode<K, V> {
    /// Key the node is indexed under
    pub key: K,
    /// The stored value
    pub value: V,
    /// Expiration instant, None = never expires
    pub expire_at: Option<Instant>,
    /// Last time the node was read or written
    pub last_accessed_at: Instant,
    /// Neighbor towards the head sentinel
    pub(crate) prev: Handle,
    /// Neighbor towards the tail sentinel
    pub(crate) next: Handle,
}

impl<K, V> CacheNode<K, V> {
    // == Constructor ==
    /// Creates a detached node with an optional TTL measured from `now`.
    ///
    /// # Arguments
    /// * `key` - The key the node is stored under
    /// * `value` - The value to store
    /// * `ttl` - Optional time to live
    /// * `now` - Creation instant
    pub fn new(key: K, value: V, ttl: Option<Duration>, now: Instant) -> Self {
        Self {
            key,
            value,
            expire_at: expiry_from(ttl, now),
            last_accessed_at: now,
            prev: HEAD,
            next: TAIL,
        }
    }

    // == Refresh ==
    /// Overwrites value and expiry in place, as done by a repeated put.
    pub fn refresh(&mut self, value: V, ttl: Option<Duration>, now: Instant) {
        self.value = value;
        self.expire_at = expiry_from(ttl, now);
        self.last_accessed_at = now;
    }

    // == Touch ==
    /// Records a read at `now`.
    pub fn touch(&mut self, now: Instant) {
        self.last_accessed_at = now;
    }

    // == Is Expired ==
    /// Checks whether the node has expired at `now`.
    ///
    /// An entry is expired only once `now` is strictly past its expiry
    /// instant. Nodes without an expiry never expire.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.expire_at {
            Some(expire_at) => now > expire_at,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining TTL at `now`, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` once the expiry instant has been reached
    /// - `Some(remaining)` while the entry is live
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self, now: Instant) -> Option<Duration> {
        self.expire_at
            .map(|expire_at| expire_at.saturating_duration_since(now))
    }
}

// == Utility Functions ==
/// Computes the expiry instant for a TTL.
///
/// A TTL too large for the platform clock is treated as no expiry. A zero
/// TTL yields `now` itself, so the entry is expired from the next instant on.
fn expiry_from(ttl: Option<Duration>, now: Instant) -> Option<Instant> {
    ttl.and_then(|ttl| now.checked_add(ttl))
}
