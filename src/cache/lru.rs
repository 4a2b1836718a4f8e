//! LRU Ordering Module
//!
//! Doubly linked recency list threaded through the nodes of a [`NodeStore`].
//!
//! The list is bounded by two sentinels that never hold data. Only their
//! links live here; every other link lives in the node it belongs to.

use std::hash::Hash;

use crate::cache::node::{Handle, HEAD, TAIL};
use crate::cache::store::NodeStore;

// == Ordering List ==
/// Tracks access order for LRU eviction.
///
/// - Head-adjacent = most recently used
/// - Tail-adjacent = least recently used (next eviction candidate)
#[derive(Debug)]
pub struct OrderingList {
    /// First node after the head sentinel (TAIL when empty)
    head_next: Handle,
    /// Last node before the tail sentinel (HEAD when empty)
    tail_prev: Handle,
    /// Number of linked nodes
    len: usize,
}

impl Default for OrderingList {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderingList {
    // == Constructor ==
    /// Creates an empty list with the two sentinels linked to each other.
    pub fn new() -> Self {
        Self {
            head_next: TAIL,
            tail_prev: HEAD,
            len: 0,
        }
    }

    // == Push Front ==
    /// Links a detached node right after the head sentinel.
    pub fn push_front<K, V>(&mut self, store: &mut NodeStore<K, V>, handle: Handle)
    where
        K: Hash + Eq + Clone,
    {
        let first = self.head_next;
        if let Some(node) = store.node_mut(handle) {
            node.prev = HEAD;
            node.next = first;
        } else {
            return;
        }
        self.set_prev(store, first, handle);
        self.head_next = handle;
        self.len += 1;
    }

    // == Unlink ==
    /// Detaches a node from the list, joining its neighbors.
    pub fn unlink<K, V>(&mut self, store: &mut NodeStore<K, V>, handle: Handle)
    where
        K: Hash + Eq + Clone,
    {
        let (prev, next) = match store.node_mut(handle) {
            Some(node) => {
                let links = (node.prev, node.next);
                node.prev = HEAD;
                node.next = TAIL;
                links
            }
            None => return,
        };

        self.set_next(store, prev, next);
        self.set_prev(store, next, prev);
        self.len = self.len.saturating_sub(1);
    }

    // == Move To Front ==
    /// Marks a linked node as most recently used.
    pub fn move_to_front<K, V>(&mut self, store: &mut NodeStore<K, V>, handle: Handle)
    where
        K: Hash + Eq + Clone,
    {
        if self.front() == Some(handle) {
            return;
        }
        self.unlink(store, handle);
        self.push_front(store, handle);
    }

    // == Peek ==
    /// Returns the most recently used handle.
    pub fn front(&self) -> Option<Handle> {
        (self.head_next != TAIL).then_some(self.head_next)
    }

    /// Returns the least recently used handle.
    pub fn back(&self) -> Option<Handle> {
        (self.tail_prev != HEAD).then_some(self.tail_prev)
    }

    // == Length ==
    /// Returns the number of linked nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Clear ==
    /// Resets the list to the two linked sentinels.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // == Iteration ==
    /// Walks handles from most to least recently used.
    ///
    /// The walk is bounded by the recorded length, so a damaged chain can
    /// never loop forever.
    pub fn iter<'a, K, V>(&self, store: &'a NodeStore<K, V>) -> Iter<'a, K, V>
    where
        K: Hash + Eq + Clone,
    {
        Iter {
            store,
            cursor: self.head_next,
            remaining: self.len,
        }
    }

    // == Link Helpers ==
    fn set_next<K, V>(&mut self, store: &mut NodeStore<K, V>, handle: Handle, next: Handle)
    where
        K: Hash + Eq + Clone,
    {
        if handle == HEAD {
            self.head_next = next;
        } else if let Some(node) = store.node_mut(handle) {
            node.next = next;
        }
    }

    fn set_prev<K, V>(&mut self, store: &mut NodeStore<K, V>, handle: Handle, prev: Handle)
    where
        K: Hash + Eq + Clone,
    {
        if handle == TAIL {
            self.tail_prev = prev;
        } else if let Some(node) = store.node_mut(handle) {
            node.prev = prev;
        }
    }
}

// == Iterator ==
/// Recency-ordered walk over the list, see [`OrderingList::iter`].
pub struct Iter<'a, K, V> {
    store: &'a NodeStore<K, V>,
    cursor: Handle,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: Hash + Eq + Clone,
{
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        if self.remaining == 0 || self.cursor == TAIL {
            return None;
        }
        let handle = self.cursor;
        self.cursor = self.store.node(handle)?.next;
        self.remaining -= 1;
        Some(handle)
    }
}
