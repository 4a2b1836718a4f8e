//! Cache Node Store Module
//!
//! Arena of cache nodes addressed by stable handles, plus the key index.
//!
//! The store owns node lifetime. The ordering list only refers to nodes by
//! handle, so the engine must unlink a node from the list before removing it
//! here.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::cache::node::{CacheNode, Handle, FIRST_NODE, HEAD, TAIL};

// == Node Store ==
/// Mapping from key to owned cache node.
///
/// Slot `h` of the arena holds the node addressed by handle `h`. The first
/// two slots are reserved for the list sentinels and never hold a node.
#[derive(Debug)]
pub struct NodeStore<K, V> {
    /// Key to handle index
    index: HashMap<K, Handle>,
    /// Node arena
    slots: Vec<Option<CacheNode<K, V>>>,
    /// Vacant slots ready for reuse
    free: Vec<Handle>,
}

impl<K, V> NodeStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty store sized for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity + FIRST_NODE);
        slots.resize_with(FIRST_NODE, || None);

        Self {
            index: HashMap::with_capacity(capacity),
            slots,
            free: Vec::new(),
        }
    }

    // == Insert ==
    /// Stores a node under its key and returns its handle.
    ///
    /// Inserting a key that is already present replaces the node in place:
    /// the handle and the list links of the previous node are kept.
    pub fn insert(&mut self, mut node: CacheNode<K, V>) -> Handle {
        if let Some(&handle) = self.index.get(&node.key) {
            if let Some(slot) = self.slots.get_mut(handle) {
                let (prev, next) = slot
                    .as_ref()
                    .map_or((HEAD, TAIL), |old| (old.prev, old.next));
                node.prev = prev;
                node.next = next;
                *slot = Some(node);
            }
            return handle;
        }

        let handle = self.allocate();
        self.index.insert(node.key.clone(), handle);
        self.slots[handle] = Some(node);
        handle
    }

    // == Lookup ==
    /// Returns the node stored under `key`.
    pub fn lookup<Q>(&self, key: &Q) -> Option<&CacheNode<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.handle_of(key).and_then(|handle| self.node(handle))
    }

    // == Handle Of ==
    /// Returns the handle of the node stored under `key`.
    pub fn handle_of<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).copied()
    }

    // == Node Access ==
    /// Returns the node addressed by `handle`. Sentinel handles yield None.
    pub fn node(&self, handle: Handle) -> Option<&CacheNode<K, V>> {
        if handle < FIRST_NODE {
            return None;
        }
        self.slots.get(handle).and_then(Option::as_ref)
    }

    /// Mutable variant of [`NodeStore::node`].
    pub fn node_mut(&mut self, handle: Handle) -> Option<&mut CacheNode<K, V>> {
        if handle < FIRST_NODE {
            return None;
        }
        self.slots.get_mut(handle).and_then(Option::as_mut)
    }

    // == Remove ==
    /// Removes and returns the node stored under `key`.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<CacheNode<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.remove(key)?;
        let node = self.slots.get_mut(handle).and_then(Option::take);
        self.free.push(handle);
        node
    }

    /// Removes and returns the node addressed by `handle`.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<CacheNode<K, V>> {
        if handle < FIRST_NODE {
            return None;
        }
        let node = self.slots.get_mut(handle)?.take()?;
        self.index.remove(&node.key);
        self.free.push(handle);
        Some(node)
    }

    // == Size ==
    /// Returns the number of stored nodes.
    pub fn size(&self) -> usize {
        self.index.len()
    }

    /// Returns true if no node is stored.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Clear ==
    /// Drops every node and releases the arena slots.
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.truncate(FIRST_NODE);
        self.free.clear();
    }

    // == Iteration ==
    /// Iterates over live nodes in arena order (not recency order).
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &CacheNode<K, V>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(handle, slot)| slot.as_ref().map(|node| (handle, node)))
    }

    // == Allocate ==
    fn allocate(&mut self) -> Handle {
        if let Some(handle) = self.free.pop() {
            handle
        } else {
            self.slots.push(None);
            self.slots.len() - 1
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn node(key: &str, value: u32) -> CacheNode<String, u32> {
        CacheNode::new(key.to_string(), value, None, Instant::now())
    }

    #[test]
    fn test_store_new() {
        let store: NodeStore<String, u32> = NodeStore::with_capacity(8);
        assert_eq!(store.size(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_insert_and_lookup() {
        let mut store = NodeStore::with_capacity(8);

        let handle = store.insert(node("key1", 1));

        assert!(handle >= FIRST_NODE);
        assert_eq!(store.size(), 1);
        assert_eq!(store.lookup("key1").map(|n| n.value), Some(1));
        assert_eq!(store.handle_of("key1"), Some(handle));
        assert!(store.lookup("missing").is_none());
    }

    #[test]
    fn test_store_remove() {
        let mut store = NodeStore::with_capacity(8);
        store.insert(node("key1", 1));

        let removed = store.remove("key1").unwrap();

        assert_eq!(removed.value, 1);
        assert!(store.is_empty());
        assert!(store.lookup("key1").is_none());
        assert!(store.remove("key1").is_none());
    }

    #[test]
    fn test_store_remove_handle() {
        let mut store = NodeStore::with_capacity(8);
        let handle = store.insert(node("key1", 1));

        let removed = store.remove_handle(handle).unwrap();

        assert_eq!(removed.key, "key1");
        assert!(store.handle_of("key1").is_none());
        assert!(store.remove_handle(handle).is_none());
    }

    #[test]
    fn test_store_recycles_handles() {
        let mut store = NodeStore::with_capacity(8);
        let first = store.insert(node("key1", 1));
        store.remove("key1");

        let second = store.insert(node("key2", 2));

        assert_eq!(first, second);
        assert_eq!(store.lookup("key2").map(|n| n.value), Some(2));
    }

    #[test]
    fn test_store_insert_existing_key_keeps_handle_and_links() {
        let mut store = NodeStore::with_capacity(8);
        let handle = store.insert(node("key1", 1));
        {
            let existing = store.node_mut(handle).unwrap();
            existing.prev = 5;
            existing.next = 6;
        }

        let again = store.insert(node("key1", 2));

        assert_eq!(handle, again);
        assert_eq!(store.size(), 1);
        let stored = store.node(handle).unwrap();
        assert_eq!(stored.value, 2);
        assert_eq!((stored.prev, stored.next), (5, 6));
    }

    #[test]
    fn test_store_sentinel_handles_are_not_addressable() {
        let mut store: NodeStore<String, u32> = NodeStore::with_capacity(8);
        store.insert(node("key1", 1));

        assert!(store.node(HEAD).is_none());
        assert!(store.node_mut(TAIL).is_none());
        assert!(store.remove_handle(HEAD).is_none());
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn test_store_clear() {
        let mut store = NodeStore::with_capacity(8);
        store.insert(node("key1", 1));
        store.insert(node("key2", 2));

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.iter().count(), 0);
        assert_eq!(store.insert(node("key3", 3)), FIRST_NODE);
    }

    #[test]
    fn test_store_iter_visits_live_nodes() {
        let mut store = NodeStore::with_capacity(8);
        store.insert(node("a", 1));
        store.insert(node("b", 2));
        store.insert(node("c", 3));
        store.remove("b");

        let mut keys: Vec<_> = store.iter().map(|(_, n)| n.key.clone()).collect();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "c".to_string()]);
    }
}
