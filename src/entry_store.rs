//! EntryStore: insertion-ordered arena that owns every entry of the map.
//!
//! Entries live in a `SlotMap` and are threaded onto a doubly-linked list
//! through `prev`/`next` keys. Appending and unlinking are O(1) given a
//! `Handle`, and no operation ever relocates a live entry, so handles stay
//! valid until their own entry is removed.

use core::ops::{Index, IndexMut};
use slotmap::{DefaultKey, SlotMap};

/// Stable reference to an entry in the store.
///
/// Backed by a generational key: once an entry is removed its handle never
/// resolves again, even if the physical slot is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }
}

/// A key/value pair plus the slot-table bookkeeping that travels with it.
#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    /// Probe steps between the ideal cell and `slot`.
    pub(crate) displacement: usize,
    /// Slot-table cell currently naming this entry.
    pub(crate) slot: usize,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, hash: u64) -> Self {
        Self {
            key,
            value,
            hash,
            displacement: 0,
            slot: 0,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) entry: Entry<K, V>,
    prev: Option<DefaultKey>,
    pub(crate) next: Option<DefaultKey>,
}

#[derive(Debug)]
pub(crate) struct EntryStore<K, V> {
    nodes: SlotMap<DefaultKey, Node<K, V>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl<K, V> EntryStore<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append `entry` after the current tail.
    pub(crate) fn push_back(&mut self, entry: Entry<K, V>) -> Handle {
        let prev = self.tail;
        let k = self.nodes.insert(Node {
            entry,
            prev,
            next: None,
        });
        match prev {
            Some(p) => self.nodes[p].next = Some(k),
            None => self.head = Some(k),
        }
        self.tail = Some(k);
        Handle(k)
    }

    /// Unlink and return the entry behind `handle`; `None` if it is stale.
    pub(crate) fn remove(&mut self, handle: Handle) -> Option<Entry<K, V>> {
        let node = self.nodes.remove(handle.raw_handle())?;
        match node.prev {
            Some(p) => self.nodes[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.nodes[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        Some(node.entry)
    }

    pub(crate) fn get(&self, handle: Handle) -> Option<&Entry<K, V>> {
        self.nodes.get(handle.raw_handle()).map(|n| &n.entry)
    }

    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut Entry<K, V>> {
        self.nodes.get_mut(handle.raw_handle()).map(|n| &mut n.entry)
    }

    pub(crate) fn first(&self) -> Option<Handle> {
        self.head.map(Handle)
    }

    /// Successor of `handle` in insertion order. A stale handle has none.
    pub(crate) fn next(&self, handle: Handle) -> Option<Handle> {
        self.nodes
            .get(handle.raw_handle())
            .and_then(|n| n.next)
            .map(Handle)
    }

    pub(crate) fn iter(&self) -> StoreIter<'_, K, V> {
        StoreIter {
            nodes: &self.nodes,
            cur: self.head,
            remaining: self.nodes.len(),
        }
    }

    /// Split the store into its node arena and first key so callers can walk
    /// the list while holding disjoint mutable borrows of the nodes.
    pub(crate) fn nodes_mut(
        &mut self,
    ) -> (&mut SlotMap<DefaultKey, Node<K, V>>, Option<DefaultKey>) {
        (&mut self.nodes, self.head)
    }

    /// Consume the store, yielding entries front to back.
    pub(crate) fn into_entries(self) -> IntoEntries<K, V> {
        IntoEntries {
            nodes: self.nodes,
            cur: self.head,
        }
    }
}

impl<K, V> Index<Handle> for EntryStore<K, V> {
    type Output = Entry<K, V>;

    fn index(&self, handle: Handle) -> &Entry<K, V> {
        &self.nodes[handle.raw_handle()].entry
    }
}

impl<K, V> IndexMut<Handle> for EntryStore<K, V> {
    fn index_mut(&mut self, handle: Handle) -> &mut Entry<K, V> {
        &mut self.nodes[handle.raw_handle()].entry
    }
}

/// Borrowing walk over the store in insertion order.
pub(crate) struct StoreIter<'a, K, V> {
    nodes: &'a SlotMap<DefaultKey, Node<K, V>>,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, K, V> Clone for StoreIter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            cur: self.cur,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for StoreIter<'a, K, V> {
    type Item = (Handle, &'a Entry<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let node = &self.nodes[k];
        self.cur = node.next;
        self.remaining -= 1;
        Some((Handle(k), &node.entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Owning walk over the store in insertion order.
pub(crate) struct IntoEntries<K, V> {
    nodes: SlotMap<DefaultKey, Node<K, V>>,
    cur: Option<DefaultKey>,
}

impl<K, V> Iterator for IntoEntries<K, V> {
    type Item = Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.remove(self.cur?)?;
        self.cur = node.next;
        Some(node.entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.nodes.len(), Some(self.nodes.len()))
    }
}
