//! RawMap: the entry store and slot table kept in lockstep, plus growth.
//!
//! Nothing here hashes keys; callers pass the hash in and it is stored on
//! the entry, so rehashing never calls back into `K: Hash`.

use crate::entry_store::{Entry, EntryStore, Handle};
use crate::primes::next_prime;
use crate::slot_table::SlotTable;

/// Slot-table size of a freshly constructed map.
pub const INITIAL_TABLE_SIZE: usize = 37;

/// Upper bound on `len / table_size`, maintained after every insert.
pub const MAX_LOAD_FACTOR: f64 = 0.6;

// MAX_LOAD_FACTOR as an exact ratio for integer comparisons.
const LOAD_NUM: usize = 3;
const LOAD_DEN: usize = 5;

#[derive(Debug)]
pub(crate) struct RawMap<K, V> {
    store: EntryStore<K, V>,
    table: SlotTable,
}

impl<K, V> RawMap<K, V> {
    pub(crate) fn new() -> Self {
        Self::with_table_size(INITIAL_TABLE_SIZE)
    }

    /// Smallest prime table, never below `INITIAL_TABLE_SIZE`, that takes
    /// `capacity` entries without growing.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let wanted = capacity.saturating_mul(LOAD_DEN) / LOAD_NUM + 1;
        Self::with_table_size(next_prime(wanted.max(INITIAL_TABLE_SIZE)))
    }

    fn with_table_size(size: usize) -> Self {
        Self {
            store: EntryStore::new(),
            table: SlotTable::with_size(size),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.store.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub(crate) fn table_size(&self) -> usize {
        self.table.size()
    }

    pub(crate) fn store(&self) -> &EntryStore<K, V> {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut EntryStore<K, V> {
        &mut self.store
    }

    pub(crate) fn find<F>(&self, hash: u64, eq: F) -> Option<Handle>
    where
        F: FnMut(&K) -> bool,
    {
        self.table.find(&self.store, hash, eq)
    }

    /// Append a new entry and index it. The key must not be present.
    pub(crate) fn insert_unique(&mut self, hash: u64, key: K, value: V) -> Handle {
        self.grow_if_needed();
        let handle = self.store.push_back(Entry::new(key, value, hash));
        self.table.place(&mut self.store, handle);
        handle
    }

    pub(crate) fn remove(&mut self, handle: Handle) -> Option<Entry<K, V>> {
        let entry = self.store.remove(handle)?;
        self.table.vacate(&mut self.store, entry.slot);
        Some(entry)
    }

    /// Erase front to back so each cell is released through `remove`.
    pub(crate) fn clear(&mut self) {
        log::trace!(
            "clearing {} entries from table of {} slots",
            self.len(),
            self.table_size()
        );
        while let Some(h) = self.store.first() {
            let removed = self.remove(h);
            debug_assert!(removed.is_some(), "first() names a live entry");
        }
    }

    pub(crate) fn into_store(self) -> EntryStore<K, V> {
        self.store
    }

    fn grow_if_needed(&mut self) {
        let size = self.table.size();
        if (self.len() + 1) * LOAD_DEN < size * LOAD_NUM {
            return;
        }
        self.rehash(next_prime(size * 2));
    }

    /// Rebuild the table at `new_size`, re-placing entries in insertion
    /// order. The store is left alone so every handle keeps naming its entry.
    fn rehash(&mut self, new_size: usize) {
        log::debug!(
            "rehashing {} entries: {} -> {} slots",
            self.len(),
            self.table.size(),
            new_size
        );
        let handles: Vec<Handle> = self.store.iter().map(|(h, _)| h).collect();
        self.table = SlotTable::with_size(new_size);
        for handle in handles {
            self.table.place(&mut self.store, handle);
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert!(crate::primes::is_prime(self.table_size()), "table size must be prime");
        assert!(
            self.len() * LOAD_DEN < self.table_size() * LOAD_NUM,
            "load factor bound exceeded: {} / {}",
            self.len(),
            self.table_size()
        );
        self.table.assert_consistent(&self.store);
    }
}

impl<K: Clone, V: Clone> Clone for RawMap<K, V> {
    fn clone(&self) -> Self {
        let mut out = Self::with_table_size(self.table_size());
        for (_, e) in self.store.iter() {
            let handle = out.store.push_back(e.clone());
            out.table.place(&mut out.store, handle);
        }
        out
    }
}
