//! SlotTable: open-addressed index over the entry store.
//!
//! Cells hold `Handle`s into the `EntryStore`, never entries themselves.
//! Collisions are resolved by linear probing with the Robin Hood rule on
//! insertion and backward shifting on deletion, so every probe chain runs
//! contiguously from its ideal cell and no tombstones are needed.
//!
//! Invariants (for every live entry `e`):
//! - `cells[e.slot] == Some(handle_of(e))`;
//! - `e.displacement` is the forward distance from `e.hash % size` to
//!   `e.slot`, and every cell in between is occupied.

use crate::entry_store::{EntryStore, Handle};

#[derive(Debug, Clone)]
pub(crate) struct SlotTable {
    cells: Vec<Option<Handle>>,
}

impl SlotTable {
    pub(crate) fn with_size(size: usize) -> Self {
        debug_assert!(size > 0);
        Self {
            cells: vec![None; size],
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn ideal(&self, hash: u64) -> usize {
        (hash % self.cells.len() as u64) as usize
    }

    #[inline]
    fn step(&self, i: usize) -> usize {
        let n = i + 1;
        if n == self.cells.len() {
            0
        } else {
            n
        }
    }

    /// Probe for an entry with `hash` whose key satisfies `eq`.
    ///
    /// `eq` only runs for residents whose stored hash matches.
    pub(crate) fn find<K, V, F>(&self, store: &EntryStore<K, V>, hash: u64, mut eq: F) -> Option<Handle>
    where
        F: FnMut(&K) -> bool,
    {
        let mut i = self.ideal(hash);
        let mut dist = 0usize;
        while let Some(h) = self.cells[i] {
            let e = &store[h];
            // A resident closer to home than we are means our key would
            // have displaced it; the chain cannot contain the key further on.
            if e.displacement < dist {
                return None;
            }
            if e.hash == hash && eq(&e.key) {
                return Some(h);
            }
            i = self.step(i);
            dist += 1;
        }
        None
    }

    /// Index `handle` using Robin Hood insertion.
    ///
    /// The caller guarantees the key is not present and that the table has
    /// at least one empty cell.
    pub(crate) fn place<K, V>(&mut self, store: &mut EntryStore<K, V>, handle: Handle) {
        let mut carried = handle;
        store[carried].displacement = 0;
        let mut i = self.ideal(store[carried].hash);
        loop {
            match self.cells[i] {
                None => {
                    self.cells[i] = Some(carried);
                    store[carried].slot = i;
                    return;
                }
                Some(resident) => {
                    if store[resident].displacement < store[carried].displacement {
                        self.cells[i] = Some(carried);
                        store[carried].slot = i;
                        carried = resident;
                    }
                    store[carried].displacement += 1;
                    i = self.step(i);
                }
            }
        }
    }

    /// Empty `slot` and pull the rest of its chain one cell back.
    ///
    /// The entry that occupied `slot` must already be gone from `store`.
    pub(crate) fn vacate<K, V>(&mut self, store: &mut EntryStore<K, V>, slot: usize) {
        self.cells[slot] = None;
        let mut hole = slot;
        let mut next = self.step(hole);
        while let Some(h) = self.cells[next] {
            let e = &mut store[h];
            if e.displacement == 0 {
                break;
            }
            e.displacement -= 1;
            e.slot = hole;
            self.cells[hole] = Some(h);
            self.cells[next] = None;
            hole = next;
            next = self.step(hole);
        }
    }

    /// Panics if any table invariant is violated.
    #[cfg(test)]
    pub(crate) fn assert_consistent<K, V>(&self, store: &EntryStore<K, V>) {
        let size = self.size();
        let mut occupied = 0;
        for (i, cell) in self.cells.iter().enumerate() {
            let Some(h) = *cell else { continue };
            occupied += 1;
            let e = store.get(h).expect("cell names a live entry");
            assert_eq!(e.slot, i, "slot bookkeeping out of sync");
            let ideal = self.ideal(e.hash);
            let dist = (i + size - ideal) % size;
            assert_eq!(e.displacement, dist, "displacement out of sync");
            for d in 0..dist {
                assert!(
                    self.cells[(ideal + d) % size].is_some(),
                    "probe chain broken before cell {}",
                    i
                );
            }
        }
        assert_eq!(occupied, store.len(), "every entry indexed exactly once");
    }

    #[cfg(test)]
    pub(crate) fn cell(&self, i: usize) -> Option<Handle> {
        self.cells[i]
    }
}
