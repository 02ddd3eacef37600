//! robin-linked-map: an insertion-ordered hash map built on Robin Hood
//! hashing with backward-shift deletion.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: amortized O(1) insert/find/erase with iteration in insertion
//!   order, stable across removals of other keys and across rehashing.
//! - Layers (leaves first):
//!   - EntryStore<K, V>: a `SlotMap` arena threaded onto a doubly-linked
//!     list. Owns every entry; defines iteration order; O(1) append and
//!     O(1) unlink given a `Handle`.
//!   - SlotTable: a prime-sized array of `Option<Handle>`. Robin Hood
//!     insertion, backward-shift deletion, no tombstones.
//!   - RawMap<K, V>: keeps the two in lockstep and owns the growth policy.
//!   - LinkedRobinMap<K, V, S>: public API; hashes keys with `S` and
//!     hands the hash down.
//!   - Cursor / Iter / IterMut / IntoIter: walk the store only.
//!
//! Constraints
//! - The store knows nothing about hashing; the table knows nothing about
//!   order. The table holds handles, never ownership.
//! - Each entry records `displacement` (probe steps past its ideal cell)
//!   and `slot` (the cell naming it), so erase by handle needs no probe.
//! - `len / table_size < MAX_LOAD_FACTOR` after every insert; the table
//!   size is always prime and never shrinks.
//! - Duplicate inserts are no-ops that keep the existing value; the
//!   find-or-default accessor is the upsert path.
//!
//! Hasher and rehashing invariants
//! - Each entry stores the `u64` produced by `S` at insertion; probing and
//!   rehashing always use the stored hash, so `K: Hash` runs once per
//!   operation and never during growth. `K: Eq` only runs on stored-hash
//!   matches.
//! - Growth triggers before a placement when `(len + 1) / size` would reach
//!   the bound. The new size is the smallest prime at least twice the old
//!   one, and entries are re-placed in insertion order.
//!
//! Reentrancy policy
//! - A debug-only guard wraps every entry point that may run user `Eq`.
//!   Reentering the map from inside `Eq` panics in debug builds.
//!
//! Notes and non-goals
//! - Single-threaded; callers serialize access.
//! - No ordering by key, no range queries, no shrinking, no tunable load
//!   factor.

mod entry_store;
mod error;
mod iter;
mod linked_robin_map;
mod linked_robin_map_proptest;
mod primes;
mod raw_map;
mod reentrancy;
mod slot_table;

// Public surface
pub use error::LookupError;
pub use iter::{Cursor, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
pub use linked_robin_map::LinkedRobinMap;
pub use raw_map::{INITIAL_TABLE_SIZE, MAX_LOAD_FACTOR};
