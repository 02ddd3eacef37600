//! LinkedRobinMap: public façade over `RawMap`.
//!
//! Owns the hasher and the debug reentrancy guard, hashes keys exactly once
//! per operation and hands the hash down. Iteration is in insertion order.

use crate::entry_store::Handle;
use crate::error::LookupError;
use crate::iter::{Cursor, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::raw_map::RawMap;
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use hashbrown::hash_map::DefaultHashBuilder;

/// Insertion-ordered hash map using Robin Hood probing over a prime-sized
/// slot table.
///
/// Inserting a key that is already present is a no-op and keeps the old
/// value; use [`get_or_default`](Self::get_or_default) or
/// [`get_mut`](Self::get_mut) to overwrite.
///
/// ```
/// use robin_linked_map::LinkedRobinMap;
///
/// let mut m = LinkedRobinMap::new();
/// m.insert("b", 2);
/// m.insert("a", 1);
/// m.insert("b", 99);
/// assert_eq!(m.get("b"), Some(&2));
/// *m.get_or_default("b") = 99;
/// assert_eq!(m.keys().copied().collect::<Vec<_>>(), ["b", "a"]);
/// ```
pub struct LinkedRobinMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    raw: RawMap<K, V>,
    reentrancy: DebugReentrancy,
}

impl<K, V> LinkedRobinMap<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V, S: Default> Default for LinkedRobinMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> LinkedRobinMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            raw: RawMap::new(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Sizes the table so `capacity` inserts never trigger a rehash.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            raw: RawMap::with_capacity(capacity),
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Number of slot-table cells; always prime.
    pub fn table_size(&self) -> usize {
        self.raw.table_size()
    }

    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.table_size() as f64
    }

    pub(crate) fn raw(&self) -> &RawMap<K, V> {
        &self.raw
    }

    pub(crate) fn raw_mut(&mut self) -> &mut RawMap<K, V> {
        &mut self.raw
    }

    /// Cursor at the oldest entry, or `end()` when empty.
    pub fn begin(&self) -> Cursor {
        Cursor::at(self.raw.store().first())
    }

    pub fn end(&self) -> Cursor {
        Cursor::END
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.raw.store())
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self.raw.store_mut())
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Remove the entry under `cursor`.
    ///
    /// Returns `None` for `end()` or a cursor whose entry is already gone.
    /// Cursors to other entries stay valid, so a scan can erase as it goes
    /// by advancing before removing.
    pub fn remove_at(&mut self, cursor: Cursor) -> Option<(K, V)> {
        let _g = self.reentrancy.enter();
        let handle = cursor.handle()?;
        self.raw.remove(handle).map(|e| (e.key, e.value))
    }

    /// Remove every entry. The table keeps its current size.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.raw.clear();
    }
}

impl<K, V, S> LinkedRobinMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn locate<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.raw.find(hash, |k| <K as Borrow<Q>>::borrow(k) == q)
    }

    /// Cursor at the entry for `q`, or `end()` when absent.
    pub fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        Cursor::at(self.locate(q))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        self.locate(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let e = &self.raw.store()[self.locate(q)?];
        Some((&e.key, &e.value))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let handle = self.locate(q)?;
        Some(&mut self.raw.store_mut()[handle].value)
    }

    /// Checked lookup: the value for `q`, or `LookupError::NotFound`.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, LookupError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(LookupError::NotFound)
    }

    pub fn at_mut<Q>(&mut self, q: &Q) -> Result<&mut V, LookupError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_mut(q).ok_or(LookupError::NotFound)
    }

    /// Insert `key` at the back of the iteration order.
    ///
    /// Returns `false` and leaves the map untouched if `key` is present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.insert_with(key, || value)
    }

    /// Like [`insert`](Self::insert), but `value` only runs when the key is
    /// absent.
    pub fn insert_with<F>(&mut self, key: K, value: F) -> bool
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(&key);
        if self.raw.find(hash, |k| *k == key).is_some() {
            return false;
        }
        self.raw.insert_unique(hash, key, value());
        true
    }

    /// Value for `key`, inserting `default()` first if absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(&key);
        let found = self.raw.find(hash, |k| *k == key);
        let handle = match found {
            Some(h) => h,
            None => self.raw.insert_unique(hash, key, default()),
        };
        &mut self.raw.store_mut()[handle].value
    }

    /// Value for `key`, inserting `V::default()` first if absent.
    pub fn get_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let handle = self.locate(q)?;
        self.raw.remove(handle).map(|e| (e.key, e.value))
    }
}

impl<K, Q, V, S> Index<&Q> for LinkedRobinMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    /// Panics if `key` is absent; see [`LinkedRobinMap::at`] for the checked form.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not found in LinkedRobinMap")
    }
}

impl<K, V, S> Clone for LinkedRobinMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            raw: self.raw.clone(),
            reentrancy: DebugReentrancy::new(),
        }
    }
}

impl<K, V, S> PartialEq for LinkedRobinMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| v == ov))
    }
}

impl<K, V, S> Eq for LinkedRobinMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for LinkedRobinMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for LinkedRobinMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for LinkedRobinMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::with_hasher(S::default());
        m.extend(iter);
        m
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for LinkedRobinMap<K, V>
where
    K: Eq + Hash,
{
    fn from(arr: [(K, V); N]) -> Self {
        let mut m = Self::with_capacity(N);
        m.extend(arr);
        m
    }
}

impl<K, V, S> IntoIterator for LinkedRobinMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter::new(self.raw.into_store())
    }
}

impl<'a, K, V, S> IntoIterator for &'a LinkedRobinMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut LinkedRobinMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::hash::Hasher;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every key lands in one chain
    }

    /// Invariant: a duplicate insert is a no-op that keeps the first value.
    #[test]
    fn duplicate_insert_is_ignored() {
        let mut m: LinkedRobinMap<String, i32> = LinkedRobinMap::new();
        assert!(m.insert("a".to_string(), 1));
        assert!(m.insert("b".to_string(), 2));
        assert!(!m.insert("a".to_string(), 99));
        assert_eq!(m.get("a"), Some(&1));
        assert_eq!(m.len(), 2);

        *m.get_or_default("a".to_string()) = 99;
        assert_eq!(m.get("a"), Some(&99));
        assert_eq!(m.find("a").value(&m), Some(&99));
    }

    /// Invariant: `at` fails on absent keys; the defaulting accessor inserts.
    #[test]
    fn at_vs_get_or_default() {
        let mut m: LinkedRobinMap<String, i32> = LinkedRobinMap::new();
        assert_eq!(m.at("missing"), Err(LookupError::NotFound));
        assert_eq!(*m.get_or_default("missing".to_string()), 0);
        assert_eq!(m.at("missing"), Ok(&0));
        *m.at_mut("missing").unwrap() = 5;
        assert_eq!(m["missing"], 5);
        assert_eq!(m.len(), 1);
    }

    #[test]
    #[should_panic(expected = "key not found")]
    fn index_panics_on_absent_key() {
        let m: LinkedRobinMap<String, i32> = LinkedRobinMap::new();
        let _ = m["nope"];
    }

    /// Invariant: `insert_with` and `get_or_insert_with` only build values
    /// that end up stored.
    #[test]
    fn value_constructors_are_lazy() {
        let mut m: LinkedRobinMap<&str, String> = LinkedRobinMap::new();
        let calls = Cell::new(0);
        let make = || {
            calls.set(calls.get() + 1);
            "v".to_string()
        };
        assert!(m.insert_with("k", make));
        assert!(!m.insert_with("k", make));
        m.get_or_insert_with("k", make).push('!');
        assert_eq!(calls.get(), 1);
        assert_eq!(m.get("k").map(String::as_str), Some("v!"));
    }

    /// Invariant: erasing absent or already-erased keys changes nothing.
    #[test]
    fn remove_is_idempotent() {
        let mut m: LinkedRobinMap<&str, i32> = LinkedRobinMap::new();
        assert_eq!(m.remove("x"), None);
        m.insert("x", 1);
        m.insert("y", 2);
        assert_eq!(m.remove_entry("x"), Some(("x", 1)));
        assert_eq!(m.remove("x"), None);
        assert_eq!(m.len(), 1);
        assert!(m.find("x").is_end());
        assert!(!m.contains_key("x"));
        m.raw.assert_consistent();
    }

    /// Invariant: a single collision chain still resolves every key, and
    /// removals from its middle keep the rest reachable.
    #[test]
    fn full_collision_chain() {
        let mut m: LinkedRobinMap<u32, u32, ConstBuildHasher> =
            LinkedRobinMap::with_hasher(ConstBuildHasher);
        for i in 0..20 {
            m.insert(i, i * 2);
        }
        for i in (0..20).step_by(3) {
            assert_eq!(m.remove(&i), Some(i * 2));
        }
        m.raw.assert_consistent();
        for i in 0..20 {
            assert_eq!(m.get(&i).is_some(), i % 3 != 0);
        }
    }

    #[test]
    fn erase_while_scanning() {
        let mut m: LinkedRobinMap<u32, u32> = (0..30).map(|i| (i, i)).collect();
        let mut c = m.begin();
        while !c.is_end() {
            let next = c.next(&m);
            if c.key(&m).map_or(false, |k| k % 2 == 0) {
                m.remove_at(c);
            }
            c = next;
        }
        assert_eq!(
            m.keys().copied().collect::<Vec<_>>(),
            (0..30).filter(|k| k % 2 == 1).collect::<Vec<_>>()
        );
        m.raw.assert_consistent();
    }

    #[test]
    fn clear_then_reuse() {
        let mut m: LinkedRobinMap<u32, u32> = (0..50).map(|i| (i, i)).collect();
        let size = m.table_size();
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.begin(), m.end());
        assert_eq!(m.table_size(), size);
        m.insert(7, 7);
        assert_eq!(m.iter().collect::<Vec<_>>(), [(&7, &7)]);
        m.raw.assert_consistent();
    }

    #[test]
    fn clone_and_equality() {
        let a: LinkedRobinMap<&str, i32> = [("a", 1), ("b", 2)].into();
        let mut b = a.clone();
        assert_eq!(a, b);
        b.remove("a");
        b.insert("a", 1);
        // Same contents in a different order still compare equal.
        assert_eq!(a, b);
        *b.get_mut("a").unwrap() = 3;
        assert_ne!(a, b);
        assert_eq!(a.get("a"), Some(&1));
    }

    #[test]
    fn debug_lists_in_insertion_order() {
        let m: LinkedRobinMap<&str, i32> = [("z", 1), ("a", 2)].into();
        assert_eq!(format!("{:?}", m), r#"{"z": 1, "a": 2}"#);
    }

    #[test]
    fn load_factor_stays_bounded() {
        let mut m: LinkedRobinMap<u64, ()> = LinkedRobinMap::new();
        for i in 0..1000 {
            m.insert(i, ());
            assert!(m.load_factor() < crate::MAX_LOAD_FACTOR);
        }
        m.raw.assert_consistent();
    }

    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_eq_during_find() {
        struct ReentryKey {
            id: &'static str,
            map: *const LinkedRobinMap<ReentryKey, i32, ConstBuildHasher>,
        }
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                if !other.map.is_null() {
                    // Reach back into the map mid-probe.
                    unsafe {
                        let _ = (*other.map).len();
                        let _ = (*other.map).contains_key(self);
                    }
                }
                self.id == other.id
            }
        }
        impl Eq for ReentryKey {}
        impl Hash for ReentryKey {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }

        let mut m: LinkedRobinMap<ReentryKey, i32, ConstBuildHasher> =
            LinkedRobinMap::with_hasher(ConstBuildHasher);
        m.insert(
            ReentryKey {
                id: "a",
                map: core::ptr::null(),
            },
            1,
        );
        let query = ReentryKey {
            id: "b",
            map: &m as *const _,
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = m.find(&query);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}
