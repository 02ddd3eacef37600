//! Cursors and iterators over a `LinkedRobinMap`, all in insertion order.
//!
//! Everything here walks the entry store only. Slot-table cells move around
//! during probing and rehashing; store entries never do.

use crate::entry_store::{EntryStore, Handle, IntoEntries, Node, StoreIter};
use crate::linked_robin_map::LinkedRobinMap;
use core::iter::FusedIterator;
use slotmap::{DefaultKey, SecondaryMap};

/// A position in a map's insertion order, or the end sentinel.
///
/// Cursors are plain tokens: reading or writing through one goes through
/// the map it came from. Inserting never invalidates a cursor. Removing an
/// entry invalidates only cursors to that entry, which then resolve to
/// nothing rather than to some other entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Cursor {
    pos: Option<Handle>,
}

impl Cursor {
    pub(crate) const END: Cursor = Cursor { pos: None };

    pub(crate) fn at(pos: Option<Handle>) -> Self {
        Cursor { pos }
    }

    pub(crate) fn handle(&self) -> Option<Handle> {
        self.pos
    }

    /// True for the past-the-end position.
    pub fn is_end(&self) -> bool {
        self.pos.is_none()
    }

    pub fn key<'a, K, V, S>(&self, map: &'a LinkedRobinMap<K, V, S>) -> Option<&'a K> {
        self.get(map).map(|(k, _)| k)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a LinkedRobinMap<K, V, S>) -> Option<&'a V> {
        self.get(map).map(|(_, v)| v)
    }

    pub fn get<'a, K, V, S>(&self, map: &'a LinkedRobinMap<K, V, S>) -> Option<(&'a K, &'a V)> {
        let e = map.raw().store().get(self.pos?)?;
        Some((&e.key, &e.value))
    }

    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut LinkedRobinMap<K, V, S>) -> Option<&'a mut V> {
        map.raw_mut()
            .store_mut()
            .get_mut(self.pos?)
            .map(|e| &mut e.value)
    }

    /// The following position; `map.end()` after the last entry.
    #[must_use]
    pub fn next<K, V, S>(&self, map: &LinkedRobinMap<K, V, S>) -> Cursor {
        match self.pos {
            Some(h) => Cursor::at(map.raw().store().next(h)),
            None => Cursor::END,
        }
    }
}

/// Iterator over `(&K, &V)` in insertion order.
pub struct Iter<'a, K, V> {
    inner: StoreIter<'a, K, V>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(store: &'a EntryStore<K, V>) -> Self {
        Iter {
            inner: store.iter(),
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, e)| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in insertion order.
///
/// Construction is O(n): it collects a disjoint `&mut` to every node into a
/// `SecondaryMap` (one allocation) before the first item is yielded.
pub struct IterMut<'a, K, V> {
    // Disjoint borrows of every node, taken out one by one along the list.
    nodes: SecondaryMap<DefaultKey, &'a mut Node<K, V>>,
    cur: Option<DefaultKey>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(store: &'a mut EntryStore<K, V>) -> Self {
        let (arena, head) = store.nodes_mut();
        let mut nodes = SecondaryMap::with_capacity(arena.len());
        for (k, node) in arena.iter_mut() {
            nodes.insert(k, node);
        }
        IterMut { nodes, cur: head }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.remove(self.cur?)?;
        self.cur = node.next;
        let entry = &mut node.entry;
        Some((&entry.key, &mut entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.nodes.len(), Some(self.nodes.len()))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator over `(K, V)` in insertion order.
pub struct IntoIter<K, V> {
    inner: IntoEntries<K, V>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(store: EntryStore<K, V>) -> Self {
        IntoIter {
            inner: store.into_entries(),
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (e.key, e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    pub(crate) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

#[cfg(test)]
mod tests {
    use crate::LinkedRobinMap;

    fn sample() -> LinkedRobinMap<&'static str, i32> {
        [("x", 1), ("y", 2), ("z", 3)].into_iter().collect()
    }

    #[test]
    fn cursor_walks_to_end() {
        let m = sample();
        let mut c = m.begin();
        let mut seen = Vec::new();
        while c != m.end() {
            seen.push(c.get(&m).unwrap());
            c = c.next(&m);
        }
        assert_eq!(seen, [(&"x", &1), (&"y", &2), (&"z", &3)]);
        assert!(c.is_end());
        assert_eq!(c.next(&m), m.end());
    }

    #[test]
    fn cursor_on_empty_map_is_end() {
        let m: LinkedRobinMap<u8, u8> = LinkedRobinMap::new();
        assert_eq!(m.begin(), m.end());
        assert_eq!(m.begin().key(&m), None);
    }

    #[test]
    fn cursor_survives_inserts_and_unrelated_removal() {
        let mut m = sample();
        let y = m.find("y");
        for i in 0..100 {
            m.insert(Box::leak(format!("k{i}").into_boxed_str()), i);
        }
        m.remove("x");
        m.remove("z");
        assert_eq!(y.key(&m), Some(&"y"));
        assert_eq!(y.next(&m).key(&m), Some(&"k0"));
    }

    #[test]
    fn cursor_survives_removal_then_growth() {
        let mut m: LinkedRobinMap<u32, u32> = LinkedRobinMap::new();
        m.insert(0, 0);
        m.insert(1, 1);
        m.remove(&0);
        // Takes over the arena slot 0 freed.
        m.insert(2, 2);
        let one = m.find(&1);
        let two = m.find(&2);
        let size = m.table_size();
        for k in 100..140 {
            m.insert(k, k);
        }
        assert!(m.table_size() > size);
        assert_eq!(one.get(&m), Some((&1, &1)));
        assert_eq!(two.get(&m), Some((&2, &2)));
        assert_eq!(one.next(&m), two);
        assert_eq!(m.remove_at(one), Some((1, 1)));
        assert!(!m.contains_key(&1));
        assert!(m.contains_key(&2));
    }

    #[test]
    fn keys_and_values_clone_and_fuse() {
        let m = sample();
        let mut keys = m.keys();
        keys.next();
        let rest: Vec<_> = keys.clone().collect();
        assert_eq!(rest, [&"y", &"z"]);
        assert_eq!(keys.by_ref().count(), 2);
        assert_eq!(keys.next(), None);
        assert_eq!(keys.next(), None);
        let values = m.values();
        assert_eq!(values.clone().sum::<i32>(), values.sum::<i32>());
    }

    #[test]
    fn removed_cursor_goes_stale() {
        let mut m = sample();
        let y = m.find("y");
        assert_eq!(m.remove_at(y), Some(("y", 2)));
        assert_eq!(y.value(&m), None);
        assert_eq!(m.remove_at(y), None);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn value_mut_through_cursor() {
        let mut m = sample();
        let c = m.find("z");
        *c.value_mut(&mut m).unwrap() += 40;
        assert_eq!(m.get("z"), Some(&43));
        assert_eq!(m.end().value_mut(&mut m), None);
    }

    #[test]
    fn iter_mut_follows_insertion_order() {
        let mut m = sample();
        m.remove("x");
        m.insert("x", 10);
        let mut order = Vec::new();
        for (k, v) in m.iter_mut() {
            order.push(*k);
            *v *= 2;
        }
        assert_eq!(order, ["y", "z", "x"]);
        assert_eq!(m.values().copied().collect::<Vec<_>>(), [4, 6, 20]);
    }

    #[test]
    fn exact_sizes() {
        let mut m = sample();
        assert_eq!(m.iter().len(), 3);
        assert_eq!(m.keys().len(), 3);
        assert_eq!(m.values_mut().len(), 3);
        let mut it = m.into_iter();
        it.next();
        assert_eq!(it.len(), 2);
    }
}
