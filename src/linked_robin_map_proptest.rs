#![cfg(test)]

// Property tests for LinkedRobinMap kept inside the crate so they can check
// slot-table bookkeeping after every step, not just the public behavior.

use crate::{Cursor, LinkedRobinMap, LookupError};
use core::hash::BuildHasher;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::fmt;
use std::hash::Hasher;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so shrinking moves toward earlier keys.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Upsert(usize, i32),
    Remove(usize),
    RemoveAt(usize),
    Find(usize),
    At(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    // Pools large enough to push the table through a few rehashes.
    proptest::collection::vec("[a-z]{1,4}", 1..=60).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Upsert(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::RemoveAt),
            2 => idx.clone().prop_map(OpI::Find),
            1 => idx.clone().prop_map(OpI::At),
            1 => prop_oneof![contains_pool, "[a-z]{0,4}"].prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn position(model: &[(Key, i32)], k: &Key) -> Option<usize> {
    model.iter().position(|(mk, _)| mk == k)
}

// State-machine equivalence against an insertion-ordered Vec model.
// Checked after every op:
// - slot/displacement bookkeeping, contiguous chains, prime size, load bound;
// - `len`/`is_empty` parity;
// - iteration yields exactly the model, in first-insertion order;
// - the last cursor returned by a successful find names its key or nothing.
fn run_state_machine<S: BuildHasher>(
    mut sut: LinkedRobinMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: Vec<(Key, i32)> = Vec::new();
    let mut held: Option<(Cursor, Key)> = None;
    let key = |i: usize| Key(pool[i].clone());

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key(i);
                let already = position(&model, &k).is_some();
                prop_assert_eq!(sut.insert(k.clone(), v), !already);
                if !already {
                    model.push((k, v));
                }
            }
            OpI::Upsert(i, v) => {
                let k = key(i);
                *sut.get_or_default(k.clone()) = v;
                match position(&model, &k) {
                    Some(p) => model[p].1 = v,
                    None => model.push((k, v)),
                }
            }
            OpI::Remove(i) => {
                let k = key(i);
                let expected = position(&model, &k).map(|p| model.remove(p).1);
                prop_assert_eq!(sut.remove(k.0.as_str()), expected);
                prop_assert!(sut.find(&k).is_end());
            }
            OpI::RemoveAt(i) => {
                let k = key(i);
                let c = sut.find(&k);
                let expected = position(&model, &k).map(|p| model.remove(p));
                prop_assert_eq!(c.is_end(), expected.is_none());
                prop_assert_eq!(sut.remove_at(c), expected);
            }
            OpI::Find(i) => {
                let k = key(i);
                let c = sut.find(&k);
                let expected = position(&model, &k).map(|p| &model[p].1);
                prop_assert_eq!(c.value(&sut), expected);
                if expected.is_some() {
                    prop_assert_eq!(c.key(&sut), Some(&k));
                    held = Some((c, k));
                }
            }
            OpI::At(i) => {
                let k = key(i);
                let expected = position(&model, &k)
                    .map(|p| &model[p].1)
                    .ok_or(LookupError::NotFound);
                prop_assert_eq!(sut.at(&k), expected);
            }
            OpI::Contains(s) => {
                let has_model = model.iter().any(|(k, _)| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key(i);
                if let Some(p) = position(&model, &k) {
                    let vr = sut.get_mut(&k);
                    prop_assert!(vr.is_some(), "live key should resolve");
                    if let Some(vr) = vr {
                        *vr = vr.saturating_add(d);
                    }
                    model[p].1 = model[p].1.saturating_add(d);
                } else {
                    prop_assert!(sut.get_mut(&k).is_none());
                }
            }
            OpI::Iterate => {
                let seen: Vec<(Key, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(&seen, &model);
            }
            OpI::Clear => {
                let size = sut.table_size();
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.table_size(), size);
            }
        }

        // Stale once its entry is removed, even if the key came back since.
        if let Some((ck, cv)) = held.as_ref().and_then(|(c, _)| c.get(&sut)) {
            let k = held.as_ref().map(|(_, k)| k);
            prop_assert_eq!(Some(ck), k);
            let p = position(&model, ck);
            prop_assert!(p.is_some(), "cursor outlived its entry");
            if let Some(p) = p {
                prop_assert_eq!(*cv, model[p].1);
            }
        }

        sut.raw().assert_consistent();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }

    let keys: Vec<&Key> = sut.keys().collect();
    let model_keys: Vec<&Key> = model.iter().map(|(k, _)| k).collect();
    prop_assert_eq!(keys, model_keys);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(LinkedRobinMap::new(), &pool, ops)?;
    }
}

// Hashes into a handful of buckets so chains overlap and wrap.
#[derive(Clone, Default)]
struct FewBucketsBuildHasher;
#[derive(Default)]
struct FewBucketsHasher(u64);
impl BuildHasher for FewBucketsBuildHasher {
    type Hasher = FewBucketsHasher;
    fn build_hasher(&self) -> Self::Hasher {
        FewBucketsHasher::default()
    }
}
impl Hasher for FewBucketsHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(b as u64);
        }
    }
    fn finish(&self) -> u64 {
        // Land on the last cells of the initial table to force wrap-around.
        35 + self.0 % 4
    }
}

// Constant hasher: every key shares one probe chain.
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
    }
}

// Same invariants under heavy clustering, which stresses Robin Hood swaps
// and backward shifts across the end of the table.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_clustered((pool, ops) in arb_scenario()) {
        run_state_machine(LinkedRobinMap::with_hasher(FewBucketsBuildHasher), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(LinkedRobinMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}
