#![cfg(test)]

// Property tests for HashIndex kept inside the crate so they can check the
// slot array directly without feature gates.

use crate::hash_index::tests::{assert_index_invariants, ConstBuildHasher, IdentityBuildHasher};
use crate::hash_index::HashIndex;
use crate::InsertError;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::BuildHasher;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
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

// Pool-indexed operations shrink toward earlier keys and shorter op lists.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Replace(usize, i32),
    Remove(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Replace(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Runs `ops` against both the index and a std HashMap model, checking
// structural invariants after every step:
// - duplicate inserts are refused and leave the table untouched;
// - replace returns exactly the superseded pair;
// - remove returns the owned pair and the key stops resolving;
// - every occupied slot stays reachable from its ideal bucket.
fn run_scenario<S: BuildHasher>(
    mut sut: HashIndex<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let cap_before = sut.capacity();
                match sut.insert_unique(k.clone(), v) {
                    Ok(()) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                        prop_assert_eq!(sut.capacity(), cap_before, "refused insert resized");
                    }
                }
            }
            OpI::Replace(i, v) => {
                let k = key_from(pool, i);
                let cap_before = sut.capacity();
                let old = sut.insert_or_replace(k.clone(), v);
                let model_old = model.insert(k.clone(), v);
                prop_assert_eq!(old.as_ref().map(|(_, v)| *v), model_old);
                if let Some((ok, _)) = old {
                    prop_assert!(ok == k);
                    prop_assert_eq!(sut.capacity(), cap_before, "replace resized");
                }
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                match sut.remove(&k) {
                    Some((kk, vv)) => {
                        prop_assert!(kk == k);
                        let mv = model.remove(&kk);
                        prop_assert_eq!(Some(vv), mv);
                    }
                    None => prop_assert!(!model.contains_key(&k)),
                }
                prop_assert!(sut.find(&k).is_none());
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(vr) = sut.get_mut(k.0.as_str()) {
                    *vr = vr.saturating_add(d);
                    let mv = model.get_mut(&k);
                    prop_assert!(mv.is_some(), "mutated a key the model lacks");
                    if let Some(mv) = mv {
                        *mv = mv.saturating_add(d);
                    }
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                prop_assert_eq!(sut.iter().len(), model.len());
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), 0);
            }
        }

        assert_index_invariants(&sut);
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(HashIndex::new(), &pool, ops)?;
    }

    // Worst-case collisions: every key shares ideal bucket 0, so all probing
    // and backward shifting happens in one long run.
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(HashIndex::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    // Integer keys hashed to themselves cluster into adjacent buckets and
    // wrap around the end of the table, which stresses the cyclic range test
    // in backward-shift deletion.
    #[test]
    fn prop_clustered_removals(
        keys in proptest::collection::btree_set(0u64..64, 1..40),
        removals in proptest::collection::vec(0u64..64, 0..40),
    ) {
        let mut sut: HashIndex<u64, u64, IdentityBuildHasher> =
            HashIndex::with_hasher(IdentityBuildHasher::default());
        for &k in &keys {
            sut.insert_unique(k, k * 10).unwrap();
        }
        assert_index_invariants(&sut);
        let mut live = keys.clone();
        for r in removals {
            let removed = sut.remove(&r);
            prop_assert_eq!(removed.is_some(), live.remove(&r));
            assert_index_invariants(&sut);
        }
        for &k in &live {
            prop_assert_eq!(sut.get(&k), Some(&(k * 10)));
        }
        prop_assert_eq!(sut.len(), live.len());
    }
}
