#![cfg(test)]

// Property tests for CountedMap kept inside the crate next to the unit tests.
// A std HashMap plus a signed counter serves as the reference model.

use crate::counted_map::{CountedMap, LengthMismatch};
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations so shrinking moves towards earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    Remove(usize),
    Pop(usize),
    Ensure(usize, i32),
    LazyEnsure(usize, i32),
    Update(Vec<(usize, i32)>),
    Empty,
    RawInsert(usize, i32),
    Resync,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=6).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Pop),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Ensure(i, v)),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::LazyEnsure(i, v)),
            1 => proptest::collection::vec((idx.clone(), any::<i32>()), 0..4).prop_map(OpI::Update),
            1 => Just(OpI::Empty),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::RawInsert(i, v)),
            1 => Just(OpI::Resync),
        ];
        (Just(pool), proptest::collection::vec(op, 1..80))
    })
}

proptest! {
    // Invariants exercised:
    // - Contents always match the model, key for key.
    // - `len()` matches the model counter, which drops on every remove/pop
    //   (present or not) and ignores raw inserts through `items_obj`.
    // - `lazy_ensure` calls its default exactly when the key is absent.
    #[test]
    fn prop_counted_map_matches_model((pool, ops) in arb_scenario()) {
        let mut m: CountedMap<String, i32> = CountedMap::new();
        let mut model: HashMap<String, i32> = HashMap::new();
        let mut model_len: isize = 0;

        for op in ops {
            match op {
                OpI::Put(i, v) => {
                    let k = pool[i].clone();
                    if model.insert(k.clone(), v).is_none() {
                        model_len += 1;
                    }
                    prop_assert_eq!(*m.put(k, v), v);
                }
                OpI::Remove(i) => {
                    model.remove(&pool[i]);
                    model_len -= 1;
                    m.remove(pool[i].as_str());
                }
                OpI::Pop(i) => {
                    let expected = model.remove(&pool[i]);
                    model_len -= 1;
                    prop_assert_eq!(m.pop(pool[i].as_str()), expected);
                }
                OpI::Ensure(i, v) => {
                    let k = pool[i].clone();
                    let expected = *model.entry(k.clone()).or_insert_with(|| {
                        model_len += 1;
                        v
                    });
                    prop_assert_eq!(*m.ensure(k, v), expected);
                }
                OpI::LazyEnsure(i, v) => {
                    let k = pool[i].clone();
                    let was_present = model.contains_key(&k);
                    let expected = *model.entry(k.clone()).or_insert_with(|| {
                        model_len += 1;
                        v
                    });
                    let calls = Cell::new(0);
                    let got = *m.lazy_ensure(k, |_| {
                        calls.set(calls.get() + 1);
                        v
                    });
                    prop_assert_eq!(got, expected);
                    prop_assert_eq!(calls.get(), if was_present { 0 } else { 1 });
                }
                OpI::Update(pairs) => {
                    let pairs: Vec<(String, i32)> =
                        pairs.into_iter().map(|(i, v)| (pool[i].clone(), v)).collect();
                    for (k, v) in pairs.iter().cloned() {
                        if model.insert(k, v).is_none() {
                            model_len += 1;
                        }
                    }
                    m.update(pairs);
                }
                OpI::Empty => {
                    model.clear();
                    model_len = 0;
                    m.empty();
                }
                OpI::RawInsert(i, v) => {
                    model.insert(pool[i].clone(), v);
                    m.items_obj().insert(pool[i].clone(), v);
                }
                OpI::Resync => {
                    model_len = model.len() as isize;
                    m.resync();
                }
            }

            prop_assert_eq!(m.len(), model_len);
            prop_assert_eq!(m.storage_len(), model.len());
            for k in &pool {
                prop_assert_eq!(m.get(k.as_str()), model.get(k));
                prop_assert_eq!(m.contains(k.as_str()), model.contains_key(k));
            }
            let expected_check = if model_len == model.len() as isize {
                Ok(())
            } else {
                Err(LengthMismatch { recorded: model_len, actual: model.len() })
            };
            prop_assert_eq!(m.check_len(), expected_check);
        }

        let keys: BTreeSet<String> = m.keys().into_iter().collect();
        let model_keys: BTreeSet<String> = model.keys().cloned().collect();
        prop_assert_eq!(keys, model_keys);
    }

    // Without removals of absent keys or raw writes, the counter never drifts.
    #[test]
    fn prop_len_tracks_distinct_keys(ops in proptest::collection::vec((any::<bool>(), 0u8..8u8), 1..100)) {
        let mut m: CountedMap<String, u8> = CountedMap::new();
        for (is_put, k) in ops {
            let key = format!("k{}", k);
            if is_put {
                m.put(key, k);
            } else if m.contains(key.as_str()) {
                m.remove(key.as_str());
            }
            prop_assert!(m.check_len().is_ok());
            prop_assert!(m.len() >= 0);
        }
    }
}
