#![cfg(test)]

// Property tests for HybridHashMap kept inside the crate so they can audit
// the raw table after every step.

use crate::error::Error;
use crate::map::HybridHashMap;
use core::hash::{BuildHasher, Hasher};
use hashbrown::HashMap;
use proptest::prelude::*;

// Hasher with only eight distinct outputs, all multiples of 64, so every key
// lands in bucket 0 until the table grows past 64 buckets and most buckets
// hold many keys with identical hashes.
#[derive(Clone, Copy, Default)]
struct Collide;

struct CollideHasher(u64);

impl Hasher for CollideHasher {
    fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(u64::from(*b));
        }
    }

    fn finish(&self) -> u64 {
        (self.0 % 8) * 64
    }
}

impl BuildHasher for Collide {
    type Hasher = CollideHasher;

    fn build_hasher(&self) -> CollideHasher {
        CollideHasher(0)
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, i32),
    Remove(u16),
    RemoveIf(u16, i32),
    PutIfAbsent(u16, i32),
    Compute(u16, Option<i32>),
    Merge(u16, i32),
    Get(u16),
    CursorSweep(u16),
    Clear,
}

fn arb_ops(key_space: u16) -> impl Strategy<Value = Vec<Op>> {
    let k = 0..key_space;
    let op = prop_oneof![
        8 => (k.clone(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        4 => k.clone().prop_map(Op::Remove),
        1 => (k.clone(), -2..2i32).prop_map(|(k, v)| Op::RemoveIf(k, v)),
        2 => (k.clone(), -2..2i32).prop_map(|(k, v)| Op::PutIfAbsent(k, v)),
        2 => (k.clone(), proptest::option::of(-100..100i32)).prop_map(|(k, d)| Op::Compute(k, d)),
        2 => (k.clone(), -100..100i32).prop_map(|(k, v)| Op::Merge(k, v)),
        2 => k.clone().prop_map(Op::Get),
        1 => (1..4u16).prop_map(Op::CursorSweep),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..200)
}

fn run<S: BuildHasher>(mut sut: HybridHashMap<u16, i32, S>, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut model: HashMap<u16, i32> = HashMap::new();
    for op in ops {
        match op {
            Op::Insert(k, v) => {
                prop_assert_eq!(sut.insert(k, v), model.insert(k, v));
            }
            Op::Remove(k) => {
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
            }
            Op::RemoveIf(k, v) => {
                let expected = model.get(&k) == Some(&v);
                if expected {
                    model.remove(&k);
                }
                prop_assert_eq!(sut.remove_if(&k, &v), expected);
            }
            Op::PutIfAbsent(k, v) => {
                let existing = model.get(&k).copied();
                model.entry(k).or_insert(v);
                prop_assert_eq!(sut.put_if_absent(k, v).copied(), existing);
            }
            Op::Compute(k, delta) => {
                let next = delta.map(|d| model.get(&k).copied().unwrap_or(0).wrapping_add(d));
                match next {
                    Some(v) => model.insert(k, v),
                    None => model.remove(&k),
                };
                let got = sut.compute(k, |_, old| delta.map(|d| old.copied().unwrap_or(0).wrapping_add(d)));
                prop_assert_eq!(got.copied(), next);
            }
            Op::Merge(k, v) => {
                // Merging into zero removes.
                let next = match model.get(&k) {
                    None => Some(v),
                    Some(old) => Some(old.wrapping_add(v)).filter(|s| *s != 0),
                };
                match next {
                    Some(n) => model.insert(k, n),
                    None => model.remove(&k),
                };
                let got = sut.merge(k, v, |old, v| Some(old.wrapping_add(v)).filter(|s| *s != 0));
                prop_assert_eq!(got.copied(), next);
            }
            Op::Get(k) => {
                prop_assert_eq!(sut.get(&k), model.get(&k));
                prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
            }
            Op::CursorSweep(modulus) => {
                let mut cursor = sut.cursor();
                let mut doomed = Vec::new();
                while let Some((k, _)) = cursor.next(&sut).map_err(|e| TestCaseError::fail(e.to_string()))? {
                    if k % modulus == 0 {
                        doomed.push(*k);
                        cursor
                            .remove(&mut sut)
                            .map_err(|e| TestCaseError::fail(e.to_string()))?;
                    }
                }
                for k in doomed {
                    prop_assert!(model.remove(&k).is_some());
                }
                // A removal behind a fresh cursor's back fails its next step.
                let mut stale = sut.cursor();
                let first = stale
                    .next(&sut)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?
                    .map(|(k, _)| *k);
                if let Some(k) = first {
                    prop_assert!(sut.remove(&k).is_some());
                    model.remove(&k);
                    prop_assert_eq!(stale.next(&sut), Err(Error::ConcurrentModification));
                }
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }
        sut.table.validate().map_err(TestCaseError::fail)?;
        prop_assert_eq!(sut.len(), model.len());
    }
    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    prop_assert_eq!(sut.iter().count(), model.len());
    Ok(())
}

// Property: state-machine equivalence against hashbrown::HashMap.
// Invariants checked after every operation:
// - every node sits in the bucket its hash indexes;
// - tree buckets are valid red-black trees whose traversal list and tree
//   hold the same nodes;
// - chain buckets carry no tree links;
// - size and lookups agree with the model, including through cursor removal.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine_default_hasher(ops in arb_ops(512)) {
        run(HybridHashMap::new(), ops)?;
    }

    #[test]
    fn prop_state_machine_colliding(ops in arb_ops(96)) {
        run(HybridHashMap::with_hasher(Collide), ops)?;
    }

    #[test]
    fn prop_state_machine_colliding_ordered(ops in arb_ops(96)) {
        let map = HybridHashMap::<u16, i32>::builder()
            .hasher(Collide)
            .initial_capacity(64)
            .ordered_keys()
            .build()
            .unwrap();
        run(map, ops)?;
    }
}
