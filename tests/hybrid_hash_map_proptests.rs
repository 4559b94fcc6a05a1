// Property tests for HybridHashMap through its public API.
use hybrid_hashmap::{BucketKind, HybridHashMap, MIN_TREEIFY_CAPACITY};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::hash::{BuildHasher, Hasher};

// Hashes a u32 key to itself with the low bits cleared, so `shift` controls
// how many keys share each bucket.
#[derive(Clone, Copy)]
struct Masked {
    shift: u32,
}

struct MaskedHasher {
    shift: u32,
    value: u64,
}

impl Hasher for MaskedHasher {
    fn write(&mut self, _: &[u8]) {
        unreachable!("only u32 keys are hashed in these tests");
    }

    fn write_u32(&mut self, n: u32) {
        self.value = u64::from(n >> self.shift << self.shift);
    }

    fn finish(&self) -> u64 {
        self.value
    }
}

impl BuildHasher for Masked {
    type Hasher = MaskedHasher;

    fn build_hasher(&self) -> MaskedHasher {
        MaskedHasher {
            shift: self.shift,
            value: 0,
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]

    // Property: size equals the number of distinct keys inserted, and every
    // inserted key maps to its last value.
    #[test]
    fn prop_distinct_keys_and_roundtrip(pairs in proptest::collection::vec((any::<u32>(), any::<i64>()), 0..400)) {
        let mut m = HybridHashMap::new();
        let mut last = HashMap::new();
        for (k, v) in &pairs {
            m.insert(*k, *v);
            last.insert(*k, *v);
        }
        prop_assert_eq!(m.len(), last.len());
        for (k, v) in &last {
            prop_assert_eq!(m.get(k), Some(v));
        }
    }

    // Property: removing a key twice yields the value once, then None, and
    // leaves other keys untouched.
    #[test]
    fn prop_remove_idempotent(keys in proptest::collection::hash_set(any::<u16>(), 1..200), pick in any::<prop::sample::Index>()) {
        let keys: Vec<u16> = keys.into_iter().collect();
        let victim = keys[pick.index(keys.len())];
        let mut m: HybridHashMap<u16, u16> = keys.iter().map(|k| (*k, k.wrapping_mul(3))).collect();
        prop_assert_eq!(m.remove(&victim), Some(victim.wrapping_mul(3)));
        prop_assert_eq!(m.remove(&victim), None);
        prop_assert_eq!(m.len(), keys.len() - 1);
        for k in keys.iter().filter(|k| **k != victim) {
            prop_assert!(m.contains_key(k));
        }
    }

    // Property: with heavy collisions every entry still sits in the bucket
    // its hash selects, trees only exist in tables of at least 64 buckets,
    // and the buckets together hold each key exactly once.
    #[test]
    fn prop_placement_under_collisions(
        keys in proptest::collection::vec(0u32..4096, 0..600),
        shift in 4u32..10,
        removals in proptest::collection::vec(0u32..4096, 0..200),
    ) {
        let mut m = HybridHashMap::with_hasher(Masked { shift });
        let mut model = HashSet::new();
        for k in &keys {
            m.insert(*k, ());
            model.insert(*k);
        }
        for k in &removals {
            prop_assert_eq!(m.remove(k).is_some(), model.remove(k));
        }
        let cap = m.capacity();
        let mut seen = HashSet::new();
        for i in 0..cap {
            let kind = m.bucket_kind(i).unwrap();
            let mut n = 0;
            for (k, _) in m.bucket(i) {
                let h = k >> shift << shift;
                prop_assert_eq!((h ^ (h >> 16)) as usize & (cap - 1), i);
                prop_assert!(seen.insert(*k));
                n += 1;
            }
            if kind == BucketKind::Tree {
                prop_assert!(cap >= MIN_TREEIFY_CAPACITY);
                prop_assert!(n > 0);
            }
        }
        prop_assert_eq!(seen, model);
    }
}
