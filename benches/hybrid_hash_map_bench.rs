use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use hybrid_hashmap::HybridHashMap;
use std::hash::{BuildHasher, Hasher};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

// Every key hashes to one of 16 values, all in bucket 0 of a 64-bucket
// table; lookups exercise the tree buckets.
#[derive(Clone, Copy, Default)]
struct Clustered;

struct ClusteredHasher(u64);

impl Hasher for ClusteredHasher {
    fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = self.0.wrapping_mul(131).wrapping_add(u64::from(*b));
        }
    }

    fn finish(&self) -> u64 {
        (self.0 & 0xf) << 12
    }
}

impl BuildHasher for Clustered {
    type Hasher = ClusteredHasher;

    fn build_hasher(&self) -> ClusteredHasher {
        ClusteredHasher(0)
    }
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("hybrid_hashmap_insert_10k", |b| {
        b.iter_batched(
            HybridHashMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("hybrid_hashmap_get_hit", |b| {
        let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();
        let m: HybridHashMap<String, u64> = keys
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, k)| (k, i as u64))
            .collect();
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.get(k));
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("hybrid_hashmap_get_miss", |b| {
        let m: HybridHashMap<String, u64> = lcg(11)
            .take(10_000)
            .enumerate()
            .map(|(i, x)| (key(x), i as u64))
            .collect();
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            // generate keys unlikely in map
            let k = key(miss.next().unwrap());
            black_box(m.get(&k));
        })
    });
}

fn bench_colliding_get(c: &mut Criterion) {
    c.bench_function("hybrid_hashmap_colliding_get_2k", |b| {
        let keys: Vec<_> = lcg(3).take(2_000).map(key).collect();
        let mut m = HybridHashMap::with_capacity_and_hasher(64, Clustered);
        for (i, k) in keys.iter().enumerate() {
            m.insert(k.clone(), i as u64);
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.get(k));
        })
    });
}

fn bench_insert_remove_churn(c: &mut Criterion) {
    c.bench_function("hybrid_hashmap_insert_remove_churn", |b| {
        let mut m = HybridHashMap::with_capacity_and_hasher(64, Clustered);
        let mut src = lcg(5);
        b.iter(|| {
            let k = key(src.next().unwrap() % 512);
            if m.remove(&k).is_none() {
                m.insert(k, 0u64);
            }
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert, bench_get_hit, bench_get_miss, bench_colliding_get, bench_insert_remove_churn
}
criterion_main!(benches);
