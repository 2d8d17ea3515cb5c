use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use shift_collections::hash_index::HashIndex;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn bench_insert_unique_100k(c: &mut Criterion) {
    c.bench_function("index::insert_unique_100k_u64", |b| {
        b.iter_batched(
            HashIndex::<u64, u64>::new,
            |mut idx| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    idx.insert_unique(x, i as u64).unwrap();
                }
                black_box(idx)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_presized_insert_100k(c: &mut Criterion) {
    c.bench_function("index::insert_unique_100k_presized", |b| {
        b.iter_batched(
            || HashIndex::<u64, u64>::with_capacity_and_hasher(100_000, Default::default()),
            |mut idx| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    idx.insert_unique(x, i as u64).unwrap();
                }
                black_box(idx)
            },
            BatchSize::SmallInput,
        )
    });
}

// Removal at high load exercises long backward shifts.
fn bench_remove_at_threshold(c: &mut Criterion) {
    c.bench_function("index::remove_all_at_three_quarter_load", |b| {
        let keys: Vec<u64> = lcg(2).take(98_304).collect();
        b.iter_batched(
            || {
                let mut idx = HashIndex::<u64, u64>::new();
                for &k in &keys {
                    idx.insert_unique(k, k).unwrap();
                }
                idx
            },
            |mut idx| {
                for k in &keys {
                    black_box(idx.remove(k));
                }
                black_box(idx)
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_iter_and_drain(c: &mut Criterion) {
    c.bench_function("index::iter_mut_then_drain_100k", |b| {
        b.iter_batched(
            || {
                let mut idx = HashIndex::<u64, u64>::new();
                for (i, x) in lcg(3).take(100_000).enumerate() {
                    idx.insert_unique(x, i as u64).unwrap();
                }
                idx
            },
            |mut idx| {
                for (_, v) in idx.iter_mut() {
                    *v = v.wrapping_add(1);
                }
                black_box(idx.drain().map(|(_, v)| v).sum::<u64>())
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert_unique_100k,
              bench_presized_insert_100k,
              bench_remove_at_threshold,
              bench_iter_and_drain
}
criterion_main!(benches);
