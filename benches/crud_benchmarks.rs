use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mindeg_tree::BTreeSet;
use std::collections::BTreeSet as StdSet;

const N: usize = 10_000;

// Degrees under test: a slim tree that rebalances often, and a wide one.
const SLIM: usize = 2;
const WIDE: usize = 16;

// ─── Helper functions to generate key sequences ─────────────────────────────

fn ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).collect()
}

fn random_keys(n: usize) -> Vec<i64> {
    // Simple LCG for a deterministic pseudo-random sequence.
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

fn fill<const M: usize>(keys: &[i64]) -> BTreeSet<i64, M> {
    let mut set = BTreeSet::new();
    for &k in keys {
        set.insert(k);
    }
    set
}

// ─── Insert ─────────────────────────────────────────────────────────────────

fn bench_insert_ordered(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_ordered");

    group.bench_function(BenchmarkId::new(format!("BTreeSet<_, {SLIM}>"), N), |b| {
        b.iter(|| fill::<SLIM>(&ordered_keys(N)));
    });

    group.bench_function(BenchmarkId::new(format!("BTreeSet<_, {WIDE}>"), N), |b| {
        b.iter(|| fill::<WIDE>(&ordered_keys(N)));
    });

    group.bench_function(BenchmarkId::new("std::BTreeSet", N), |b| {
        b.iter(|| {
            let mut set = StdSet::new();
            for i in 0..N as i64 {
                set.insert(i);
            }
            set
        });
    });

    group.finish();
}

fn bench_insert_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let mut group = c.benchmark_group("insert_random");

    group.bench_function(BenchmarkId::new(format!("BTreeSet<_, {SLIM}>"), N), |b| {
        b.iter(|| fill::<SLIM>(&keys));
    });

    group.bench_function(BenchmarkId::new(format!("BTreeSet<_, {WIDE}>"), N), |b| {
        b.iter(|| fill::<WIDE>(&keys));
    });

    group.bench_function(BenchmarkId::new("std::BTreeSet", N), |b| {
        b.iter(|| {
            let mut set = StdSet::new();
            for &k in &keys {
                set.insert(k);
            }
            set
        });
    });

    group.finish();
}

// ─── Lookup ─────────────────────────────────────────────────────────────────

fn bench_contains_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let wide: BTreeSet<i64, WIDE> = fill(&keys);
    let std_set: StdSet<i64> = keys.iter().copied().collect();

    let mut group = c.benchmark_group("contains_random");

    group.bench_function(BenchmarkId::new(format!("BTreeSet<_, {WIDE}>"), N), |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for k in &keys {
                if wide.contains(k) {
                    hits += 1;
                }
            }
            hits
        });
    });

    group.bench_function(BenchmarkId::new("std::BTreeSet", N), |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for k in &keys {
                if std_set.contains(k) {
                    hits += 1;
                }
            }
            hits
        });
    });

    group.finish();
}

// ─── Remove ─────────────────────────────────────────────────────────────────

fn bench_remove_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let mut group = c.benchmark_group("remove_random");

    group.bench_function(BenchmarkId::new(format!("BTreeSet<_, {SLIM}>"), N), |b| {
        b.iter_batched(
            || fill::<SLIM>(&keys),
            |mut set| {
                for k in &keys {
                    set.remove(k);
                }
                set
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function(BenchmarkId::new("std::BTreeSet", N), |b| {
        b.iter_batched(
            || keys.iter().copied().collect::<StdSet<i64>>(),
            |mut set| {
                for k in &keys {
                    set.remove(k);
                }
                set
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_ordered,
    bench_insert_random,
    bench_contains_random,
    bench_remove_random
);
criterion_main!(benches);
