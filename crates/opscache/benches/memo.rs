use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use expensiveops::{ExpensiveOps, ReferenceOps};
use opscache::{CacheKey, CachedOps, MemoStore};

fn bench_cached_is_prime(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_is_prime");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("is_prime_1e12_hit", |b| {
        let ops = CachedOps::new(ReferenceOps::new());

        // Warm the cache
        ops.is_prime(1_000_000_005_721);

        b.iter(|| {
            black_box(ops.is_prime(black_box(1_000_000_005_721)));
        });
    });

    group.bench_function("is_prime_1e12_uncached", |b| {
        let ops = ReferenceOps::new();
        b.iter(|| {
            black_box(ops.is_prime(black_box(1_000_000_005_721)));
        });
    });

    group.finish();
}

fn bench_store_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("50_hit_50_miss", |b| {
        let store: MemoStore<u64, ()> = MemoStore::new();
        let mut counter = 0i64;
        b.iter(|| {
            let n = if counter % 2 == 0 { 0 } else { counter };
            let key = CacheKey::build("op", vec![n.into()]).unwrap();
            black_box(store.get_or_compute(key, || Ok(n as u64)).ok());
            counter += 1;
        });
    });

    group.finish();
}

criterion_group!(benches, bench_cached_is_prime, bench_store_mixed);
criterion_main!(benches);
