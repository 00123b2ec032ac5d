//! Benchmark suite for bucket traversal
//!
//! Covers:
//! - walker::traverse over wide and deep MemStore shapes
//! - audit over bolt images (in-memory bytes, no file I/O)
//!
//! Run: cargo bench --bench traversal

use boltstat::bolt::{BoltTx, BucketSpec, ImageBuilder};
use boltstat::{audit, traverse, MemStore, ReadTxn};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn wide_store(keys: usize) -> MemStore {
    let mut store = MemStore::new();
    let root = store.root();
    let ns = store.create_bucket(root, "ns");
    for i in 0..keys {
        store.put(ns, format!("key_{:08}", i), vec![0u8; 32]);
    }
    store
}

fn deep_store(depth: usize) -> MemStore {
    let mut store = MemStore::new();
    let root = store.root();
    let mut bucket = store.create_bucket(root, "ns");
    for _ in 0..depth {
        store.put(bucket, "k", "v");
        bucket = store.create_bucket(bucket, "child");
    }
    store
}

/// Root with `namespaces` named buckets and as many pooled 68-byte buckets,
/// each holding `keys` entries.
fn store_image(namespaces: usize, keys: usize) -> Vec<u8> {
    let mut root = BucketSpec::new();
    for n in 0..namespaces {
        let mut ns = BucketSpec::new();
        let mut log = BucketSpec::new();
        for i in 0..keys {
            ns.put(format!("key_{:08}", i), vec![1u8; 24]);
            log.put(format!("seq_{:08}", i), vec![2u8; 48]);
        }
        root.bucket(format!("namespace_{}", n), ns);
        root.bucket(format!("{:068}", n), log);
    }
    ImageBuilder::new().build(&root)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_traverse_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("traverse_wide");
    for keys in [1_000, 10_000, 100_000] {
        let store = wide_store(keys);
        let ns = store
            .resolve_bucket(&store.root(), b"ns")
            .unwrap()
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(keys), &keys, |b, _| {
            b.iter(|| black_box(traverse(&store, ns, 1).unwrap()));
        });
    }
    group.finish();
}

fn bench_traverse_deep(c: &mut Criterion) {
    let mut group = c.benchmark_group("traverse_deep");
    for depth in [100, 1_000, 10_000] {
        let store = deep_store(depth);
        let ns = store
            .resolve_bucket(&store.root(), b"ns")
            .unwrap()
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| black_box(traverse(&store, ns, 1).unwrap()));
        });
    }
    group.finish();
}

fn bench_audit_image(c: &mut Criterion) {
    let mut group = c.benchmark_group("audit_image");
    for (namespaces, keys) in [(10, 100), (100, 100), (10, 5_000)] {
        let image = store_image(namespaces, keys);
        let id = format!("{}x{}", namespaces, keys);
        group.bench_function(BenchmarkId::from_parameter(id), |b| {
            b.iter(|| {
                let tx = BoltTx::from_bytes(&image).unwrap();
                black_box(audit(&tx).unwrap())
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_traverse_wide,
    bench_traverse_deep,
    bench_audit_image
);
criterion_main!(benches);
