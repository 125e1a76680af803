//! Benchmarks for asset lock acquisition.

use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flinch_resources::{Asset, AssetManifest, MemoryFs, ResourceSystem, ResourceSystemOptions};

fn test_system(assets: u64) -> ResourceSystem {
    let manifest: AssetManifest = (0..assets)
        .map(|i| (Asset::new(i), format!("file_{}.bin", i)))
        .collect();
    let mut fs = MemoryFs::new();
    for i in 0..assets {
        fs.insert(format!("file_{}.bin", i), vec![i as u8; 256]);
    }
    ResourceSystem::new("bench", manifest, ResourceSystemOptions::default()).with_filesystem(fs)
}

fn bench_uncontended_lock(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncontended_lock");
    let system = test_system(1024);

    group.throughput(Throughput::Elements(1));
    group.bench_function("lock_release", |b| {
        let mut next = 0u64;
        b.iter(|| {
            let batch = system.next_batch_id();
            let mut lock = system.lock_asset(batch, Asset::new(black_box(next % 1024)));
            lock.release();
            next += 1;
        });
    });

    group.bench_function("lock_read_release", |b| {
        b.iter(|| {
            let batch = system.next_batch_id();
            let mut lock = system.lock_asset(batch, Asset::new(7));
            let bytes = system.read_bytes(black_box(Asset::new(7))).unwrap();
            lock.release();
            bytes
        });
    });

    group.finish();
}

fn bench_contended_lock(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_lock");

    for threads in [2usize, 4, 8] {
        group.throughput(Throughput::Elements((threads * 100) as u64));

        // All threads hammer one asset, or each thread gets its own.
        for shared in [true, false] {
            let label = if shared { "same_asset" } else { "distinct_assets" };
            let system = Arc::new(test_system(threads as u64));

            group.bench_with_input(BenchmarkId::new(label, threads), &threads, |b, &threads| {
                b.iter(|| {
                    thread::scope(|s| {
                        for t in 0..threads {
                            let system = &system;
                            s.spawn(move || {
                                let asset = Asset::new(if shared { 0 } else { t as u64 });
                                for _ in 0..100 {
                                    let mut lock = system.lock_asset(system.next_batch_id(), asset);
                                    lock.release();
                                }
                            });
                        }
                    });
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_uncontended_lock, bench_contended_lock);
criterion_main!(benches);
