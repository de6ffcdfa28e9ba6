//! Criterion benchmarks for worker coordination primitives.

use std::hint::black_box;
use std::thread;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use prt_bench::{shared_state, WORKER_COUNTS};
use prt_engine::StartBarrier;

/// One release of a barrier shared by `n` scoped threads.
///
/// Includes thread spawn and join, which dominates at small `n`.
fn bench_rendezvous(c: &mut Criterion) {
    let mut group = c.benchmark_group("barrier_rendezvous");
    for workers in WORKER_COUNTS {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &n| {
            let barrier = StartBarrier::new(n);
            b.iter(|| {
                thread::scope(|s| {
                    for _ in 1..n {
                        s.spawn(|| barrier.arrive_and_wait().unwrap());
                    }
                    black_box(barrier.arrive_and_wait().unwrap());
                });
            });
        });
    }
    group.finish();
}

/// Uncontended ray id draws from the shared counter.
fn bench_ray_ids(c: &mut Criterion) {
    let shared = shared_state(1, 1).unwrap();
    c.bench_function("next_ray_id", |b| {
        b.iter(|| black_box(shared.next_ray_id()));
    });
}

/// Ray id draws from every worker at once.
fn bench_ray_ids_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_ray_id_contended");
    for workers in WORKER_COUNTS {
        let shared = shared_state(workers, 1).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &n| {
            b.iter(|| {
                thread::scope(|s| {
                    for _ in 0..n {
                        s.spawn(|| {
                            for _ in 0..256 {
                                black_box(shared.next_ray_id());
                            }
                        });
                    }
                });
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rendezvous, bench_ray_ids, bench_ray_ids_contended);
criterion_main!(benches);
