// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use criterion::{BenchmarkId, Criterion, Throughput};
use spillway_core::Publisher;
use spillway_runtime::SyncDispatcher;
use spillway_stream::{CallbackSink, IterSource, ParallelStage};
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn run_pipeline(size: u64, pool_size: usize, prefetch: Option<u64>, batch: u64) -> u64 {
    let main = Arc::new(SyncDispatcher::new("main"));
    let parallel = ParallelStage::<u64>::new(main.clone(), &SyncDispatcher::factory(), pool_size).unwrap();
    if let Some(elements) = prefetch {
        parallel.prefetch(elements);
    }
    IterSource::new(main, 0..size).subscribe(parallel.clone());

    let total = Arc::new(AtomicU64::new(0));
    for worker in parallel.workers() {
        let total = total.clone();
        worker.subscribe(Arc::new(CallbackSink::new(batch, move |x: u64| {
            total.fetch_add(black_box(x), Ordering::Relaxed);
        })));
    }
    total.load(Ordering::Relaxed)
}

pub fn bench_parallel_round_robin(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_round_robin");
    let sizes = [100u64, 1000u64, 10000u64];
    let pool_sizes = [2usize, 4usize, 8usize];

    for &size in &sizes {
        for &pool_size in &pool_sizes {
            let id = BenchmarkId::from_parameter(format!("n{size}_w{pool_size}"));
            group.throughput(Throughput::Elements(size));
            group.bench_with_input(id, &(size, pool_size), |bencher, &(size, pool_size)| {
                bencher.iter(|| black_box(run_pipeline(size, pool_size, None, u64::MAX)));
            });
        }
    }

    group.finish();
}

pub fn bench_parallel_batched(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_batched");
    let size = 10000u64;
    let batches = [8u64, 64u64, 512u64];

    for &batch in &batches {
        let id = BenchmarkId::from_parameter(format!("b{batch}"));
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(id, &batch, |bencher, &batch| {
            bencher.iter(|| black_box(run_pipeline(size, 4, Some(batch * 4), batch)));
        });
    }

    group.finish();
}
