// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use criterion::{BenchmarkId, Criterion, Throughput};
use spillway_core::Publisher;
use spillway_runtime::SyncDispatcher;
use spillway_stream::{CallbackSink, IterSource, ScanStage};
use std::convert::Infallible;
use std::hint::black_box;
use std::sync::Arc;

pub fn bench_scan_running_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_running_sum");
    let sizes = [100u64, 1000u64, 10000u64];

    for &size in &sizes {
        let id = BenchmarkId::from_parameter(format!("n{size}"));
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(id, &size, |bencher, &size| {
            bencher.iter(|| {
                let main: Arc<SyncDispatcher> = Arc::new(SyncDispatcher::new("main"));
                let sums = ScanStage::with_seed(
                    main.clone(),
                    || Ok::<_, Infallible>(0u64),
                    |x: u64, sum: Option<u64>| Ok::<_, Infallible>(sum.unwrap_or(0) + x),
                );
                IterSource::new(main, 0..size).subscribe(sums.clone());
                sums.subscribe(Arc::new(CallbackSink::new(64, |sum: u64| {
                    black_box(sum);
                })));
            });
        });
    }

    group.finish();
}
