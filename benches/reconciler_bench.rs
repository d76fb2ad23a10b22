//! Benchmark for reconciling transfer lists of various sizes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::{Duration, Instant};
use upload_monitor::structured_logging::CycleContext;
use upload_monitor::{Reconciler, TransferSnapshot};

fn create_snapshot(size: usize) -> Vec<TransferSnapshot> {
    (0..size)
        .map(|i| {
            let status = if i % 5 == 0 { "finished" } else { "running" };
            let entry = TransferSnapshot::upload(i as u64 + 1, &format!("file-{}.bin", i), status);
            // Mix in downloads so the filter path is exercised
            if i % 3 == 0 {
                entry.with_download(Some(true))
            } else {
                entry
            }
        })
        .collect()
}

fn bench_classify_steady_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconciler");

    for size in [16, 128, 1024].iter() {
        let snapshot = create_snapshot(*size);
        let start = Instant::now();
        let mut reconciler = Reconciler::with_start(Duration::from_secs(3600), start);
        let ctx = CycleContext::at(start);

        let outcome = reconciler.classify(&snapshot, &ctx);
        for t in &outcome.newly_detected {
            reconciler.mark_notified(t.display_name());
        }

        group.bench_with_input(BenchmarkId::new("classify", size), &snapshot, |b, snapshot| {
            b.iter(|| black_box(reconciler.classify(black_box(snapshot), &ctx)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify_steady_state);
criterion_main!(benches);
