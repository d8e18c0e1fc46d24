//! Accumulator benchmarks
//!
//! The loop calls `track` once per frame, so its cost must not grow with the
//! number of buffered rows:
//! - track into buffers of increasing size
//! - record batch conversion before rotation

use chrono::Local;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use facewatch::metrics::MetricsAccumulator;
use facewatch::pipeline::STANDARD_METRICS;

/// Accumulator over the standard metrics with `rows` rows already buffered
#[allow(clippy::cast_precision_loss)]
fn filled(rows: usize) -> MetricsAccumulator {
    let mut acc = MetricsAccumulator::new();
    acc.declare_schema(STANDARD_METRICS).unwrap();
    let now = Local::now();
    for i in 0..rows {
        acc.track_at(now, STANDARD_METRICS.map(|m| (m, i as f64))).unwrap();
    }
    acc
}

/// Benchmark one track call against a growing buffer
fn bench_track(c: &mut Criterion) {
    let mut group = c.benchmark_group("track");

    for buffered in [0, 10_000, 100_000] {
        let mut acc = filled(buffered);
        let now = Local::now();
        let row = STANDARD_METRICS.map(|m| (m, 0.5));

        group.bench_with_input(BenchmarkId::from_parameter(buffered), &buffered, |b, _| {
            b.iter(|| {
                acc.track_at(now, black_box(row)).unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark row → Arrow conversion done at rotation
fn bench_to_record_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_record_batch");

    for rows in [1_000, 10_000] {
        let acc = filled(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| black_box(acc.to_record_batch().unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_track, bench_to_record_batch);
criterion_main!(benches);
