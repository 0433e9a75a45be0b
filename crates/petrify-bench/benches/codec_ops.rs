//! Criterion micro-benchmarks for recording, serializing and replaying
//! whole workloads.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use petrify_bench::{record_workload, reference_profile, workload_blob};
use petrify_record::StateRecorder;
use petrify_replay::StateReplayer;
use petrify_test_utils::RecordingCreator;

/// Benchmark: capture the reference workload into a fresh recorder.
fn bench_record_reference(c: &mut Criterion) {
    let profile = reference_profile();

    c.bench_function("record_reference", |b| {
        b.iter_batched(
            StateRecorder::new,
            |mut recorder| {
                let n = record_workload(&mut recorder, profile).unwrap();
                black_box(n);
                recorder
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: serialize an already recorded reference workload.
fn bench_serialize_reference(c: &mut Criterion) {
    let mut recorder = StateRecorder::new();
    record_workload(&mut recorder, reference_profile()).unwrap();

    c.bench_function("serialize_reference", |b| {
        b.iter(|| {
            let blob = recorder.serialize();
            black_box(blob.len());
        });
    });
}

/// Benchmark: replay the reference blob into a logging creator.
///
/// A fresh replayer per batch keeps arena growth out of the measurement.
fn bench_replay_reference(c: &mut Criterion) {
    let blob = workload_blob(reference_profile()).unwrap();

    c.bench_function("replay_reference", |b| {
        b.iter_batched(
            StateReplayer::new,
            |replayer| {
                let mut creator = RecordingCreator::new();
                let summary = replayer.parse(&mut creator, &blob).unwrap();
                black_box(summary.total());
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_record_reference,
    bench_serialize_reference,
    bench_replay_reference
);
criterion_main!(benches);
