//! Analysis and tuning throughput benchmark
//!
//! Measures a full `analyze` pass over record sets of increasing size, the
//! readiness gate on a finished result, and one in-memory tuning cycle.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench analysis_throughput
//! ```

use ascenso::evaluation::{analyze, check_readiness};
use ascenso::records::OutcomeRecord;
use ascenso::tuning::{AutoTuneController, MemoryTuningStore, TuningConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const CATEGORIES: [&str; 6] = [
    "isolated_queen_pawn",
    "minority_attack",
    "fortress",
    "king_hunt",
    "opposite_castling",
    "unknown",
];

/// Deterministic record set with mixed agreement between the variants
fn bench_records(n: usize) -> Vec<OutcomeRecord> {
    (0..n)
        .map(|i| {
            OutcomeRecord::new(format!("pos-{}", i), i % 5 < 3, i % 7 < 5)
                .with_category(CATEGORIES[i % CATEGORIES.len()])
                .with_features((i % 11) as f64 / 10.0, (i % 13) as f64)
        })
        .collect()
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");

    for size in [100usize, 1_000, 10_000, 100_000] {
        let records = bench_records(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| analyze(black_box(records)))
        });
    }

    group.finish();
}

fn bench_gate(c: &mut Criterion) {
    let result = analyze(&bench_records(1_000)).expect("non-empty records");

    c.bench_function("check_readiness", |b| {
        b.iter(|| check_readiness(black_box(&result)))
    });
}

fn bench_tuning_cycle(c: &mut Criterion) {
    let results: Vec<_> = (0..64)
        .map(|shift| analyze(&bench_records(500 + shift)).expect("non-empty records"))
        .collect();

    c.bench_function("tuning_cycle_memory_store", |b| {
        let config = TuningConfig::default();
        let store = MemoryTuningStore::new(config.lock_policy());
        let controller = AutoTuneController::new(store, config);
        let mut next = 0;

        b.iter(|| {
            // Rotate inputs so every cycle is a real transition, not a replay
            let result = &results[next % results.len()];
            next += 1;
            controller.evaluate(black_box(result))
        })
    });
}

criterion_group!(benches, bench_analyze, bench_gate, bench_tuning_cycle);
criterion_main!(benches);
