//! Criterion benchmarks for the direction-model hot paths.
//!
//! Benchmarks:
//! 1. Feature assembly (default layout, inference mode)
//! 2. Lag expansion
//! 3. Classifier fit (reduced tree count)
//! 4. Full morning decision (train + predict)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use boostlab_core::domain::Bar;
use boostlab_core::features::{expand, AssemblyMode, FeatureAssembler};
use boostlab_core::model::{ClassifierParams, GradientBoostedClassifier};
use boostlab_core::{DirectionModel, ModelParams};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + (t * 0.1).sin() * 10.0 + (t * 0.37).cos() * 2.0;
            let open = close - 0.3 + (t * 0.71).sin() * 0.5;
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.5,
                low: open.min(close) - 1.5,
                close,
                volume: 1_000_000 + (i as u64 % 500_000),
            }
        })
        .collect()
}

fn quick_classifier() -> ClassifierParams {
    ClassifierParams {
        n_estimators: 100,
        ..ClassifierParams::default()
    }
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_assembly");
    let assembler = FeatureAssembler::default();
    for bar_count in [252, 1260, 2520] {
        let bars = make_bars(bar_count);
        group.bench_with_input(BenchmarkId::new("default_layout", bar_count), &bars, |b, bars| {
            b.iter(|| assembler.assemble(black_box(bars), AssemblyMode::Inference).unwrap())
        });
    }
    group.finish();
}

fn bench_lag_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("lag_expansion");
    let assembler = FeatureAssembler::default();
    let frame = assembler
        .assemble(&make_bars(1260), AssemblyMode::Inference)
        .unwrap()
        .frame;
    for window in [1, 2, 5] {
        group.bench_with_input(BenchmarkId::new("1260_rows", window), &window, |b, &w| {
            b.iter(|| expand(black_box(&frame), w).unwrap())
        });
    }
    group.finish();
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier_fit");
    group.sample_size(10);
    let model = DirectionModel::new(ModelParams::default()).unwrap();
    for bar_count in [504, 1260] {
        let set = model.training_set(&make_bars(bar_count)).unwrap();
        let matrix = set.frame.to_matrix();
        let labels = set.labels.values().to_vec();
        group.bench_with_input(BenchmarkId::new("100_trees", bar_count), &matrix, |b, x| {
            b.iter(|| GradientBoostedClassifier::fit(&quick_classifier(), black_box(x), &labels).unwrap())
        });
    }
    group.finish();
}

fn bench_morning_decision(c: &mut Criterion) {
    let mut group = c.benchmark_group("morning_decision");
    group.sample_size(10);
    let model = DirectionModel::new(ModelParams {
        classifier: quick_classifier(),
        ..ModelParams::default()
    })
    .unwrap();
    let bars = make_bars(504);
    group.bench_function("train_predict_504_bars", |b| {
        b.iter(|| {
            let trained = model.train(black_box(&bars)).unwrap();
            model.predict_allocation_fraction(&bars, &trained).unwrap()
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_assembly,
    bench_lag_expansion,
    bench_fit,
    bench_morning_decision
);
criterion_main!(benches);
