//! Engine benchmarks
//!
//! Baselines for the calculations an interactive form triggers on every
//! keystroke or slider move, plus one simulated-day sweep over a portfolio.
//!
//! Toyota Way: Genchi Genbutsu (measure, don't guess)
//!
//! Run with: cargo bench --bench engine_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trueno_lab::allocation::{equal_split, normalize, rebalance_after_edit, AllocationMap};
use trueno_lab::power::{compute_sample_size, PowerAnalysisRequest, TestType};
use trueno_lab::random::SeededRandom;
use trueno_lab::significance::{estimate_with, ConversionCounts, PValueMethod};
use trueno_lab::simulation::{Experiment, ExperimentStatus, SimulationScheduler};

const PORTFOLIO_SIZES: [usize; 3] = [10, 100, 1_000];

/// Benchmark sample-size calculation for each test family
fn bench_power(c: &mut Criterion) {
    let mut group = c.benchmark_group("power_analysis");

    for test_type in [
        TestType::Traditional,
        TestType::NonParametric,
        TestType::Multivariate,
    ] {
        let request = PowerAnalysisRequest::new(test_type, 2.5, 10.0).with_variant_count(4);
        group.bench_with_input(
            BenchmarkId::new("compute_sample_size", format!("{test_type:?}")),
            &request,
            |b, request| b.iter(|| compute_sample_size(black_box(request))),
        );
    }

    group.finish();
}

/// Benchmark normalization and slider rebalancing
fn bench_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation");

    for groups in [2usize, 5, 10] {
        let names: Vec<String> = (0..groups).map(|i| format!("variant_{i}")).collect();
        let skewed: AllocationMap = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), (i * i + 1) as f64))
            .collect();

        group.bench_with_input(BenchmarkId::new("normalize", groups), &skewed, |b, map| {
            b.iter(|| normalize(black_box(map), 5.0));
        });

        if let Ok(split) = equal_split(&names) {
            group.bench_with_input(
                BenchmarkId::new("rebalance_after_edit", groups),
                &split,
                |b, map| b.iter(|| rebalance_after_edit(black_box(map), "variant_0", 45.0, 5.0)),
            );
        }
    }

    group.finish();
}

/// Benchmark both p-value methods
fn bench_significance(c: &mut Criterion) {
    let mut group = c.benchmark_group("significance");
    let counts = ConversionCounts::new(20_000, 500, 20_000, 580);

    for method in [PValueMethod::StepTable, PValueMethod::ChiSquareCdf] {
        group.bench_with_input(
            BenchmarkId::new("estimate_with", format!("{method:?}")),
            &counts,
            |b, counts| b.iter(|| estimate_with(black_box(counts), method)),
        );
    }

    group.finish();
}

/// Benchmark one simulated week across portfolios of running experiments
fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_advance");
    let scheduler = SimulationScheduler::default();

    for size in PORTFOLIO_SIZES {
        let portfolio: Vec<Experiment> = (0..size)
            .map(|i| {
                Experiment::builder(format!("exp-{i}"), "Benchmark", 28)
                    .status(ExperimentStatus::InProgress)
                    .start_date("2024-01-01")
                    .days_running(u32::try_from(i % 21).unwrap_or(0))
                    .build()
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("advance_7_days", size), &portfolio, |b, p| {
            b.iter(|| scheduler.advance(black_box(p), 7, &mut SeededRandom::new(42)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_power,
    bench_allocation,
    bench_significance,
    bench_simulation
);
criterion_main!(benches);
