//! Portfolio Simulation Example
//!
//! Walks one experiment from design to conclusion: size it, split traffic,
//! simulate a month of a small portfolio, then read significance from counts.
//!
//! Run with: cargo run --example simulate_portfolio
//! Verbose engine logs: RUST_LOG=trueno_lab=debug cargo run --example simulate_portfolio

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trueno_lab::allocation::AllocationSession;
use trueno_lab::latency::compute_sample_size_delayed;
use trueno_lab::power::{estimate_duration_days, Alpha, Power, PowerAnalysisRequest, TestType};
use trueno_lab::random::SeededRandom;
use trueno_lab::significance::{estimate_with, ConversionCounts, PValueMethod};
use trueno_lab::simulation::{
    Experiment, ExperimentStatus, FinalizationMode, SimulationConfig, SimulationScheduler,
};
use trueno_lab::trend::TrendSeriesGenerator;

const DAILY_TRAFFIC: u64 = 12_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Trueno-Lab Portfolio Simulation ===\n");

    // -------------------------------------------------------------------------
    // 1. Power analysis
    // -------------------------------------------------------------------------
    println!("1. Sizing the checkout experiment...");

    let request = PowerAnalysisRequest::new(TestType::Multivariate, 2.5, 10.0)
        .with_power(Power::P80)
        .with_alpha(Alpha::A05)
        .with_variant_count(3);
    let plan = compute_sample_size_delayed(&request, Duration::from_millis(50))
        .await
        .context("sizing the checkout experiment")?;
    let duration = estimate_duration_days(plan.total_sample_size, DAILY_TRAFFIC)?;

    println!("   Per group: {}", plan.per_group_sample_size);
    println!("   Total:     {}", plan.total_sample_size);
    println!("   Duration:  {duration} days at {DAILY_TRAFFIC} users/day");

    // -------------------------------------------------------------------------
    // 2. Traffic allocation
    // -------------------------------------------------------------------------
    println!("\n2. Splitting traffic...");

    let mut session = AllocationSession::with_groups(&["control", "variant_a", "variant_b"], 10.0)?;
    println!("   Equal split: {}", serde_json::to_string(session.current())?);

    session.edit("control", 50.0)?;
    println!("   Control at 50: {}", serde_json::to_string(session.current())?);

    session.edit("variant_b", 2.0)?;
    println!("   Variant B dragged to 2: {}", serde_json::to_string(session.current())?);

    // -------------------------------------------------------------------------
    // 3. Simulate the portfolio
    // -------------------------------------------------------------------------
    println!("\n3. Simulating the portfolio...");

    let portfolio = vec![
        Experiment::builder("exp-checkout", "Checkout redesign", u32::try_from(duration.min(30))?)
            .status(ExperimentStatus::InProgress)
            .start_date("2024-05-01")
            .build(),
        Experiment::builder("exp-pricing", "Pricing page copy", 21)
            .status(ExperimentStatus::InProgress)
            .start_date("2024-04-20")
            .days_running(12)
            .build(),
        Experiment::builder("exp-onboarding", "Onboarding checklist", 14)
            .status(ExperimentStatus::Planned)
            .start_date("2024-06-01")
            .build(),
    ];

    let config = SimulationConfig::builder()
        .finalization(FinalizationMode::Estimated)
        .p_value_method(PValueMethod::ChiSquareCdf)
        .build()?;
    let generator = TrendSeriesGenerator::new(config.control_range, config.treatment_range)
        .with_history("exp-pricing", vec![(2.10, 2.80); 12]);
    let scheduler = SimulationScheduler::new(config)?.with_generator(generator);

    let mut rng = SeededRandom::new(2024);
    let mut experiments = portfolio;
    for week in 1..=5 {
        let report = scheduler.advance_with_report(&experiments, 7, &mut rng);
        println!(
            "   Week {week}: advanced {:?}, completed {:?}",
            report.advanced, report.completed
        );
        experiments = report.experiments;
    }

    for experiment in &experiments {
        println!(
            "   {:<15} {:?} day {}/{} progress {}%",
            experiment.id(),
            experiment.status(),
            experiment.days_running(),
            experiment.days_total(),
            experiment.progress()
        );
        if let Some(outcome) = experiment.outcome() {
            println!(
                "   {:<15} lift {:+.1}% p={} ({})",
                "",
                outcome.improvement,
                outcome.significance,
                outcome.impact
            );
        }
    }

    // -------------------------------------------------------------------------
    // 4. Significance from raw counts
    // -------------------------------------------------------------------------
    println!("\n4. Reading significance from counts...");

    let counts = ConversionCounts::new(24_000, 600, 24_000, 690);
    for method in [PValueMethod::StepTable, PValueMethod::ChiSquareCdf] {
        let result = estimate_with(&counts, method)?;
        println!(
            "   {method:?}: {:.2}% -> {:.2}% ({:+.1}%), chi2={:.2}, p={:.4}, significant={}",
            result.control_rate,
            result.treatment_rate,
            result.relative_improvement_percent,
            result.statistic,
            result.p_value,
            result.is_significant
        );
    }

    let checkout = experiments
        .iter()
        .find(|e| e.id() == "exp-checkout")
        .context("checkout experiment missing from the portfolio")?;
    println!(
        "\nFinal checkout record:\n{}",
        serde_json::to_string_pretty(checkout)?
    );

    println!("\n=== Simulation Complete ===");
    Ok(())
}
