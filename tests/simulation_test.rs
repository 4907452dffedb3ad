//! Experiment simulation integration tests
//!
//! Lifecycle, counters, trend growth, finalization and determinism.

use trueno_lab::random::{RandomSource, SeededRandom};
use trueno_lab::simulation::{
    Experiment, ExperimentStatus, FinalizationMode, SimulationConfig, SimulationScheduler,
};
use trueno_lab::trend::{TrendSeriesGenerator, CONTROL_RANGE, TREATMENT_RANGE};

fn running(id: &str, days_running: u32, days_total: u32) -> Experiment {
    Experiment::builder(id, format!("Experiment {id}"), days_total)
        .status(ExperimentStatus::InProgress)
        .start_date("2024-03-01")
        .days_running(days_running)
        .build()
}

/// Always returns the same draw.
struct Constant(f64);

impl RandomSource for Constant {
    fn next(&mut self) -> f64 {
        self.0
    }
}

// =============================================================================
// Worked example
// =============================================================================

#[test]
fn test_last_day_completes_experiment() {
    let scheduler = SimulationScheduler::default();
    let out = scheduler.advance(&[running("exp-1", 4, 5)], 3, &mut SeededRandom::new(42));
    let experiment = &out[0];

    assert_eq!(experiment.days_running(), 5);
    assert_eq!(experiment.days_total(), 5);
    assert_eq!(experiment.progress(), 100);
    assert_eq!(experiment.status(), ExperimentStatus::Completed);
    assert_eq!(experiment.trend_series().len(), 1);
    assert_eq!(experiment.trend_series()[0].date, "2024-03-05");
    assert_eq!(experiment.end_date(), Some("2024-03-06"));

    let outcome = experiment.outcome().expect("finalized experiment has an outcome");
    assert!((-5.0..35.0).contains(&outcome.improvement));
    assert!((outcome.confidence - (100.0 - outcome.significance * 100.0)).abs() < 1e-9);
    assert!(!outcome.impact.is_empty());
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn test_zero_days_is_identity() {
    let experiments = vec![
        running("a", 0, 10),
        running("b", 9, 10),
        Experiment::new("c", "Draft", 7),
    ];
    let scheduler = SimulationScheduler::default();
    let out = scheduler.advance(&experiments, 0, &mut SeededRandom::new(1));
    assert_eq!(out, experiments);
}

#[test]
fn test_completed_experiments_are_left_alone() {
    let scheduler = SimulationScheduler::default();
    let mut rng = SeededRandom::new(5);

    let done = scheduler.advance(&[running("exp", 0, 3)], 10, &mut rng);
    assert!(done[0].is_completed());

    let again = scheduler.advance(&done, 10, &mut rng);
    let third = scheduler.advance(&again, 1, &mut rng);
    assert_eq!(again, done);
    assert_eq!(third, done);
}

#[test]
fn test_only_in_progress_experiments_move() {
    let statuses = [
        ExperimentStatus::Draft,
        ExperimentStatus::Planned,
        ExperimentStatus::Backlog,
        ExperimentStatus::UnderReview,
        ExperimentStatus::NeedsRevision,
        ExperimentStatus::Approved,
        ExperimentStatus::Paused,
        ExperimentStatus::Analyzing,
        ExperimentStatus::Documented,
        ExperimentStatus::Archived,
    ];
    let experiments: Vec<Experiment> = statuses
        .iter()
        .map(|&status| {
            Experiment::builder("x", "Idle", 10)
                .status(status)
                .start_date("2024-03-01")
                .build()
        })
        .collect();

    let out = SimulationScheduler::default().advance(&experiments, 5, &mut SeededRandom::new(3));
    assert_eq!(out, experiments);
}

#[test]
fn test_trend_grows_by_days_simulated() {
    let scheduler = SimulationScheduler::default();
    let mut rng = SeededRandom::new(11);
    let mut experiments = vec![running("long", 0, 200)];

    let mut previous_days = 0;
    let mut previous_progress = 0;
    for _ in 0..5 {
        experiments = scheduler.advance(&experiments, 2, &mut rng);
        let experiment = &experiments[0];
        if experiment.is_completed() {
            break;
        }
        assert_eq!(experiment.days_running(), previous_days + 2);
        assert_eq!(experiment.trend_series().len(), experiment.days_running() as usize);
        assert!(experiment.progress() >= previous_progress + 6);
        assert!(experiment.progress() <= previous_progress + 14);
        previous_days = experiment.days_running();
        previous_progress = experiment.progress();
    }
}

#[test]
fn test_trend_values_within_ranges() {
    let out = SimulationScheduler::default().advance(
        &[running("exp", 0, 300)],
        12,
        &mut SeededRandom::new(99),
    );
    for point in out[0].trend_series() {
        assert!(CONTROL_RANGE.contains(point.control_value), "{point:?}");
        assert!(TREATMENT_RANGE.contains(point.treatment_value), "{point:?}");
    }
}

#[test]
fn test_progress_driven_completion() {
    // Constant draws of 0.99 give 7 progress points per day
    let scheduler = SimulationScheduler::default();
    let out = scheduler.advance(&[running("exp", 0, 60)], 15, &mut Constant(0.99));
    let experiment = &out[0];

    assert!(experiment.is_completed());
    assert_eq!(experiment.days_running(), 15);
    assert_eq!(experiment.days_total(), 15);
    assert_eq!(experiment.trend_series().len(), 15);
    assert_eq!(experiment.progress(), 100);
}

#[test]
fn test_finalization_clears_knowledge_link() {
    let experiment = Experiment::builder("exp", "Linked", 2)
        .status(ExperimentStatus::InProgress)
        .start_date("2024-03-01")
        .knowledge_entry_id("kb-42")
        .build();
    let out = SimulationScheduler::default().advance(&[experiment], 2, &mut SeededRandom::new(0));
    assert_eq!(out[0].knowledge_entry_id(), None);
}

#[test]
fn test_malformed_start_date_uses_day_labels() {
    let experiment = Experiment::builder("exp", "Broken date", 3)
        .status(ExperimentStatus::InProgress)
        .start_date("03/01/2024")
        .build();
    let out = SimulationScheduler::default().advance(&[experiment], 3, &mut SeededRandom::new(0));

    let labels: Vec<&str> = out[0].trend_series().iter().map(|p| p.date.as_str()).collect();
    assert_eq!(labels, vec!["Day 1", "Day 2", "Day 3"]);
    assert!(out[0].is_completed());
    assert_eq!(out[0].end_date(), None);
}

#[test]
fn test_input_slice_is_not_modified() {
    let experiments = vec![running("exp", 0, 10)];
    let snapshot = experiments.clone();
    let _ = SimulationScheduler::default().advance(&experiments, 4, &mut SeededRandom::new(6));
    assert_eq!(experiments, snapshot);
}

// =============================================================================
// Determinism and configuration
// =============================================================================

#[test]
fn test_same_seed_same_result() {
    let experiments = vec![running("a", 0, 30), running("b", 10, 12)];
    let scheduler = SimulationScheduler::default();

    let first = scheduler.advance(&experiments, 7, &mut SeededRandom::new(2024));
    let second = scheduler.advance(&experiments, 7, &mut SeededRandom::new(2024));
    assert_eq!(first, second);
}

#[test]
fn test_historical_series_replayed() {
    let generator = TrendSeriesGenerator::default()
        .with_history("known", vec![(2.05, 2.95), (2.10, 3.00), (2.15, 3.05)]);
    let scheduler = SimulationScheduler::default().with_generator(generator);

    let out = scheduler.advance(&[running("known", 0, 30)], 2, &mut SeededRandom::new(1));
    let series = out[0].trend_series();
    assert!((series[0].control_value - 2.05).abs() < f64::EPSILON);
    assert!((series[1].treatment_value - 3.00).abs() < f64::EPSILON);
}

#[test]
fn test_estimated_finalization_mode() {
    let config = SimulationConfig::from_json(r#"{"finalization": "estimated"}"#).unwrap();
    assert_eq!(config.finalization, FinalizationMode::Estimated);
    let scheduler = SimulationScheduler::new(config).unwrap();

    let out = scheduler.advance(&[running("exp", 0, 14)], 14, &mut SeededRandom::new(12));
    let outcome = out[0].outcome().unwrap();
    assert!(outcome.improvement > 0.0);
    assert!(outcome.significance > 0.0 && outcome.significance <= 1.0);
}

#[test]
fn test_experiment_json_round_trip_after_simulation() {
    let out = SimulationScheduler::default().advance(
        &[running("exp", 0, 4)],
        4,
        &mut SeededRandom::new(77),
    );
    let json = serde_json::to_string(&out[0]).unwrap();
    assert!(json.contains("\"status\":\"completed\""));
    assert!(json.contains("\"trendSeries\""));

    let back: Experiment = serde_json::from_str(&json).unwrap();
    assert_eq!(back.id(), out[0].id());
    assert!(back.is_completed());
    assert_eq!(back.days_running(), out[0].days_running());
    assert_eq!(back.trend_series().len(), out[0].trend_series().len());
    assert_eq!(back.impact(), out[0].impact());
}
