//! Advances running experiments through simulated days.

use serde::{Deserialize, Serialize};

use super::config::{FinalizationMode, SimulationConfig};
use super::experiment::{Experiment, ExperimentOutcome};
use crate::random::RandomSource;
use crate::significance::{estimate_with, ConversionCounts};
use crate::trend::{offset_date, parse_date, TrendPoint, TrendSeriesGenerator, DATE_FORMAT};
use crate::Result;

/// Result of one [`SimulationScheduler::advance_with_report`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    /// All experiments, advanced copies in place of eligible ones
    pub experiments: Vec<Experiment>,
    /// IDs of experiments that gained at least one day
    pub advanced: Vec<String>,
    /// IDs of experiments that concluded during this call
    pub completed: Vec<String>,
}

/// Drives the simulated timeline of running experiments.
///
/// ## Per-experiment step
///
/// ```text
/// days   = min(requested, days_total − days_running)        (0 → no-op)
/// trend += one point per simulated day
/// progress = 100 if the plan is exhausted, else + 3..=7 per day (≤ 100)
/// finalize if progress == 100
/// ```
///
/// Experiments not in progress are returned unchanged, so repeated calls on
/// a completed experiment are idempotent.
#[derive(Debug, Clone, Default)]
pub struct SimulationScheduler {
    config: SimulationConfig,
    generator: TrendSeriesGenerator,
}

impl SimulationScheduler {
    /// Create a scheduler from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the configuration is inconsistent.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let generator = TrendSeriesGenerator::new(config.control_range, config.treatment_range);
        Ok(Self { config, generator })
    }

    /// Replace the trend generator (for example one with historical series).
    #[must_use]
    pub fn with_generator(mut self, generator: TrendSeriesGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Trend generator in use.
    #[must_use]
    pub const fn generator(&self) -> &TrendSeriesGenerator {
        &self.generator
    }

    /// Advance every in-progress experiment by up to `days` simulated days.
    ///
    /// Returns new copies; the input slice is never modified.
    ///
    /// # Example
    ///
    /// ```rust
    /// use trueno_lab::random::SeededRandom;
    /// use trueno_lab::simulation::{Experiment, ExperimentStatus, SimulationScheduler};
    ///
    /// let running = Experiment::builder("exp-1", "Checkout button", 5)
    ///     .status(ExperimentStatus::InProgress)
    ///     .start_date("2024-01-01")
    ///     .days_running(4)
    ///     .build();
    ///
    /// let scheduler = SimulationScheduler::default();
    /// let advanced = scheduler.advance(&[running], 3, &mut SeededRandom::new(1));
    ///
    /// assert_eq!(advanced[0].days_running(), 5);
    /// assert_eq!(advanced[0].trend_series().len(), 1);
    /// assert!(advanced[0].is_completed());
    /// ```
    pub fn advance<R: RandomSource + ?Sized>(
        &self,
        experiments: &[Experiment],
        days: u32,
        rng: &mut R,
    ) -> Vec<Experiment> {
        self.advance_with_report(experiments, days, rng).experiments
    }

    /// Like [`advance`](Self::advance), also reporting which experiments
    /// moved and which concluded.
    #[tracing::instrument(skip(self, experiments, rng), fields(count = experiments.len()))]
    pub fn advance_with_report<R: RandomSource + ?Sized>(
        &self,
        experiments: &[Experiment],
        days: u32,
        rng: &mut R,
    ) -> SimulationReport {
        let mut report = SimulationReport {
            experiments: Vec::with_capacity(experiments.len()),
            advanced: Vec::new(),
            completed: Vec::new(),
        };

        for experiment in experiments {
            let mut next = experiment.clone();
            match self.step(&mut next, days, rng) {
                Step::Unchanged => {}
                Step::Advanced => report.advanced.push(next.id().to_string()),
                Step::Completed => {
                    report.advanced.push(next.id().to_string());
                    report.completed.push(next.id().to_string());
                }
            }
            report.experiments.push(next);
        }

        tracing::debug!(
            advanced = report.advanced.len(),
            completed = report.completed.len(),
            "simulation step finished"
        );
        report
    }

    fn step<R: RandomSource + ?Sized>(
        &self,
        experiment: &mut Experiment,
        days: u32,
        rng: &mut R,
    ) -> Step {
        if !experiment.status().is_running() {
            return Step::Unchanged;
        }

        let remaining = experiment
            .days_total()
            .saturating_sub(experiment.days_running());
        let days_to_simulate = days.min(remaining);
        if days_to_simulate == 0 {
            return Step::Unchanged;
        }

        let points = self.generator.extend(
            experiment.id(),
            experiment.start_date(),
            experiment.days_running(),
            days_to_simulate,
            rng,
        );
        let new_days_running = experiment.days_running() + days_to_simulate;
        let plan_exhausted = new_days_running >= experiment.days_total();

        let progress = if plan_exhausted {
            100
        } else {
            self.next_progress(experiment.progress(), days_to_simulate, rng)
        };

        experiment.record_days(points, new_days_running, progress);
        tracing::trace!(
            id = experiment.id(),
            days_to_simulate,
            days_running = new_days_running,
            progress,
            "advanced experiment"
        );

        if progress < 100 && !plan_exhausted {
            return Step::Advanced;
        }

        let outcome = self.outcome(experiment, rng);
        let end_date = offset_date(parse_date(experiment.start_date()), new_days_running)
            .map(|d| d.format(DATE_FORMAT).to_string());

        tracing::debug!(
            id = experiment.id(),
            improvement = outcome.improvement,
            significance = outcome.significance,
            early = !plan_exhausted,
            "experiment completed"
        );
        experiment.finalize(outcome, end_date);
        Step::Completed
    }

    fn next_progress<R: RandomSource + ?Sized>(&self, current: u8, days: u32, rng: &mut R) -> u8 {
        let low = i64::from(self.config.progress_step_min);
        let high = i64::from(self.config.progress_step_max) + 1;

        let mut progress = i64::from(current.min(100));
        for _ in 0..days {
            if progress >= 100 {
                break;
            }
            progress += rng.uniform_int(low, high);
        }
        u8::try_from(progress.clamp(0, 100)).unwrap_or(100)
    }

    fn outcome<R: RandomSource + ?Sized>(
        &self,
        experiment: &Experiment,
        rng: &mut R,
    ) -> ExperimentOutcome {
        if self.config.finalization == FinalizationMode::Estimated {
            match self.estimated_outcome(experiment.trend_series()) {
                Ok(outcome) => return outcome,
                Err(err) => tracing::warn!(
                    id = experiment.id(),
                    error = %err,
                    "estimated finalization failed, using synthetic outcome"
                ),
            }
        }
        self.synthetic_outcome(rng)
    }

    fn synthetic_outcome<R: RandomSource + ?Sized>(&self, rng: &mut R) -> ExperimentOutcome {
        let improvement = rng.uniform_int(self.config.improvement_min, self.config.improvement_max);
        #[allow(clippy::cast_precision_loss)]
        let improvement = improvement as f64;
        let significance = synthetic_significance(improvement);

        ExperimentOutcome {
            improvement,
            significance,
            confidence: significance.mul_add(-100.0, 100.0),
            impact: format_impact(improvement, self.config.impact_per_point),
        }
    }

    fn estimated_outcome(&self, series: &[TrendPoint]) -> Result<ExperimentOutcome> {
        let counts = trend_counts(series, self.config.daily_users_per_group);
        let result = estimate_with(&counts, self.config.p_value_method)?;
        let improvement = (result.relative_improvement_percent * 10.0).round() / 10.0;

        Ok(ExperimentOutcome {
            improvement,
            significance: result.p_value,
            confidence: result.confidence_percent,
            impact: format_impact(improvement, self.config.impact_per_point),
        })
    }
}

enum Step {
    Unchanged,
    Advanced,
    Completed,
}

/// p-value assigned to a synthetic improvement; larger lifts are more
/// significant.
#[must_use]
pub fn synthetic_significance(improvement: f64) -> f64 {
    if improvement > 20.0 {
        0.001
    } else if improvement > 15.0 {
        0.01
    } else if improvement > 10.0 {
        0.03
    } else if improvement > 5.0 {
        0.08
    } else if improvement > 0.0 {
        0.20
    } else {
        0.50
    }
}

/// Format the annual dollar impact of an improvement, e.g. `+$37.5K annual
/// impact`.
#[must_use]
pub fn format_impact(improvement: f64, dollars_per_point: f64) -> String {
    let amount = improvement * dollars_per_point;
    let sign = if amount < 0.0 { "-" } else { "+" };
    let magnitude = amount.abs();

    let figure = if magnitude >= 1_000_000.0 {
        format!("{:.1}M", magnitude / 1_000_000.0)
    } else if magnitude >= 1_000.0 {
        format!("{:.1}K", magnitude / 1_000.0)
    } else {
        format!("{magnitude:.0}")
    };
    format!("{sign}${figure} annual impact")
}

/// Convert a trend series of conversion percentages into raw counts at
/// `daily_users` users per group per day.
fn trend_counts(series: &[TrendPoint], daily_users: u64) -> ConversionCounts {
    let days = u64::try_from(series.len()).unwrap_or(u64::MAX);
    let users = days.saturating_mul(daily_users);

    #[allow(clippy::cast_precision_loss)]
    let daily = daily_users as f64;
    let conversions = |values: &mut dyn Iterator<Item = f64>| -> u64 {
        let total: f64 = values.map(|v| (v / 100.0).clamp(0.0, 1.0) * daily).sum();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rounded = total.round() as u64;
        rounded.min(users)
    };

    ConversionCounts::new(
        users,
        conversions(&mut series.iter().map(|p| p.control_value)),
        users,
        conversions(&mut series.iter().map(|p| p.treatment_value)),
    )
}
