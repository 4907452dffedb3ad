//! Experiment record - the unit the scheduler advances

use serde::{Deserialize, Serialize};

use crate::trend::TrendPoint;

/// Lifecycle status of an experiment.
///
/// Only [`ExperimentStatus::InProgress`] experiments are advanced by the
/// simulation; [`ExperimentStatus::Completed`] is terminal for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    /// Idea captured, not yet specified.
    Draft,
    /// Specified and scheduled.
    Planned,
    /// Waiting for capacity.
    Backlog,
    /// Design under review.
    UnderReview,
    /// Review requested changes.
    NeedsRevision,
    /// Approved to launch.
    Approved,
    /// Collecting data.
    InProgress,
    /// Temporarily halted.
    Paused,
    /// Concluded with an outcome.
    Completed,
    /// Outcome being analyzed for the knowledge base.
    Analyzing,
    /// Learnings written up.
    Documented,
    /// Retired from active views.
    Archived,
}

impl ExperimentStatus {
    /// Whether the simulation may advance an experiment in this status.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Whether this is one of the post-completion knowledge states.
    #[must_use]
    pub const fn is_knowledge_stage(self) -> bool {
        matches!(self, Self::Analyzing | Self::Documented | Self::Archived)
    }
}

/// Synthetic or estimated result recorded when an experiment concludes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentOutcome {
    /// Relative improvement of treatment over control (%)
    pub improvement: f64,
    /// p-value
    pub significance: f64,
    /// `100 − 100 · significance`
    pub confidence: f64,
    /// Human-readable business impact
    pub impact: String,
}

/// Experiment as tracked by the platform.
///
/// The outcome fields stay `None` while the experiment runs and are written
/// exactly once, at finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    id: String,
    name: String,
    status: ExperimentStatus,
    start_date: String,
    #[serde(default)]
    end_date: Option<String>,
    days_running: u32,
    days_total: u32,
    progress: u8,
    #[serde(default)]
    trend_series: Vec<TrendPoint>,
    #[serde(default)]
    improvement: Option<f64>,
    #[serde(default)]
    significance: Option<f64>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    impact: Option<String>,
    #[serde(default)]
    knowledge_entry_id: Option<String>,
}

impl Experiment {
    /// Create a draft experiment planned to run for `days_total` days.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, days_total: u32) -> Self {
        ExperimentBuilder::new(id, name, days_total).build()
    }

    /// Create a builder for constructing an experiment with optional fields.
    #[must_use]
    pub fn builder(
        id: impl Into<String>,
        name: impl Into<String>,
        days_total: u32,
    ) -> ExperimentBuilder {
        ExperimentBuilder::new(id, name, days_total)
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ExperimentStatus {
        self.status
    }

    /// Get the start date as supplied (may be malformed).
    #[must_use]
    pub fn start_date(&self) -> &str {
        &self.start_date
    }

    /// Get the end date, set at finalization when the start date is valid.
    #[must_use]
    pub fn end_date(&self) -> Option<&str> {
        self.end_date.as_deref()
    }

    /// Days simulated so far.
    #[must_use]
    pub const fn days_running(&self) -> u32 {
        self.days_running
    }

    /// Planned length in days.
    #[must_use]
    pub const fn days_total(&self) -> u32 {
        self.days_total
    }

    /// Progress percentage, 0–100.
    #[must_use]
    pub const fn progress(&self) -> u8 {
        self.progress
    }

    /// Day-by-day metric history.
    #[must_use]
    pub fn trend_series(&self) -> &[TrendPoint] {
        &self.trend_series
    }

    /// Relative improvement (%), once finalized.
    #[must_use]
    pub const fn improvement(&self) -> Option<f64> {
        self.improvement
    }

    /// p-value, once finalized.
    #[must_use]
    pub const fn significance(&self) -> Option<f64> {
        self.significance
    }

    /// Confidence (%), once finalized.
    #[must_use]
    pub const fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    /// Impact summary, once finalized.
    #[must_use]
    pub fn impact(&self) -> Option<&str> {
        self.impact.as_deref()
    }

    /// Linked knowledge-base entry, if any.
    #[must_use]
    pub fn knowledge_entry_id(&self) -> Option<&str> {
        self.knowledge_entry_id.as_deref()
    }

    /// All outcome fields together, or `None` while any is missing.
    #[must_use]
    pub fn outcome(&self) -> Option<ExperimentOutcome> {
        Some(ExperimentOutcome {
            improvement: self.improvement?,
            significance: self.significance?,
            confidence: self.confidence?,
            impact: self.impact.clone()?,
        })
    }

    /// Whether the experiment has concluded.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == ExperimentStatus::Completed
    }

    /// Record simulated days: append trend points and move the counters.
    pub(crate) fn record_days(&mut self, points: Vec<TrendPoint>, days_running: u32, progress: u8) {
        self.trend_series.extend(points);
        self.days_running = days_running;
        self.progress = progress.min(100);
    }

    /// Conclude the experiment.
    ///
    /// An experiment that concludes before its planned length has its planned
    /// length cut to the days actually run.
    pub(crate) fn finalize(&mut self, outcome: ExperimentOutcome, end_date: Option<String>) {
        self.days_total = self.days_running;
        self.progress = 100;
        self.improvement = Some(outcome.improvement);
        self.significance = Some(outcome.significance);
        self.confidence = Some(outcome.confidence);
        self.impact = Some(outcome.impact);
        self.status = ExperimentStatus::Completed;
        self.knowledge_entry_id = None;
        self.end_date = end_date;
    }
}

/// Builder for `Experiment`.
#[derive(Debug)]
pub struct ExperimentBuilder {
    experiment: Experiment,
}

impl ExperimentBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, days_total: u32) -> Self {
        Self {
            experiment: Experiment {
                id: id.into(),
                name: name.into(),
                status: ExperimentStatus::Draft,
                start_date: String::new(),
                end_date: None,
                days_running: 0,
                days_total,
                progress: 0,
                trend_series: Vec::new(),
                improvement: None,
                significance: None,
                confidence: None,
                impact: None,
                knowledge_entry_id: None,
            },
        }
    }

    /// Set the lifecycle status.
    #[must_use]
    pub const fn status(mut self, status: ExperimentStatus) -> Self {
        self.experiment.status = status;
        self
    }

    /// Set the start date (`YYYY-MM-DD`).
    #[must_use]
    pub fn start_date(mut self, start_date: impl Into<String>) -> Self {
        self.experiment.start_date = start_date.into();
        self
    }

    /// Set the days already run.
    #[must_use]
    pub const fn days_running(mut self, days_running: u32) -> Self {
        self.experiment.days_running = days_running;
        self
    }

    /// Set the progress percentage.
    #[must_use]
    pub const fn progress(mut self, progress: u8) -> Self {
        self.experiment.progress = progress;
        self
    }

    /// Set an existing trend history.
    #[must_use]
    pub fn trend_series(mut self, trend_series: Vec<TrendPoint>) -> Self {
        self.experiment.trend_series = trend_series;
        self
    }

    /// Link a knowledge-base entry.
    #[must_use]
    pub fn knowledge_entry_id(mut self, entry_id: impl Into<String>) -> Self {
        self.experiment.knowledge_entry_id = Some(entry_id.into());
        self
    }

    /// Build the `Experiment`.
    ///
    /// Days running are capped at the planned length and progress at 100.
    #[must_use]
    pub fn build(mut self) -> Experiment {
        let experiment = &mut self.experiment;
        experiment.days_running = experiment.days_running.min(experiment.days_total);
        experiment.progress = experiment.progress.min(100);
        self.experiment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experiment_new_is_draft() {
        let experiment = Experiment::new("exp-1", "Checkout copy", 14);
        assert_eq!(experiment.id(), "exp-1");
        assert_eq!(experiment.name(), "Checkout copy");
        assert_eq!(experiment.status(), ExperimentStatus::Draft);
        assert_eq!(experiment.days_total(), 14);
        assert!(experiment.outcome().is_none());
    }

    #[test]
    fn test_builder_caps_counters() {
        let experiment = Experiment::builder("exp-2", "Pricing", 10)
            .days_running(25)
            .progress(180)
            .build();
        assert_eq!(experiment.days_running(), 10);
        assert_eq!(experiment.progress(), 100);
    }

    #[test]
    fn test_finalize_sets_outcome_once() {
        let mut experiment = Experiment::builder("exp-3", "Hero banner", 30)
            .status(ExperimentStatus::InProgress)
            .days_running(12)
            .knowledge_entry_id("kb-7")
            .build();

        experiment.finalize(
            ExperimentOutcome {
                improvement: 12.0,
                significance: 0.03,
                confidence: 97.0,
                impact: "+$30.0K annual impact".to_string(),
            },
            Some("2024-01-13".to_string()),
        );

        assert!(experiment.is_completed());
        assert_eq!(experiment.days_total(), 12);
        assert_eq!(experiment.progress(), 100);
        assert_eq!(experiment.knowledge_entry_id(), None);
        assert_eq!(experiment.outcome().unwrap().improvement, 12.0);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ExperimentStatus::NeedsRevision).unwrap();
        assert_eq!(json, "\"needs_revision\"");
        assert!(ExperimentStatus::InProgress.is_running());
        assert!(!ExperimentStatus::Paused.is_running());
        assert!(ExperimentStatus::Archived.is_knowledge_stage());
    }

    #[test]
    fn test_experiment_json_shape() {
        let json = r#"{
            "id": "exp-9",
            "name": "Onboarding",
            "status": "in_progress",
            "startDate": "2024-03-01",
            "daysRunning": 3,
            "daysTotal": 14,
            "progress": 20
        }"#;
        let experiment: Experiment = serde_json::from_str(json).unwrap();
        assert_eq!(experiment.status(), ExperimentStatus::InProgress);
        assert_eq!(experiment.days_running(), 3);
        assert!(experiment.trend_series().is_empty());
        assert!(experiment.improvement().is_none());
    }
}
