//! Synthetic trend series generation
//!
//! Produces day-by-day metric pairs for a running experiment: one value for
//! the control group and one for the treatment group. Values are conversion
//! rates in percent, rounded to two decimals for display.
//!
//! Two shapes are supported:
//!
//! - **Control/treatment**: both series drawn from their own fixed ranges
//!   every day.
//! - **Pre/post cohorts**: both series share the control range until the
//!   treatment day, then the treatment series diverges.
//!
//! Experiments with a registered historical series replay it for the days it
//! covers instead of drawing.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::random::RandomSource;

/// Date format used for generated trend points and end dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One simulated day of metric values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// Calendar date (`YYYY-MM-DD`) or `Day N` when the start date is unusable
    pub date: String,
    /// Control group metric value
    pub control_value: f64,
    /// Treatment group metric value
    pub treatment_value: f64,
}

/// Closed range `[low, high]` a metric is drawn from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricRange {
    /// Lower bound
    pub low: f64,
    /// Upper bound
    pub high: f64,
}

impl MetricRange {
    /// Create a range.
    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    fn draw<R: RandomSource + ?Sized>(self, rng: &mut R) -> f64 {
        round2(rng.uniform(self.low, self.high))
    }

    /// Whether `value` lies inside the range.
    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Default control metric range.
pub const CONTROL_RANGE: MetricRange = MetricRange::new(2.0, 2.3);
/// Default treatment metric range.
pub const TREATMENT_RANGE: MetricRange = MetricRange::new(2.7, 3.1);

/// Generator for synthetic trend points.
#[derive(Debug, Clone)]
pub struct TrendSeriesGenerator {
    control: MetricRange,
    treatment: MetricRange,
    history: HashMap<String, Vec<(f64, f64)>>,
}

impl Default for TrendSeriesGenerator {
    fn default() -> Self {
        Self::new(CONTROL_RANGE, TREATMENT_RANGE)
    }
}

impl TrendSeriesGenerator {
    /// Create a generator with explicit control and treatment ranges.
    #[must_use]
    pub fn new(control: MetricRange, treatment: MetricRange) -> Self {
        Self {
            control,
            treatment,
            history: HashMap::new(),
        }
    }

    /// Register a fixed historical series for a known experiment.
    ///
    /// Day `i` of the experiment replays `values[i]` as
    /// `(control, treatment)`; days past the end are drawn randomly.
    #[must_use]
    pub fn with_history(
        mut self,
        experiment_id: impl Into<String>,
        values: Vec<(f64, f64)>,
    ) -> Self {
        self.history.insert(experiment_id.into(), values);
        self
    }

    /// Historical series registered for an experiment, if any.
    #[must_use]
    pub fn history(&self, experiment_id: &str) -> Option<&[(f64, f64)]> {
        self.history.get(experiment_id).map(Vec::as_slice)
    }

    /// Control range in use.
    #[must_use]
    pub const fn control_range(&self) -> MetricRange {
        self.control
    }

    /// Treatment range in use.
    #[must_use]
    pub const fn treatment_range(&self) -> MetricRange {
        self.treatment
    }

    /// Draw a single control/treatment point for `date`.
    pub fn point<R: RandomSource + ?Sized>(&self, date: String, rng: &mut R) -> TrendPoint {
        TrendPoint {
            date,
            control_value: self.control.draw(rng),
            treatment_value: self.treatment.draw(rng),
        }
    }

    /// Generate `days` consecutive points for an experiment, starting at the
    /// zero-based day index `first_day`.
    ///
    /// A malformed `start_date` yields `Day N` labels instead of dates.
    pub fn extend<R: RandomSource + ?Sized>(
        &self,
        experiment_id: &str,
        start_date: &str,
        first_day: u32,
        days: u32,
        rng: &mut R,
    ) -> Vec<TrendPoint> {
        let start = parse_date(start_date);
        let history = self.history(experiment_id);

        (first_day..first_day.saturating_add(days))
            .map(|day| {
                let date = day_label(start, day);
                match history.and_then(|h| h.get(day as usize)) {
                    Some(&(control_value, treatment_value)) => TrendPoint {
                        date,
                        control_value,
                        treatment_value,
                    },
                    None => self.point(date, rng),
                }
            })
            .collect()
    }

    /// Generate a pre/post-treatment cohort series.
    ///
    /// Before the zero-based `treatment_day` both values come from the control
    /// range; from `treatment_day` on the treatment value comes from the
    /// treatment range.
    pub fn cohort_series<R: RandomSource + ?Sized>(
        &self,
        start_date: &str,
        days: u32,
        treatment_day: u32,
        rng: &mut R,
    ) -> Vec<TrendPoint> {
        let start = parse_date(start_date);

        (0..days)
            .map(|day| {
                let date = day_label(start, day);
                let control_value = self.control.draw(rng);
                let treatment_value = if day < treatment_day {
                    self.control.draw(rng)
                } else {
                    self.treatment.draw(rng)
                };
                TrendPoint {
                    date,
                    control_value,
                    treatment_value,
                }
            })
            .collect()
    }
}

/// Parse a `YYYY-MM-DD` date, returning `None` when malformed.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Date `offset` days after `start`, or `None` if `start` is missing or the
/// calendar overflows.
#[must_use]
pub fn offset_date(start: Option<NaiveDate>, offset: u32) -> Option<NaiveDate> {
    start.and_then(|d| d.checked_add_days(Days::new(u64::from(offset))))
}

/// Label for the zero-based simulated `day`.
///
/// Falls back to `Day N` (one-based) when there is no usable start date.
#[must_use]
pub fn day_label(start: Option<NaiveDate>, day: u32) -> String {
    offset_date(start, day).map_or_else(
        || format!("Day {}", u64::from(day) + 1),
        |d| d.format(DATE_FORMAT).to_string(),
    )
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandom;

    #[test]
    fn test_point_within_default_ranges() {
        let generator = TrendSeriesGenerator::default();
        let mut rng = SeededRandom::new(11);
        for _ in 0..500 {
            let point = generator.point("2024-01-01".to_string(), &mut rng);
            assert!(CONTROL_RANGE.contains(point.control_value));
            assert!(TREATMENT_RANGE.contains(point.treatment_value));
        }
    }

    #[test]
    fn test_extend_dates_follow_start() {
        let generator = TrendSeriesGenerator::default();
        let mut rng = SeededRandom::new(1);
        let points = generator.extend("exp-1", "2024-02-27", 1, 3, &mut rng);

        let dates: Vec<&str> = points.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-02-28", "2024-02-29", "2024-03-01"]);
    }

    #[test]
    fn test_extend_malformed_start_uses_day_labels() {
        let generator = TrendSeriesGenerator::default();
        let mut rng = SeededRandom::new(1);
        let points = generator.extend("exp-1", "next tuesday", 4, 2, &mut rng);

        assert_eq!(points[0].date, "Day 5");
        assert_eq!(points[1].date, "Day 6");
    }

    #[test]
    fn test_extend_replays_history_then_draws() {
        let generator =
            TrendSeriesGenerator::default().with_history("known", vec![(1.0, 9.0), (1.5, 9.5)]);
        let mut rng = SeededRandom::new(5);
        let points = generator.extend("known", "2024-01-01", 1, 3, &mut rng);

        assert!((points[0].control_value - 1.5).abs() < f64::EPSILON);
        assert!((points[0].treatment_value - 9.5).abs() < f64::EPSILON);
        assert!(CONTROL_RANGE.contains(points[1].control_value));
        assert!(TREATMENT_RANGE.contains(points[2].treatment_value));
    }

    #[test]
    fn test_cohort_series_diverges_at_treatment_day() {
        let generator = TrendSeriesGenerator::default();
        let mut rng = SeededRandom::new(9);
        let points = generator.cohort_series("2024-01-01", 10, 4, &mut rng);

        assert_eq!(points.len(), 10);
        for point in &points[..4] {
            assert!(CONTROL_RANGE.contains(point.treatment_value));
        }
        for point in &points[4..] {
            assert!(TREATMENT_RANGE.contains(point.treatment_value));
        }
    }

    #[test]
    fn test_trend_point_serializes_camel_case() {
        let point = TrendPoint {
            date: "Day 1".to_string(),
            control_value: 2.1,
            treatment_value: 2.9,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert!(json.get("controlValue").is_some());
        assert!(json.get("treatmentValue").is_some());
    }
}
