//! Simulation configuration
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a
//! valid configuration.

use serde::{Deserialize, Serialize};

use crate::significance::PValueMethod;
use crate::trend::{MetricRange, CONTROL_RANGE, TREATMENT_RANGE};
use crate::{Error, Result};

/// How a concluding experiment gets its outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizationMode {
    /// Independent synthetic draw, unrelated to the trend series
    #[default]
    Synthetic,
    /// Significance estimated from the accumulated trend series
    Estimated,
}

/// Tunables for [`SimulationScheduler`](super::SimulationScheduler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Range control values are drawn from
    pub control_range: MetricRange,
    /// Range treatment values are drawn from
    pub treatment_range: MetricRange,
    /// Smallest progress gain per simulated day
    pub progress_step_min: u8,
    /// Largest progress gain per simulated day
    pub progress_step_max: u8,
    /// Lowest synthetic improvement (inclusive)
    pub improvement_min: i64,
    /// Highest synthetic improvement (exclusive)
    pub improvement_max: i64,
    /// Annual dollars of impact per improvement point
    pub impact_per_point: f64,
    /// Outcome source at finalization
    pub finalization: FinalizationMode,
    /// p-value mapping used by [`FinalizationMode::Estimated`]
    pub p_value_method: PValueMethod,
    /// Simulated users per group per day for [`FinalizationMode::Estimated`]
    pub daily_users_per_group: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            control_range: CONTROL_RANGE,
            treatment_range: TREATMENT_RANGE,
            progress_step_min: 3,
            progress_step_max: 7,
            improvement_min: -5,
            improvement_max: 35,
            impact_per_point: 2_500.0,
            finalization: FinalizationMode::Synthetic,
            p_value_method: PValueMethod::StepTable,
            daily_users_per_group: 1_000,
        }
    }
}

impl SimulationConfig {
    /// Create a builder starting from the defaults.
    #[must_use]
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Parse a JSON configuration and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for malformed JSON or inconsistent values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that ranges are ordered and counts are positive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first inconsistent field.
    pub fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("controlRange", self.control_range),
            ("treatmentRange", self.treatment_range),
        ] {
            if !range.low.is_finite() || !range.high.is_finite() || range.low > range.high {
                return Err(Error::Config(format!(
                    "{name} must satisfy low <= high, got [{}, {}]",
                    range.low, range.high
                )));
            }
        }
        if self.progress_step_min > self.progress_step_max {
            return Err(Error::Config(format!(
                "progressStepMin ({}) exceeds progressStepMax ({})",
                self.progress_step_min, self.progress_step_max
            )));
        }
        if self.improvement_min >= self.improvement_max {
            return Err(Error::Config(format!(
                "improvementMin ({}) must be below improvementMax ({})",
                self.improvement_min, self.improvement_max
            )));
        }
        if !self.impact_per_point.is_finite() {
            return Err(Error::Config("impactPerPoint must be finite".to_string()));
        }
        if self.daily_users_per_group == 0 {
            return Err(Error::Config(
                "dailyUsersPerGroup must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for `SimulationConfig`.
#[derive(Debug, Default)]
pub struct SimulationConfigBuilder {
    config: SimulationConfig,
}

impl SimulationConfigBuilder {
    /// Set the metric ranges.
    #[must_use]
    pub const fn ranges(mut self, control: MetricRange, treatment: MetricRange) -> Self {
        self.config.control_range = control;
        self.config.treatment_range = treatment;
        self
    }

    /// Set the per-day progress gain range (inclusive).
    #[must_use]
    pub const fn progress_step(mut self, min: u8, max: u8) -> Self {
        self.config.progress_step_min = min;
        self.config.progress_step_max = max;
        self
    }

    /// Set the synthetic improvement range `[min, max)`.
    #[must_use]
    pub const fn improvement_range(mut self, min: i64, max: i64) -> Self {
        self.config.improvement_min = min;
        self.config.improvement_max = max;
        self
    }

    /// Set the annual dollar impact per improvement point.
    #[must_use]
    pub const fn impact_per_point(mut self, dollars: f64) -> Self {
        self.config.impact_per_point = dollars;
        self
    }

    /// Set the finalization mode.
    #[must_use]
    pub const fn finalization(mut self, mode: FinalizationMode) -> Self {
        self.config.finalization = mode;
        self
    }

    /// Set the p-value mapping for estimated finalization.
    #[must_use]
    pub const fn p_value_method(mut self, method: PValueMethod) -> Self {
        self.config.p_value_method = method;
        self
    }

    /// Set the simulated daily users per group.
    #[must_use]
    pub const fn daily_users_per_group(mut self, users: u64) -> Self {
        self.config.daily_users_per_group = users;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for inconsistent values.
    pub fn build(self) -> Result<SimulationConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.progress_step_min, 3);
        assert_eq!(config.progress_step_max, 7);
        assert_eq!(config.finalization, FinalizationMode::Synthetic);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = SimulationConfig::from_json(
            r#"{"finalization": "estimated", "dailyUsersPerGroup": 250}"#,
        )
        .unwrap();
        assert_eq!(config.finalization, FinalizationMode::Estimated);
        assert_eq!(config.daily_users_per_group, 250);
        assert_eq!(config.control_range, CONTROL_RANGE);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(
            SimulationConfig::from_json("{}").unwrap(),
            SimulationConfig::default()
        );
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        assert!(matches!(
            SimulationConfig::from_json("{not json"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            SimulationConfig::from_json(r#"{"progressStepMin": 9, "progressStepMax": 2}"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_builder_validates() {
        assert!(SimulationConfig::builder()
            .improvement_range(10, 10)
            .build()
            .is_err());
        assert!(SimulationConfig::builder()
            .daily_users_per_group(0)
            .build()
            .is_err());

        let config = SimulationConfig::builder()
            .progress_step(1, 2)
            .finalization(FinalizationMode::Estimated)
            .build()
            .unwrap();
        assert_eq!(config.progress_step_max, 2);
    }
}
