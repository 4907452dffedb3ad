//! Significance estimation from raw conversion counts
//!
//! Builds a 2×2 contingency table (converted / not converted × control /
//! treatment), computes Pearson's chi-square statistic against the counts
//! expected under the pooled conversion rate, and maps it to a p-value.
//!
//! The default mapping is a coarse step table. [`PValueMethod::ChiSquareCdf`]
//! uses the one-degree-of-freedom chi-square survival function instead,
//! through the standard normal: `P(χ²₁ > s) = 2·P(Z > √s)`.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// p-values strictly below this threshold are significant.
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Statistic upper bounds and the p-value reported below each bound.
const STEP_TABLE: [(f64, f64); 5] = [(1.0, 0.30), (2.0, 0.15), (3.0, 0.08), (4.0, 0.04), (6.0, 0.01)];

/// p-value reported when the statistic exceeds every step.
const STEP_FLOOR: f64 = 0.001;

/// How the test statistic is mapped to a p-value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PValueMethod {
    /// Fixed step table
    #[default]
    StepTable,
    /// Chi-square (1 df) survival function
    ChiSquareCdf,
}

/// Raw user and conversion counts for a two-group test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionCounts {
    /// Users exposed to control
    pub control_users: u64,
    /// Control users who converted
    pub control_conversions: u64,
    /// Users exposed to treatment
    pub treatment_users: u64,
    /// Treatment users who converted
    pub treatment_conversions: u64,
}

impl ConversionCounts {
    /// Bundle raw counts.
    #[must_use]
    pub const fn new(
        control_users: u64,
        control_conversions: u64,
        treatment_users: u64,
        treatment_conversions: u64,
    ) -> Self {
        Self {
            control_users,
            control_conversions,
            treatment_users,
            treatment_conversions,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.control_users == 0 || self.treatment_users == 0 {
            return Err(Error::InvalidInput(format!(
                "user counts must be positive (control={}, treatment={})",
                self.control_users, self.treatment_users
            )));
        }
        if self.control_conversions > self.control_users {
            return Err(Error::InvalidInput(format!(
                "control conversions ({}) exceed control users ({})",
                self.control_conversions, self.control_users
            )));
        }
        if self.treatment_conversions > self.treatment_users {
            return Err(Error::InvalidInput(format!(
                "treatment conversions ({}) exceed treatment users ({})",
                self.treatment_conversions, self.treatment_users
            )));
        }
        Ok(())
    }
}

/// Outcome of a significance estimate. Rates are in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignificanceResult {
    /// Control conversion rate (%)
    pub control_rate: f64,
    /// Treatment conversion rate (%)
    pub treatment_rate: f64,
    /// Relative change of treatment over control (%)
    pub relative_improvement_percent: f64,
    /// Chi-square test statistic
    pub statistic: f64,
    /// Approximate p-value in (0, 1]
    pub p_value: f64,
    /// `100 · (1 − p)`
    pub confidence_percent: f64,
    /// `p_value < 0.05`
    pub is_significant: bool,
}

/// Estimate significance with the default step-table mapping.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if either user count is zero or conversions
///   exceed users.
/// - [`Error::ArithmeticDomain`] if the control rate is zero, which leaves
///   the relative improvement undefined.
///
/// # Example
///
/// ```rust
/// use trueno_lab::significance::estimate;
///
/// let result = estimate(1000, 100, 1000, 150)?;
/// assert!(result.is_significant);
/// assert!((result.relative_improvement_percent - 50.0).abs() < 1e-9);
/// # Ok::<(), trueno_lab::Error>(())
/// ```
pub fn estimate(
    control_users: u64,
    control_conversions: u64,
    treatment_users: u64,
    treatment_conversions: u64,
) -> Result<SignificanceResult> {
    estimate_with(
        &ConversionCounts::new(
            control_users,
            control_conversions,
            treatment_users,
            treatment_conversions,
        ),
        PValueMethod::StepTable,
    )
}

/// Estimate significance with an explicit p-value method.
///
/// # Errors
///
/// Same as [`estimate`].
pub fn estimate_with(counts: &ConversionCounts, method: PValueMethod) -> Result<SignificanceResult> {
    counts.validate()?;

    let control_rate = ratio(counts.control_conversions, counts.control_users);
    let treatment_rate = ratio(counts.treatment_conversions, counts.treatment_users);

    if control_rate == 0.0 {
        return Err(Error::ArithmeticDomain(
            "control conversion rate is zero; relative improvement is undefined".to_string(),
        ));
    }

    let statistic = chi_square_statistic(counts);
    let p_value = match method {
        PValueMethod::StepTable => step_p_value(statistic),
        PValueMethod::ChiSquareCdf => chi_square_p_value(statistic),
    };

    Ok(SignificanceResult {
        control_rate: control_rate * 100.0,
        treatment_rate: treatment_rate * 100.0,
        relative_improvement_percent: (treatment_rate - control_rate) / control_rate * 100.0,
        statistic,
        p_value,
        confidence_percent: 100.0 * (1.0 - p_value),
        is_significant: p_value < SIGNIFICANCE_THRESHOLD,
    })
}

/// Pearson chi-square statistic for the 2×2 table.
///
/// Cells with zero expected count contribute nothing; their observed count
/// is necessarily zero too.
#[must_use]
pub fn chi_square_statistic(counts: &ConversionCounts) -> f64 {
    let total_users = to_f64(counts.control_users) + to_f64(counts.treatment_users);
    if total_users == 0.0 {
        return 0.0;
    }
    let pooled = (to_f64(counts.control_conversions) + to_f64(counts.treatment_conversions))
        / total_users;

    let cells = [
        (counts.control_users, counts.control_conversions),
        (counts.treatment_users, counts.treatment_conversions),
    ];

    cells
        .iter()
        .flat_map(|&(users, conversions)| {
            let users_f = to_f64(users);
            [
                (to_f64(conversions), users_f * pooled),
                (to_f64(users.saturating_sub(conversions)), users_f * (1.0 - pooled)),
            ]
        })
        .filter(|&(_, expected)| expected > 0.0)
        .map(|(observed, expected)| (observed - expected).powi(2) / expected)
        .sum()
}

/// Map a statistic to a p-value through the fixed step table.
#[must_use]
pub fn step_p_value(statistic: f64) -> f64 {
    STEP_TABLE
        .iter()
        .find(|&&(bound, _)| statistic < bound)
        .map_or(STEP_FLOOR, |&(_, p)| p)
}

/// Upper-tail probability of a chi-square variable with one degree of freedom.
#[must_use]
pub fn chi_square_p_value(statistic: f64) -> f64 {
    if statistic <= 0.0 {
        return 1.0;
    }
    (2.0 * normal_sf(statistic.sqrt())).clamp(0.0, 1.0)
}

/// `P(Z > z)` for `z ≥ 0` (Abramowitz & Stegun 26.2.17).
#[allow(clippy::unreadable_literal)]
fn normal_sf(z: f64) -> f64 {
    let t = 1.0 / 0.2316419f64.mul_add(z, 1.0);
    let density = 0.3989422804014327 * (-z * z / 2.0).exp();
    let poly = t
        * (0.319381530
            + t * (-0.356563782 + t * (1.781477937 + t * (-1.821255978 + t * 1.330274429))));
    density * poly
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(n: u64) -> f64 {
    n as f64
}

fn ratio(part: u64, whole: u64) -> f64 {
    to_f64(part) / to_f64(whole)
}
