//! Power analysis: required sample size for an experiment design
//!
//! Two-proportion test with equal group sizes:
//!
//! ```text
//! n = 2 · p̄(1 − p̄) · (z_α + z_β)² / (p₂ − p₁)²
//! ```
//!
//! Critical values come from fixed lookup tables (see [`Alpha`] and
//! [`Power`]) rather than a continuous inverse-normal.
//!
//! | Test type      | Per-group `n`                              | Total        |
//! |----------------|--------------------------------------------|--------------|
//! | Traditional    | `n`                                        | `2n`         |
//! | Non-parametric | `⌈1.2 · n⌉`                                | `2n`         |
//! | Multivariate   | `n` with widened `z_α`, then `⌈n(1+0.1k)⌉` | `n · groups` |
//!
//! where `k = groups − 1` is the number of treatment-vs-control comparisons.
//!
//! # Example
//!
//! ```rust
//! use trueno_lab::power::{compute_sample_size, Alpha, Power, PowerAnalysisRequest, TestType};
//!
//! let request = PowerAnalysisRequest::new(TestType::Traditional, 2.5, 10.0)
//!     .with_power(Power::P80)
//!     .with_alpha(Alpha::A05);
//! let result = compute_sample_size(&request)?;
//! assert_eq!(result.total_sample_size, result.per_group_sample_size * 2);
//! # Ok::<(), trueno_lab::Error>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Efficiency-loss penalty applied to non-parametric tests.
pub const NON_PARAMETRIC_PENALTY: f64 = 1.2;

/// Widening of `z_α` per unit of `ln(comparisons)` for multivariate tests.
pub const MULTIVARIATE_Z_WIDENING: f64 = 0.1;

/// Sample inflation per extra comparison for multivariate tests.
pub const MULTIVARIATE_INFLATION: f64 = 0.1;

/// Statistical test family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestType {
    /// Two-proportion z-test
    Traditional,
    /// Rank-based test for non-normal data
    NonParametric,
    /// One control against several treatment groups
    Multivariate,
}

/// Supported significance thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum Alpha {
    /// α = 0.10
    A10,
    /// α = 0.05
    A05,
    /// α = 0.01
    A01,
}

impl Alpha {
    /// Two-sided critical value.
    #[must_use]
    pub const fn z_value(self) -> f64 {
        match self {
            Self::A10 => 1.645,
            Self::A05 => 1.96,
            Self::A01 => 2.576,
        }
    }

    /// Numeric threshold.
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::A10 => 0.10,
            Self::A05 => 0.05,
            Self::A01 => 0.01,
        }
    }
}

impl TryFrom<f64> for Alpha {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        [Self::A10, Self::A05, Self::A01]
            .into_iter()
            .find(|tier| (tier.value() - value).abs() < 1e-9)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "alpha {value} is not supported (expected one of 0.1, 0.05, 0.01)"
                ))
            })
    }
}

impl From<Alpha> for f64 {
    fn from(alpha: Alpha) -> Self {
        alpha.value()
    }
}

/// Supported statistical power levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum Power {
    /// 70 %
    P70,
    /// 80 %
    P80,
    /// 90 %
    P90,
    /// 95 %
    P95,
}

impl Power {
    /// One-sided critical value for the type II error rate.
    #[must_use]
    pub const fn z_value(self) -> f64 {
        match self {
            Self::P70 => 0.524,
            Self::P80 => 0.84,
            Self::P90 => 1.282,
            Self::P95 => 1.645,
        }
    }

    /// Numeric power level.
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::P70 => 0.70,
            Self::P80 => 0.80,
            Self::P90 => 0.90,
            Self::P95 => 0.95,
        }
    }
}

impl TryFrom<f64> for Power {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        [Self::P70, Self::P80, Self::P90, Self::P95]
            .into_iter()
            .find(|tier| (tier.value() - value).abs() < 1e-9)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "power {value} is not supported (expected one of 0.7, 0.8, 0.9, 0.95)"
                ))
            })
    }
}

impl From<Power> for f64 {
    fn from(power: Power) -> Self {
        power.value()
    }
}

/// Power analysis input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerAnalysisRequest {
    /// Test family
    pub test_type: TestType,
    /// Baseline conversion rate in percent, exclusive range (0, 100)
    pub baseline_rate_percent: f64,
    /// Relative minimum detectable effect in percent, > 0
    pub minimum_detectable_effect_percent: f64,
    /// Desired power
    pub power: Power,
    /// Significance threshold
    pub alpha: Alpha,
    /// Number of groups including control (used by multivariate)
    pub variant_count: u32,
}

impl PowerAnalysisRequest {
    /// Request with the common defaults: 80 % power, α = 0.05, two groups.
    #[must_use]
    pub const fn new(
        test_type: TestType,
        baseline_rate_percent: f64,
        minimum_detectable_effect_percent: f64,
    ) -> Self {
        Self {
            test_type,
            baseline_rate_percent,
            minimum_detectable_effect_percent,
            power: Power::P80,
            alpha: Alpha::A05,
            variant_count: 2,
        }
    }

    /// Set the desired power.
    #[must_use]
    pub const fn with_power(mut self, power: Power) -> Self {
        self.power = power;
        self
    }

    /// Set the significance threshold.
    #[must_use]
    pub const fn with_alpha(mut self, alpha: Alpha) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the number of groups (control included).
    #[must_use]
    pub const fn with_variant_count(mut self, variant_count: u32) -> Self {
        self.variant_count = variant_count;
        self
    }
}

/// Power analysis output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerAnalysisResult {
    /// Required users per group, rounded up
    pub per_group_sample_size: u64,
    /// Required users across all groups
    pub total_sample_size: u64,
    /// Critical value used for α (after any multivariate widening)
    pub z_alpha: f64,
    /// Critical value used for power
    pub z_beta: f64,
}

/// Compute the required sample size for an experiment design.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if the baseline is outside (0, 100), the MDE is
///   not positive, any input is non-finite, or a multivariate design has
///   fewer than two groups.
/// - [`Error::ArithmeticDomain`] if the effect collapses to zero, pushes the
///   treatment rate to 100 % or beyond, or is so small that the sample size
///   does not fit in a `u64`.
pub fn compute_sample_size(request: &PowerAnalysisRequest) -> Result<PowerAnalysisResult> {
    let baseline = request.baseline_rate_percent;
    let effect = request.minimum_detectable_effect_percent;

    if !baseline.is_finite() || !effect.is_finite() {
        return Err(Error::InvalidInput(
            "baseline rate and minimum detectable effect must be finite".to_string(),
        ));
    }
    if baseline <= 0.0 || baseline >= 100.0 {
        return Err(Error::InvalidInput(format!(
            "baseline rate must be between 0 and 100 (exclusive), got {baseline}"
        )));
    }
    if effect <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "minimum detectable effect must be positive, got {effect}"
        )));
    }
    if request.test_type == TestType::Multivariate && request.variant_count < 2 {
        return Err(Error::InvalidInput(format!(
            "multivariate tests need at least 2 groups, got {}",
            request.variant_count
        )));
    }

    let p1 = baseline / 100.0;
    let p2 = p1 * (1.0 + effect / 100.0);
    let z_alpha = request.alpha.z_value();
    let z_beta = request.power.z_value();

    let (per_group, groups, z_alpha) = match request.test_type {
        TestType::Traditional => (two_proportion_n(p1, p2, z_alpha, z_beta)?, 2, z_alpha),
        TestType::NonParametric => {
            let n = two_proportion_n(p1, p2, z_alpha, z_beta)?;
            (ceil_u64(to_f64(n) * NON_PARAMETRIC_PENALTY)?, 2, z_alpha)
        }
        TestType::Multivariate => {
            let comparisons = request.variant_count.saturating_sub(1).max(1);
            let z_adjusted = z_alpha + MULTIVARIATE_Z_WIDENING * f64::from(comparisons).ln();
            let n = two_proportion_n(p1, p2, z_adjusted, z_beta)?;
            let inflation = MULTIVARIATE_INFLATION.mul_add(f64::from(comparisons), 1.0);
            (
                ceil_u64(to_f64(n) * inflation)?,
                u64::from(request.variant_count),
                z_adjusted,
            )
        }
    };

    let total = per_group.checked_mul(groups).ok_or_else(|| {
        Error::ArithmeticDomain(format!(
            "total sample size overflows: {per_group} per group x {groups} groups"
        ))
    })?;

    Ok(PowerAnalysisResult {
        per_group_sample_size: per_group,
        total_sample_size: total,
        z_alpha,
        z_beta,
    })
}

/// Days needed to collect `total_sample_size` users at `daily_traffic` users
/// per day, rounded up.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `daily_traffic` is zero.
pub fn estimate_duration_days(total_sample_size: u64, daily_traffic: u64) -> Result<u64> {
    if daily_traffic == 0 {
        return Err(Error::InvalidInput(
            "daily traffic must be greater than 0".to_string(),
        ));
    }
    Ok(total_sample_size.div_ceil(daily_traffic))
}

/// Per-group `n` for a two-proportion test, rounded up.
fn two_proportion_n(p1: f64, p2: f64, z_alpha: f64, z_beta: f64) -> Result<u64> {
    let delta = p2 - p1;
    if delta <= 0.0 {
        return Err(Error::ArithmeticDomain(format!(
            "treatment rate {p2} does not exceed baseline rate {p1}"
        )));
    }
    if p2 >= 1.0 {
        return Err(Error::ArithmeticDomain(format!(
            "treatment rate {:.4} reaches or exceeds 100%; lower the baseline or the effect",
            p2 * 100.0
        )));
    }

    let p_bar = (p1 + p2) / 2.0;
    let z_sum = z_alpha + z_beta;
    let n = 2.0 * p_bar * (1.0 - p_bar) * z_sum * z_sum / (delta * delta);

    if !n.is_finite() {
        return Err(Error::ArithmeticDomain(format!(
            "sample size is not finite for p1={p1}, p2={p2}"
        )));
    }
    ceil_u64(n)
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(n: u64) -> f64 {
    n as f64
}

/// `2^64`, the first value a `u64` cannot hold.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ceil_u64(value: f64) -> Result<u64> {
    let rounded = value.ceil().max(0.0);
    if rounded >= U64_LIMIT {
        return Err(Error::ArithmeticDomain(format!(
            "sample size {value:e} is too large to represent; raise the detectable effect"
        )));
    }
    Ok(rounded as u64)
}
