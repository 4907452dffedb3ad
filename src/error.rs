//! Error types for Trueno-Lab
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trueno-Lab error types
///
/// Every error is local to a single computation call. Callers are expected to
/// surface these as validation messages and re-prompt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Out-of-range or missing numeric input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Degenerate formula input (division by zero, infinite result)
    #[error("Arithmetic domain error: {0}\nAdjust the inputs so the formula stays finite")]
    ArithmeticDomain(String),

    /// Allocation floors cannot be satisfied for the given group count
    #[error(
        "Allocation constraint violated: {groups} groups x {min_percent}% floor requires {required}% (> 100%)"
    )]
    ConstraintViolation {
        /// Number of groups in the allocation
        groups: usize,
        /// Requested per-group minimum percentage
        min_percent: f64,
        /// Total percentage the floors would consume
        required: f64,
    },

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
