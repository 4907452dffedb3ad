//! # Trueno-Lab: Experiment Design and Simulation Engine
//!
//! **Version**: 0.1.0
//!
//! Trueno-Lab is the numerical core of an experimentation platform. It sizes
//! experiments, splits traffic between groups, reads significance from raw
//! counts, and simulates running experiments day by day.
//!
//! ## Components
//!
//! | Module            | Responsibility                                         |
//! |-------------------|--------------------------------------------------------|
//! | [`power`]         | Required sample size per group and in total            |
//! | [`allocation`]    | Traffic splits that meet a floor and sum to 100        |
//! | [`significance`]  | Rates, relative lift and p-value from conversion counts |
//! | [`trend`]         | Synthetic day-by-day control/treatment metrics         |
//! | [`simulation`]    | Advancing running experiments and concluding them      |
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: Degenerate inputs fail with typed errors, never `NaN`
//! - **Jidoka**: Allocation invariants re-checked after every normalization
//! - **Genchi Genbutsu**: Randomness injected, so every simulation replays
//!
//! ## Example Usage
//!
//! ```rust
//! use trueno_lab::power::{compute_sample_size, PowerAnalysisRequest, TestType};
//! use trueno_lab::significance::estimate;
//!
//! let plan = compute_sample_size(&PowerAnalysisRequest::new(TestType::Traditional, 2.5, 10.0))?;
//! println!("need {} users per group", plan.per_group_sample_size);
//!
//! let read = estimate(10_000, 250, 10_000, 300)?;
//! println!("lift {:.1}% (p = {})", read.relative_improvement_percent, read.p_value);
//! # Ok::<(), trueno_lab::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod allocation;
pub mod error;
#[cfg(feature = "tokio")]
pub mod latency;
pub mod power;
pub mod random;
pub mod significance;
pub mod simulation;
pub mod trend;

pub use error::{Error, Result};
