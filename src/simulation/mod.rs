//! Experiment timeline simulation
//!
//! Moves running experiments forward by simulated days, growing their trend
//! series and concluding them once their progress or planned length runs out.
//!
//! ## Lifecycle
//!
//! ```text
//! in_progress ──advance──> in_progress        (days left, progress < 100)
//!      │
//!      └──────advance──> completed            (outcome drawn, terminal)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use trueno_lab::random::SeededRandom;
//! use trueno_lab::simulation::{Experiment, ExperimentStatus, SimulationScheduler};
//!
//! let experiments = vec![
//!     Experiment::builder("exp-001", "Checkout copy", 14)
//!         .status(ExperimentStatus::InProgress)
//!         .start_date("2024-05-01")
//!         .build(),
//!     Experiment::new("exp-002", "Pricing page", 21), // draft, untouched
//! ];
//!
//! let scheduler = SimulationScheduler::default();
//! let mut rng = SeededRandom::new(2024);
//! let next = scheduler.advance(&experiments, 3, &mut rng);
//!
//! assert_eq!(next[0].trend_series().len(), 3);
//! assert_eq!(next[1], experiments[1]);
//! ```

mod config;
mod experiment;
mod scheduler;

pub use config::{FinalizationMode, SimulationConfig, SimulationConfigBuilder};
pub use experiment::{Experiment, ExperimentBuilder, ExperimentOutcome, ExperimentStatus};
pub use scheduler::{format_impact, synthetic_significance, SimulationReport, SimulationScheduler};
