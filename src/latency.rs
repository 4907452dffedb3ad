//! Artificial latency around pure computations
//!
//! Design forms show a short "calculating" state before results appear. The
//! computations themselves are synchronous; these helpers only await a timer
//! first, so ordering and results are identical to the direct calls.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use trueno_lab::latency::compute_sample_size_delayed;
//! use trueno_lab::power::{PowerAnalysisRequest, TestType};
//!
//! # async fn example() -> trueno_lab::Result<()> {
//! let request = PowerAnalysisRequest::new(TestType::Traditional, 2.5, 10.0);
//! let result = compute_sample_size_delayed(&request, Duration::from_millis(300)).await?;
//! println!("{} users per group", result.per_group_sample_size);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use crate::allocation::{normalize, AllocationMap};
use crate::power::{compute_sample_size, PowerAnalysisRequest, PowerAnalysisResult};
use crate::Result;

/// Default delay used by design forms.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(500);

/// Wait for `delay`, then run `compute`.
pub async fn with_latency<T, F>(delay: Duration, compute: F) -> T
where
    F: FnOnce() -> T + Send,
{
    tokio::time::sleep(delay).await;
    compute()
}

/// [`compute_sample_size`] after `delay`.
///
/// # Errors
///
/// Same as [`compute_sample_size`].
pub async fn compute_sample_size_delayed(
    request: &PowerAnalysisRequest,
    delay: Duration,
) -> Result<PowerAnalysisResult> {
    with_latency(delay, || compute_sample_size(request)).await
}

/// [`normalize`] after `delay`.
///
/// # Errors
///
/// Same as [`normalize`].
pub async fn normalize_delayed(
    allocation: &AllocationMap,
    min_percent: f64,
    delay: Duration,
) -> Result<AllocationMap> {
    with_latency(delay, || normalize(allocation, min_percent)).await
}
