//! Traffic allocation across experiment groups
//!
//! An allocation maps group names to the percentage of traffic each group
//! receives. A normalized allocation satisfies:
//!
//! - at least two groups,
//! - every group at or above the configured floor,
//! - whole-number percentages summing to exactly 100.
//!
//! # Example
//!
//! ```rust
//! use trueno_lab::allocation::{normalize, rebalance_after_edit, AllocationMap};
//!
//! let start: AllocationMap = [("A", 80.0), ("B", 10.0), ("C", 10.0)].into_iter().collect();
//! let start = normalize(&start, 5.0)?;
//!
//! // Slider drags A down to 40: B and C absorb the difference in proportion
//! let edited = rebalance_after_edit(&start, "A", 40.0, 5.0)?;
//! assert_eq!(edited.get("B"), Some(30.0));
//! assert_eq!(edited.get("C"), Some(30.0));
//! assert_eq!(edited.total(), 100.0);
//! # Ok::<(), trueno_lab::Error>(())
//! ```

mod normalize;
mod session;

pub use normalize::{equal_split, normalize, rebalance_after_edit, validate_allocation};
pub use session::AllocationSession;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing percentage sums.
pub(crate) const EPSILON: f64 = 1e-6;

/// Group name → traffic percentage, ordered by group name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationMap {
    groups: BTreeMap<String, f64>,
}

impl AllocationMap {
    /// Create an empty allocation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a group's percentage, inserting the group if new.
    pub fn insert(&mut self, group: impl Into<String>, percent: f64) {
        self.groups.insert(group.into(), percent);
    }

    /// Remove a group, returning its percentage.
    pub fn remove(&mut self, group: &str) -> Option<f64> {
        self.groups.remove(group)
    }

    /// Percentage for a group.
    #[must_use]
    pub fn get(&self, group: &str) -> Option<f64> {
        self.groups.get(group).copied()
    }

    /// Whether the group exists.
    #[must_use]
    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Sum of all percentages.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.groups.values().sum()
    }

    /// Smallest percentage, if any group exists.
    #[must_use]
    pub fn min_value(&self) -> Option<f64> {
        self.groups.values().copied().reduce(f64::min)
    }

    /// Iterate `(group, percent)` in group-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Group names in order.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Borrow the underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.groups
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for AllocationMap {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            groups: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl From<BTreeMap<String, f64>> for AllocationMap {
    fn from(groups: BTreeMap<String, f64>) -> Self {
        Self { groups }
    }
}
