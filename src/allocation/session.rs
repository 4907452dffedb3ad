//! Per-form allocation editing session.
//!
//! Holds the allocation snapshot, the floor and the group the user touched
//! last. One session per editing form; sessions share nothing.

use super::{equal_split, normalize, rebalance_after_edit, AllocationMap};
use crate::{Error, Result};

/// Interactive allocation editor.
///
/// # Example
///
/// ```rust
/// use trueno_lab::allocation::AllocationSession;
///
/// let mut session = AllocationSession::with_groups(&["control", "variant_a", "variant_b"], 10.0)?;
/// session.edit("control", 50.0)?;
/// assert_eq!(session.last_touched(), Some("control"));
/// assert_eq!(session.current().get("control"), Some(50.0));
/// # Ok::<(), trueno_lab::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSession {
    current: AllocationMap,
    min_percent: f64,
    last_touched: Option<String>,
}

impl AllocationSession {
    /// Start a session from an initial allocation, normalizing it first.
    ///
    /// # Errors
    ///
    /// Propagates [`normalize`] errors.
    pub fn new(initial: &AllocationMap, min_percent: f64) -> Result<Self> {
        Ok(Self {
            current: normalize(initial, min_percent)?,
            min_percent,
            last_touched: None,
        })
    }

    /// Start a session with an equal split across `groups`.
    ///
    /// # Errors
    ///
    /// Propagates [`equal_split`] and [`normalize`] errors.
    pub fn with_groups<S: AsRef<str>>(groups: &[S], min_percent: f64) -> Result<Self> {
        Self::new(&equal_split(groups)?, min_percent)
    }

    /// Current normalized allocation.
    #[must_use]
    pub const fn current(&self) -> &AllocationMap {
        &self.current
    }

    /// Floor applied to every group.
    #[must_use]
    pub const fn min_percent(&self) -> f64 {
        self.min_percent
    }

    /// Group most recently edited in this session.
    #[must_use]
    pub fn last_touched(&self) -> Option<&str> {
        self.last_touched.as_deref()
    }

    /// Set one group's percentage and rebalance the others.
    ///
    /// On error the session is left unchanged.
    ///
    /// # Errors
    ///
    /// Propagates [`rebalance_after_edit`] errors.
    pub fn edit(&mut self, group: &str, value: f64) -> Result<&AllocationMap> {
        self.current = rebalance_after_edit(&self.current, group, value, self.min_percent)?;
        self.last_touched = Some(group.to_string());
        Ok(&self.current)
    }

    /// Change the floor and renormalize.
    ///
    /// # Errors
    ///
    /// Propagates [`normalize`] errors; the session keeps its old floor.
    pub fn set_min_percent(&mut self, min_percent: f64) -> Result<&AllocationMap> {
        self.current = normalize(&self.current, min_percent)?;
        self.min_percent = min_percent;
        Ok(&self.current)
    }

    /// Add a group and reset to an equal split.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the group already exists.
    /// - [`Error::ConstraintViolation`] if the floor no longer fits.
    pub fn add_group(&mut self, group: &str) -> Result<&AllocationMap> {
        if self.current.contains(group) {
            return Err(Error::InvalidInput(format!(
                "group '{group}' already exists"
            )));
        }
        let mut groups: Vec<&str> = self.current.groups().collect();
        groups.push(group);
        let split = normalize(&equal_split(&groups)?, self.min_percent)?;

        self.current = split;
        self.last_touched = None;
        Ok(&self.current)
    }

    /// Remove a group; its share is spread over the remaining groups.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the group is unknown or fewer than two
    ///   groups would remain.
    pub fn remove_group(&mut self, group: &str) -> Result<&AllocationMap> {
        let mut remaining = self.current.clone();
        if remaining.remove(group).is_none() {
            return Err(Error::InvalidInput(format!(
                "group '{group}' is not part of the allocation"
            )));
        }
        self.current = normalize(&remaining, self.min_percent)?;
        if self.last_touched.as_deref() == Some(group) {
            self.last_touched = None;
        }
        Ok(&self.current)
    }
}
