//! Floor enforcement, proportional redistribution and integer rounding.

use super::{AllocationMap, EPSILON};
use crate::{Error, Result};

/// Normalize an allocation so every group meets `min_percent` and the
/// whole-number percentages sum to exactly 100.
///
/// 1. Groups below the floor are raised to it.
/// 2. Any excess or shortfall is spread over groups above the floor in
///    proportion to their slack (`value − floor`). With no slack at all the
///    allocation falls back to an equal split.
/// 3. Values are rounded; the rounding residual goes to the largest group
///    that can absorb it without dropping below the floor.
///
/// # Errors
///
/// - [`Error::InvalidInput`] for fewer than two groups, non-finite values, or
///   a floor outside `[0, 100]`.
/// - [`Error::ConstraintViolation`] when the floors alone exceed 100 %.
pub fn normalize(allocation: &AllocationMap, min_percent: f64) -> Result<AllocationMap> {
    check_inputs(allocation, min_percent)?;
    normalize_around(allocation, min_percent, None)
}

/// Shared normalization body. A `pinned` group keeps its (whole, feasible)
/// value; only the other groups absorb redistribution and rounding.
fn normalize_around(
    allocation: &AllocationMap,
    min_percent: f64,
    pinned: Option<&str>,
) -> Result<AllocationMap> {
    let mut entries: Vec<(String, f64)> = allocation
        .iter()
        .map(|(group, value)| (group.to_string(), value.max(min_percent)))
        .collect();
    let pinned = pinned.and_then(|group| entries.iter().position(|(g, _)| g == group));

    redistribute(&mut entries, min_percent, pinned);
    round_to_hundred(&mut entries, min_percent, pinned)?;

    let normalized: AllocationMap = entries.into_iter().collect();
    validate_allocation(&normalized, min_percent)?;
    Ok(normalized)
}

/// Apply a direct edit of one group and rebalance the rest.
///
/// `previous` is the allocation before the edit and `touched` the group the
/// caller changed. The touched value is rounded to a whole percentage and
/// clamped into its feasible range, and the result keeps exactly that value.
/// The difference is spread over the other groups in proportion to their
/// current share; floors and rounding are then settled among those groups
/// only.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if `touched` is not a group of `previous` or
///   `new_value` is not finite, plus everything [`normalize`] rejects.
/// - [`Error::ConstraintViolation`] when the floors are infeasible.
pub fn rebalance_after_edit(
    previous: &AllocationMap,
    touched: &str,
    new_value: f64,
    min_percent: f64,
) -> Result<AllocationMap> {
    check_inputs(previous, min_percent)?;

    let Some(old_value) = previous.get(touched) else {
        return Err(Error::InvalidInput(format!(
            "group '{touched}' is not part of the allocation"
        )));
    };
    if !new_value.is_finite() {
        return Err(Error::InvalidInput(format!(
            "new value for '{touched}' must be finite, got {new_value}"
        )));
    }

    let others = previous.len() - 1;
    let whole_floor = integer_floor(min_percent);
    let ceiling = whole_floor.mul_add(-count_f64(others), 100.0);
    let target = new_value.round().clamp(whole_floor, ceiling);
    let delta = target - old_value;

    let others_total: f64 = previous
        .iter()
        .filter(|(group, _)| *group != touched)
        .map(|(_, value)| value)
        .sum();

    tracing::trace!(
        group = touched,
        old_value,
        target,
        delta,
        "rebalancing allocation after edit"
    );

    let mut edited = AllocationMap::new();
    for (group, value) in previous.iter() {
        let value = if group == touched {
            target
        } else if others_total > EPSILON {
            value - delta * value / others_total
        } else {
            value - delta / count_f64(others)
        };
        edited.insert(group, value);
    }

    normalize_around(&edited, min_percent, Some(touched))
}

/// Split 100 % evenly across `groups` in whole numbers.
///
/// The remainder of `100 / n` goes to the first groups in name order.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for fewer than two distinct groups.
pub fn equal_split<S: AsRef<str>>(groups: &[S]) -> Result<AllocationMap> {
    let mut map: AllocationMap = groups.iter().map(|g| (g.as_ref(), 0.0)).collect();
    if map.len() < 2 {
        return Err(Error::InvalidInput(format!(
            "an allocation needs at least 2 distinct groups, got {}",
            map.len()
        )));
    }

    let n = map.len();
    let base = 100 / n;
    let remainder = 100 % n;
    let names: Vec<String> = map.groups().map(str::to_string).collect();
    for (index, name) in names.into_iter().enumerate() {
        let share = base + usize::from(index < remainder);
        map.insert(name, count_f64(share));
    }
    Ok(map)
}

/// Check the invariants of a normalized allocation.
///
/// # Errors
///
/// - [`Error::InvalidInput`] for fewer than two groups, a value below the
///   floor, or a total other than 100.
pub fn validate_allocation(allocation: &AllocationMap, min_percent: f64) -> Result<()> {
    if allocation.len() < 2 {
        return Err(Error::InvalidInput(format!(
            "an allocation needs at least 2 groups, got {}",
            allocation.len()
        )));
    }
    if let Some((group, value)) = allocation
        .iter()
        .find(|(_, value)| *value < min_percent - EPSILON)
    {
        return Err(Error::InvalidInput(format!(
            "group '{group}' at {value}% is below the {min_percent}% floor"
        )));
    }
    let total = allocation.total();
    if (total - 100.0).abs() > EPSILON {
        return Err(Error::InvalidInput(format!(
            "allocation sums to {total}%, expected 100%"
        )));
    }
    Ok(())
}

fn check_inputs(allocation: &AllocationMap, min_percent: f64) -> Result<()> {
    let groups = allocation.len();
    if groups < 2 {
        return Err(Error::InvalidInput(format!(
            "an allocation needs at least 2 groups, got {groups}"
        )));
    }
    if !min_percent.is_finite() || !(0.0..=100.0).contains(&min_percent) {
        return Err(Error::InvalidInput(format!(
            "minimum percentage must be within [0, 100], got {min_percent}"
        )));
    }
    if let Some((group, value)) = allocation.iter().find(|(_, v)| !v.is_finite()) {
        return Err(Error::InvalidInput(format!(
            "group '{group}' has non-finite percentage {value}"
        )));
    }

    // Outputs are whole numbers, so a fractional floor effectively rounds up
    let floor = integer_floor(min_percent);
    let required = floor.max(min_percent) * count_f64(groups);
    if required > 100.0 + EPSILON {
        return Err(Error::ConstraintViolation {
            groups,
            min_percent,
            required,
        });
    }
    Ok(())
}

fn redistribute(entries: &mut [(String, f64)], floor: f64, pinned: Option<usize>) {
    let total: f64 = entries.iter().map(|(_, v)| v).sum();
    let difference = 100.0 - total;
    if difference.abs() <= EPSILON {
        return;
    }

    let slack: f64 = entries
        .iter()
        .enumerate()
        .filter(|&(index, _)| Some(index) != pinned)
        .map(|(_, (_, v))| (v - floor).max(0.0))
        .sum();

    if slack <= EPSILON {
        let (reserved, free) = pinned.map_or((0.0, entries.len()), |index| {
            (entries[index].1, entries.len() - 1)
        });
        let share = (100.0 - reserved) / count_f64(free);
        tracing::trace!(share, "no slack above floor, falling back to equal split");
        for (index, (_, value)) in entries.iter_mut().enumerate() {
            if Some(index) != pinned {
                *value = share;
            }
        }
        return;
    }

    for (index, (_, value)) in entries.iter_mut().enumerate() {
        if Some(index) == pinned {
            continue;
        }
        let group_slack = *value - floor;
        if group_slack > 0.0 {
            *value = difference
                .mul_add(group_slack / slack, *value)
                .max(floor);
        }
    }
}

fn round_to_hundred(entries: &mut [(String, f64)], floor: f64, pinned: Option<usize>) -> Result<()> {
    let whole_floor = integer_floor(floor);
    for (_, value) in entries.iter_mut() {
        *value = value.round().max(whole_floor);
    }

    let mut residual = 100.0 - entries.iter().map(|(_, v)| v).sum::<f64>();
    while residual.abs() > EPSILON {
        let needs_increase = residual > 0.0;
        // Largest group first; equal values resolve to the earlier group name
        let candidate = entries
            .iter()
            .enumerate()
            .filter(|&(index, _)| Some(index) != pinned)
            .filter(|(_, (_, v))| needs_increase || *v - whole_floor >= 1.0)
            .max_by(|(ia, (_, a)), (ib, (_, b))| a.total_cmp(b).then(ib.cmp(ia)))
            .map(|(index, _)| index);

        let Some(index) = candidate else {
            return Err(Error::ConstraintViolation {
                groups: entries.len(),
                min_percent: floor,
                required: whole_floor * count_f64(entries.len()),
            });
        };

        let value = &mut entries[index].1;
        let adjustment = if needs_increase {
            residual
        } else {
            residual.max(whole_floor - *value)
        };
        *value += adjustment;
        residual -= adjustment;
    }
    Ok(())
}

fn integer_floor(min_percent: f64) -> f64 {
    (min_percent - EPSILON).ceil().max(0.0)
}

#[allow(clippy::cast_precision_loss)]
fn count_f64(n: usize) -> f64 {
    n as f64
}
