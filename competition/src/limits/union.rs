//! Limits Union Engine - widens target limits from observed ratios
//!
//! Pure and deterministic: no I/O, no clock. For each observation the
//! current limit is widened to include the observed candidates, then every
//! bound that moved gets a safety margin:
//!
//! ```text
//! min' = floor(min * 95) / 100      (5% headroom below)
//! max' = ceil(max * 105) / 100      (5% headroom above)
//! ```
//!
//! Margins only ever loosen a limit. Targets with no moved bound are left
//! out of the result.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::limits::{MetricLimit, RatioObservation};
use crate::targets::{CompetitionTargets, TargetId, TargetLimitEntry};

/// Percentage kept below an observed min.
pub const MIN_MARGIN_PERCENT: f64 = 95.0;

/// Percentage kept above an observed max.
pub const MAX_MARGIN_PERCENT: f64 = 105.0;

/// Widened limit for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitUpdate {
    pub target: TargetId,
    pub previous: MetricLimit,
    pub updated: MetricLimit,
    pub min_changed: bool,
    pub max_changed: bool,
}

/// Round a min down with margin.
///
/// A tiny ratio can floor to zero, which would read back as "not
/// established"; those keep the unrounded margin instead.
pub fn apply_min_margin(min: f64) -> f64 {
    let rounded = (min * MIN_MARGIN_PERCENT).floor() / 100.0;
    if rounded > 0.0 {
        rounded
    } else {
        min * MIN_MARGIN_PERCENT / 100.0
    }
}

/// Round a max up with margin.
///
/// A finite max stays finite: near `f64::MAX` the margin saturates
/// instead of overflowing to infinity.
pub fn apply_max_margin(max: f64) -> f64 {
    let rounded = (max * MAX_MARGIN_PERCENT).ceil() / 100.0;
    if rounded.is_finite() || !max.is_finite() {
        rounded
    } else {
        f64::MAX
    }
}

/// The union engine. Stateless; kept as a type so callers can hold one.
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitsUnionEngine;

impl LimitsUnionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Widen `current` by one observation.
    ///
    /// Returns `None` when neither bound moved.
    pub fn union_observation(
        &self,
        current: MetricLimit,
        observation: &RatioObservation,
    ) -> Option<LimitUpdate> {
        let (min_candidate, max_candidate) = observation.ordered_candidates();
        if min_candidate.is_nan() || max_candidate.is_nan() {
            debug!(target_id = %observation.target, "Skipping NaN observation");
            return None;
        }

        let mut limit = current;
        let mut min_changed = false;
        let mut max_changed = false;

        if let Some(widened) = limit.union_with_min(min_candidate) {
            limit = widened;
            min_changed = true;
        }
        if let Some(widened) = limit.union_with_max(max_candidate) {
            limit = widened;
            max_changed = true;
        }
        // union_with_* may pull the opposite bound along to keep min <= max
        min_changed |= limit.min().to_bits() != current.min().to_bits();
        max_changed |= limit.max().to_bits() != current.max().to_bits();

        if !min_changed && !max_changed {
            return None;
        }

        let min = if min_changed {
            apply_min_margin(limit.min())
        } else {
            limit.min()
        };
        let max = if max_changed {
            apply_max_margin(limit.max())
        } else {
            limit.max()
        };

        Some(LimitUpdate {
            target: observation.target.clone(),
            previous: current,
            updated: MetricLimit::from_normalized(min, max),
            min_changed,
            max_changed,
        })
    }

    /// Apply a pass's observations to the target map.
    ///
    /// Changed targets are marked dirty in `targets`; the returned updates
    /// are the ones that need re-annotation.
    pub fn apply(
        &self,
        targets: &mut CompetitionTargets,
        observations: &[RatioObservation],
    ) -> Vec<LimitUpdate> {
        let mut updates = Vec::new();
        for observation in observations {
            let current = targets.limit_or_empty(&observation.target);
            if let Some(update) = self.union_observation(current, observation) {
                debug!(
                    target_id = %update.target,
                    previous = %update.previous,
                    updated = %update.updated,
                    "Limit widened"
                );
                targets.set_changed(&update.target, update.updated);
                updates.push(update);
            }
        }
        updates
    }
}

impl From<&LimitUpdate> for TargetLimitEntry {
    fn from(update: &LimitUpdate) -> Self {
        Self {
            target: update.target.clone(),
            limit: update.updated,
            changed: true,
        }
    }
}
