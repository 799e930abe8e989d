//! Ratio observations: min/max candidates derived from a pass's samples

use serde::{Deserialize, Serialize};

use crate::targets::TargetId;

/// Percentile used as the lower candidate.
pub const MIN_CANDIDATE_PERCENTILE: usize = 85;

/// Percentile used as the upper candidate.
pub const MAX_CANDIDATE_PERCENTILE: usize = 95;

/// Observed measured/baseline ratio range for one target in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioObservation {
    pub target: TargetId,
    pub min_ratio: f64,
    pub max_ratio: f64,
}

impl RatioObservation {
    pub fn new(target: impl Into<TargetId>, min_ratio: f64, max_ratio: f64) -> Self {
        Self {
            target: target.into(),
            min_ratio,
            max_ratio,
        }
    }

    /// Build an observation from raw ratio samples.
    ///
    /// The 85th percentile is the min candidate and the 95th the max
    /// candidate. NaN samples are dropped; returns `None` when nothing is left.
    pub fn from_samples(target: impl Into<TargetId>, samples: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = samples.iter().copied().filter(|s| !s.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            target: target.into(),
            min_ratio: percentile(&sorted, MIN_CANDIDATE_PERCENTILE),
            max_ratio: percentile(&sorted, MAX_CANDIDATE_PERCENTILE),
        })
    }

    /// Candidates ordered so that `min <= max`.
    ///
    /// Noisy passes can produce inverted percentiles when an observation is
    /// assembled by hand; the union step always works on the ordered pair.
    pub fn ordered_candidates(&self) -> (f64, f64) {
        if self.min_ratio > self.max_ratio {
            (self.max_ratio, self.min_ratio)
        } else {
            (self.min_ratio, self.max_ratio)
        }
    }
}

/// Compute the p-th percentile from a sorted, non-empty slice.
fn percentile(sorted: &[f64], p: usize) -> f64 {
    let idx = (p * sorted.len() / 100).min(sorted.len() - 1);
    sorted[idx]
}
