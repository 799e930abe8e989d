//! MetricLimit: the acceptable [min, max] ratio range for a target
//!
//! A limit is a plain `Copy` value. Union operations never mutate in place:
//! they return the widened limit, or `None` when nothing changed.
//!
//! Sentinels:
//! - a negative bound means "ignore this bound" and is stored as [`IGNORE_VALUE`]
//! - a bound equal to [`EMPTY_VALUE`] means "not yet established"

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{CompetitionError, CompetitionResult};

/// Stored value of a bound that has not been established yet.
pub const EMPTY_VALUE: f64 = 0.0;

/// Stored value of a bound that is never checked.
pub const IGNORE_VALUE: f64 = -1.0;

/// Acceptable ratio range of a target relative to its baseline.
///
/// Equality and hashing compare the raw bits of both bounds, so two limits
/// are equal only when they are stored identically (sentinels included).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "LimitRepr", into = "LimitRepr")]
pub struct MetricLimit {
    min: f64,
    max: f64,
}

#[derive(Serialize, Deserialize)]
struct LimitRepr {
    min: f64,
    max: f64,
}

impl TryFrom<LimitRepr> for MetricLimit {
    type Error = CompetitionError;

    fn try_from(repr: LimitRepr) -> CompetitionResult<Self> {
        Self::try_new(repr.min, repr.max)
    }
}

impl From<MetricLimit> for LimitRepr {
    fn from(limit: MetricLimit) -> Self {
        Self {
            min: limit.min,
            max: limit.max,
        }
    }
}

/// Map a raw bound onto its stored form.
fn normalize(value: f64) -> f64 {
    if value < 0.0 {
        IGNORE_VALUE
    } else if value == 0.0 {
        // folds -0.0 into the empty sentinel
        EMPTY_VALUE
    } else {
        value
    }
}

fn is_established(value: f64) -> bool {
    value > 0.0
}

impl MetricLimit {
    /// A limit with neither bound established.
    pub const EMPTY: MetricLimit = MetricLimit {
        min: EMPTY_VALUE,
        max: EMPTY_VALUE,
    };

    /// A limit that checks nothing.
    pub const IGNORED: MetricLimit = MetricLimit {
        min: IGNORE_VALUE,
        max: IGNORE_VALUE,
    };

    /// Create a limit, normalizing negative bounds to the ignore sentinel.
    ///
    /// Fails only when a bound is NaN. When both bounds are established and
    /// `min > max` they are swapped.
    pub fn try_new(min: f64, max: f64) -> CompetitionResult<Self> {
        if min.is_nan() {
            return Err(CompetitionError::invalid_limit("min", min));
        }
        if max.is_nan() {
            return Err(CompetitionError::invalid_limit("max", max));
        }

        let (mut min, mut max) = (normalize(min), normalize(max));
        if is_established(min) && is_established(max) && min > max {
            std::mem::swap(&mut min, &mut max);
        }
        Ok(Self { min, max })
    }

    /// Build from already-normalized bounds. Callers keep `min <= max`.
    pub(crate) fn from_normalized(min: f64, max: f64) -> Self {
        debug_assert!(!min.is_nan() && !max.is_nan());
        Self {
            min: normalize(min),
            max: normalize(max),
        }
    }

    /// Lower bound (may be a sentinel).
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound (may be a sentinel).
    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn min_is_empty(&self) -> bool {
        self.min.to_bits() == EMPTY_VALUE.to_bits()
    }

    pub fn max_is_empty(&self) -> bool {
        self.max.to_bits() == EMPTY_VALUE.to_bits()
    }

    pub fn ignore_min(&self) -> bool {
        self.min < 0.0
    }

    pub fn ignore_max(&self) -> bool {
        self.max < 0.0
    }

    /// Neither bound established.
    pub fn is_empty(&self) -> bool {
        self.min_is_empty() && self.max_is_empty()
    }

    /// Both bounds in ignore mode.
    pub fn is_ignored(&self) -> bool {
        self.ignore_min() && self.ignore_max()
    }

    /// Widen `min` downward to include `candidate`.
    ///
    /// Returns the widened limit, or `None` when the stored min did not
    /// decrease. A negative candidate is the ignore signal, not a value, and
    /// is a no-op. An ignored min is never touched. An empty min takes the
    /// candidate directly.
    pub fn union_with_min(&self, candidate: f64) -> Option<Self> {
        debug_assert!(!candidate.is_nan(), "NaN min candidate");
        if candidate.is_nan() || self.ignore_min() || candidate < 0.0 {
            return None;
        }
        let candidate = normalize(candidate);
        if !is_established(candidate) {
            return None;
        }

        if self.min_is_empty() {
            // keep min <= max when the max is already established
            let max = if is_established(self.max) && self.max < candidate {
                candidate
            } else {
                self.max
            };
            return Some(Self {
                min: candidate,
                max,
            });
        }

        (candidate < self.min).then_some(Self {
            min: candidate,
            max: self.max,
        })
    }

    /// Widen `max` upward to include `candidate`. Mirror of [`Self::union_with_min`].
    pub fn union_with_max(&self, candidate: f64) -> Option<Self> {
        debug_assert!(!candidate.is_nan(), "NaN max candidate");
        if candidate.is_nan() || self.ignore_max() || candidate < 0.0 {
            return None;
        }
        let candidate = normalize(candidate);
        if !is_established(candidate) {
            return None;
        }

        if self.max_is_empty() {
            let min = if is_established(self.min) && self.min > candidate {
                candidate
            } else {
                self.min
            };
            return Some(Self {
                min,
                max: candidate,
            });
        }

        (candidate > self.max).then_some(Self {
            min: self.min,
            max: candidate,
        })
    }

    /// Whether `ratio` falls below an established, checked min.
    pub fn is_below_min(&self, ratio: f64) -> bool {
        is_established(self.min) && ratio < self.min
    }

    /// Whether `ratio` exceeds an established, checked max.
    pub fn is_above_max(&self, ratio: f64) -> bool {
        is_established(self.max) && ratio > self.max
    }

    /// Whether the ratio passes every bound this limit checks.
    pub fn contains(&self, ratio: f64) -> bool {
        !self.is_below_min(ratio) && !self.is_above_max(ratio)
    }
}

impl Default for MetricLimit {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl PartialEq for MetricLimit {
    fn eq(&self, other: &Self) -> bool {
        self.min.to_bits() == other.min.to_bits() && self.max.to_bits() == other.max.to_bits()
    }
}

impl Eq for MetricLimit {}

impl Hash for MetricLimit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.min.to_bits().hash(state);
        self.max.to_bits().hash(state);
    }
}

fn fmt_bound(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value < 0.0 {
        write!(f, "*")
    } else if value == EMPTY_VALUE {
        write!(f, "?")
    } else {
        write!(f, "{:.2}", value)
    }
}

impl fmt::Display for MetricLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        fmt_bound(f, self.min)?;
        write!(f, "..")?;
        fmt_bound(f, self.max)?;
        write!(f, "]")
    }
}
