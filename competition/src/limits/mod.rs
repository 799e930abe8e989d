//! Ratio ranges, the union engine, and limit checks
//!
//! ```text
//! pass samples ──▶ RatioObservation ──┬──▶ LimitChecker ──▶ findings
//!                                     │
//!                                     └──▶ LimitsUnionEngine ──▶ changed targets
//!                                                                  │
//!                                                                  ▼
//!                                                          annotation store
//! ```

pub mod check;
pub mod metric_limit;
pub mod observation;
pub mod union;

pub use check::LimitChecker;
pub use metric_limit::{MetricLimit, EMPTY_VALUE, IGNORE_VALUE};
pub use observation::RatioObservation;
pub use union::{
    apply_max_margin, apply_min_margin, LimitUpdate, LimitsUnionEngine, MAX_MARGIN_PERCENT,
    MIN_MARGIN_PERCENT,
};
