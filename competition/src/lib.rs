//! Competition: rerun orchestration and ratio-limit maintenance for
//! performance competitions
//!
//! A competition measures a set of benchmark targets against a baseline
//! and checks each target's measured/baseline ratio against a
//! [`MetricLimit`]. This crate holds the deterministic core:
//!
//! - [`limits`]: the limit value type, the union engine that widens limits
//!   from observed ratios, and limit checks
//! - [`messages`]: severity-tagged diagnostics
//! - [`state`]: the per-competition run state and its slot table
//! - [`runner`]: the bounded rerun loop and outcome classification
//!
//! Measurement, persistence of limits, logging and test-framework
//! reporting are collaborators behind the traits in [`runner`].
//!
//! # Usage
//!
//! ```ignore
//! use competition::{CompetitionConfig, CompetitionContext, CompetitionRunner};
//!
//! let ctx = CompetitionContext::new("Sorting", CompetitionConfig::default());
//! let mut runner = CompetitionRunner::with_store(engine, store);
//! let run = runner.run(&ctx).await;
//! run.report.route_to(&sink);
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod error;
pub mod limits;
pub mod messages;
pub mod runner;
pub mod state;
pub mod targets;

pub use config::{CompetitionConfig, DEFAULT_MAX_RERUN_COUNT};
pub use error::{CompetitionError, CompetitionResult};
pub use limits::{LimitChecker, LimitUpdate, LimitsUnionEngine, MetricLimit, RatioObservation};
pub use messages::{Message, MessageLog, MessageSeverity, MessageSource};
pub use runner::{
    AnnotationStore, CompetitionContext, CompetitionOutcome, CompetitionReport, CompetitionRun,
    CompetitionRunner, HostLogger, InMemoryAnnotationStore, MeasurementEngine, PassContext,
    PassOutput, ReportBuckets, ReportSink, TracingHostLogger, ValidationFinding,
};
pub use state::{RunState, RunStateSlots};
pub use targets::{CompetitionTargets, TargetId, TargetLimitEntry};
