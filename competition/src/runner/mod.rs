//! Runner - orchestration of a competition over external collaborators
//!
//! The runner owns the rerun loop and classification; everything it
//! measures or persists goes through the traits in [`collaborators`].

pub mod collaborators;
pub mod context;
pub mod orchestrator;
pub mod outcome;

pub use collaborators::{
    AnnotationStore, HostLogger, InMemoryAnnotationStore, MeasurementEngine, PassContext,
    PassOutput, ReportSink, TracingHostLogger, ValidationFinding,
};
pub use context::CompetitionContext;
pub use orchestrator::{CompetitionRun, CompetitionRunner, RERUN_STEP};
pub use outcome::{CompetitionOutcome, CompetitionReport, ReportBuckets};
