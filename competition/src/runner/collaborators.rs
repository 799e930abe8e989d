//! Collaborator interfaces, the narrow seams to everything outside the core
//!
//! - [`MeasurementEngine`]: runs one measurement pass
//! - [`AnnotationStore`]: holds persisted limits
//! - [`HostLogger`]: receives human-readable progress lines
//! - [`ReportSink`]: turns classified messages into host pass/fail signals

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::limits::RatioObservation;
use crate::state::RunState;
use crate::targets::{CompetitionTargets, TargetId, TargetLimitEntry};

/// A validation finding reported for a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    #[serde(alias = "critical")]
    pub is_critical: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetId>,
}

impl ValidationFinding {
    pub fn critical(message: impl Into<String>, target: Option<TargetId>) -> Self {
        Self {
            is_critical: true,
            message: message.into(),
            target,
        }
    }

    pub fn warning(message: impl Into<String>, target: Option<TargetId>) -> Self {
        Self {
            is_critical: false,
            message: message.into(),
            target,
        }
    }
}

/// What the runner hands the engine for one pass.
#[derive(Debug)]
pub struct PassContext<S> {
    /// 1-based pass number.
    pub run_number: u32,
    /// Passes expected at the time this one started.
    pub expected_runs: u32,
    /// No further pass will run after this one.
    pub last_run: bool,
    /// Shared run state; in-pass validators may write messages or request reruns.
    pub state: Arc<RunState<S>>,
    /// Limits as known before this pass.
    pub targets: CompetitionTargets,
}

/// Result of one successful pass.
#[derive(Debug, Clone)]
pub struct PassOutput<S> {
    /// Opaque engine summary, kept in the run state.
    pub summary: S,
    pub findings: Vec<ValidationFinding>,
    pub observations: Vec<RatioObservation>,
}

impl<S> PassOutput<S> {
    pub fn new(summary: S) -> Self {
        Self {
            summary,
            findings: Vec::new(),
            observations: Vec::new(),
        }
    }

    pub fn with_findings(mut self, findings: Vec<ValidationFinding>) -> Self {
        self.findings = findings;
        self
    }

    pub fn with_observations(mut self, observations: Vec<RatioObservation>) -> Self {
        self.observations = observations;
        self
    }
}

/// Executes measurement passes.
#[async_trait]
pub trait MeasurementEngine: Send {
    /// Opaque per-pass result.
    type Summary: Send + Sync + 'static;

    /// Run one pass. Errors and panics are recorded by the runner as
    /// execution errors; they never escape [`super::CompetitionRunner::run`].
    async fn run_pass(
        &mut self,
        ctx: PassContext<Self::Summary>,
    ) -> Result<PassOutput<Self::Summary>>;
}

/// Persisted limits for the competition's targets.
pub trait AnnotationStore: Send {
    /// Limits that existed before this competition.
    fn existing_limits(&self) -> Result<Vec<TargetLimitEntry>>;

    /// Persist changed limits. Returns the entries as stored, which may
    /// differ from the input if the store adjusts them.
    fn try_annotate(&mut self, targets: &[TargetLimitEntry]) -> Result<Vec<TargetLimitEntry>>;
}

/// Annotation store kept in memory. Stores entries as given.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAnnotationStore {
    limits: BTreeMap<TargetId, TargetLimitEntry>,
    annotate_calls: usize,
}

impl InMemoryAnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(entries: impl IntoIterator<Item = TargetLimitEntry>) -> Self {
        let limits = entries
            .into_iter()
            .map(|mut e| {
                e.changed = false;
                (e.target.clone(), e)
            })
            .collect();
        Self {
            limits,
            annotate_calls: 0,
        }
    }

    pub fn get(&self, target: &TargetId) -> Option<&TargetLimitEntry> {
        self.limits.get(target)
    }

    /// Number of `try_annotate` calls so far.
    pub fn annotate_calls(&self) -> usize {
        self.annotate_calls
    }
}

impl AnnotationStore for InMemoryAnnotationStore {
    fn existing_limits(&self) -> Result<Vec<TargetLimitEntry>> {
        Ok(self.limits.values().cloned().collect())
    }

    fn try_annotate(&mut self, targets: &[TargetLimitEntry]) -> Result<Vec<TargetLimitEntry>> {
        self.annotate_calls += 1;
        let stored: Vec<TargetLimitEntry> = targets
            .iter()
            .map(|t| TargetLimitEntry::new(t.target.clone(), t.limit))
            .collect();
        for entry in &stored {
            self.limits.insert(entry.target.clone(), entry.clone());
        }
        Ok(stored)
    }
}

/// Sink for human-readable progress lines.
pub trait HostLogger: Send + Sync {
    fn write_info(&self, text: &str);
}

/// Forwards progress lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHostLogger;

impl HostLogger for TracingHostLogger {
    fn write_info(&self, text: &str) {
        info!("{}", text);
    }
}

/// Host-specific reporting of a finished competition.
///
/// Each method is called at most once per report with every message of its
/// bucket joined by newlines.
pub trait ReportSink {
    fn report_execution_errors(&self, text: &str);
    fn report_assertions_failed(&self, text: &str);
    fn report_warnings(&self, text: &str);
}
