//! Run State - per-competition record of passes, flags and messages
//!
//! One `RunState` exists per competition. The runner and any validator the
//! measurement engine runs on its own threads share it through an `Arc`;
//! all fields, the message log included, live behind a single mutex and
//! readers get point-in-time copies.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::messages::{Message, MessageLog, MessageSeverity, MessageSource};

#[derive(Debug)]
struct Inner<S> {
    log: MessageLog,
    run_number: u32,
    runs_left: u32,
    looks_like_last_run: bool,
    rerun_requested: bool,
    limits_rerun_granted: bool,
    run_limit_exceeded: bool,
    passes_completed: u32,
    summaries: Vec<Arc<S>>,
}

impl<S> Default for Inner<S> {
    fn default() -> Self {
        Self {
            log: MessageLog::new(),
            run_number: 0,
            runs_left: 0,
            looks_like_last_run: false,
            rerun_requested: false,
            limits_rerun_granted: false,
            run_limit_exceeded: false,
            passes_completed: 0,
            summaries: Vec::new(),
        }
    }
}

/// Mutable run record for one competition, generic over the engine's
/// opaque pass summary type.
#[derive(Debug)]
pub struct RunState<S> {
    inner: Mutex<Inner<S>>,
}

impl<S> Default for RunState<S> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }
}

impl<S> RunState<S> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Run state mutex poisoned by a panicking writer, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Clear messages, counters and summaries for a fresh competition.
    pub fn reset(&self) {
        *self.lock() = Inner::default();
    }

    /// Prepare for the next pass.
    ///
    /// Bumps the run number, recomputes `runs_left` against the currently
    /// expected total, and clears the per-pass rerun flag and severity max.
    /// `last_run` marks the pass at the hard cap; no rerun can follow it.
    pub fn init_on_run(&self, last_run: bool, expected_runs: u32) {
        let mut inner = self.lock();
        inner.run_number += 1;
        inner.runs_left = expected_runs.saturating_sub(inner.run_number);
        inner.looks_like_last_run = last_run;
        inner.rerun_requested = false;
        let run_number = inner.run_number;
        inner.log.begin_run(run_number);
    }

    /// Record a completed pass.
    pub fn run_succeed(&self, summary: S) {
        let mut inner = self.lock();
        inner.summaries.push(Arc::new(summary));
        inner.passes_completed += 1;
    }

    /// Append a message tagged with the current run.
    pub fn write_message(
        &self,
        source: MessageSource,
        severity: MessageSeverity,
        text: impl Into<String>,
    ) {
        self.lock().log.write(source, severity, text);
    }

    /// Ask for more passes.
    ///
    /// A zero count is a no-op. The runner decides how many passes are
    /// actually added; the request is recorded as an informational message.
    pub fn request_reruns(&self, count: u32, explanation: &str) {
        if count == 0 {
            return;
        }
        let mut inner = self.lock();
        inner.rerun_requested = true;
        inner.log.write(
            MessageSource::Other,
            MessageSeverity::Informational,
            format!("Requesting {} run(s): {}", count, explanation),
        );
    }

    /// Claim the one rerun a competition gets for failed limit checks.
    ///
    /// Returns `true` the first time only; later failures run out the
    /// passes already expected.
    pub fn grant_limits_rerun(&self) -> bool {
        let mut inner = self.lock();
        !std::mem::replace(&mut inner.limits_rerun_granted, true)
    }

    pub fn mark_run_limit_exceeded(&self) {
        self.lock().run_limit_exceeded = true;
    }

    pub fn run_number(&self) -> u32 {
        self.lock().run_number
    }

    pub fn runs_left(&self) -> u32 {
        self.lock().runs_left
    }

    pub fn looks_like_last_run(&self) -> bool {
        self.lock().looks_like_last_run
    }

    pub fn rerun_requested(&self) -> bool {
        self.lock().rerun_requested
    }

    pub fn run_limit_exceeded(&self) -> bool {
        self.lock().run_limit_exceeded
    }

    /// Passes that ran to completion across the whole competition.
    pub fn passes_completed(&self) -> u32 {
        self.lock().passes_completed
    }

    pub fn last_run_summary(&self) -> Option<Arc<S>> {
        self.lock().summaries.last().cloned()
    }

    pub fn summaries(&self) -> Vec<Arc<S>> {
        self.lock().summaries.clone()
    }

    /// Snapshot of all messages, in write order.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().log.snapshot()
    }

    pub fn messages_in_run(&self, run_number: u32) -> Vec<Message> {
        self.lock().log.messages_in_run(run_number)
    }

    /// Highest severity written during the current pass.
    pub fn highest_severity_in_run(&self) -> Option<MessageSeverity> {
        self.lock().log.max_severity_in_run()
    }

    /// Highest severity across every pass.
    pub fn highest_severity(&self) -> Option<MessageSeverity> {
        self.lock().log.max_severity()
    }

    /// Limit failures are the worst thing this pass produced.
    ///
    /// Setup and execution errors outrank test errors; a rerun cannot fix
    /// those, so they do not count here.
    pub fn has_test_errors_in_run(&self) -> bool {
        self.highest_severity_in_run() == Some(MessageSeverity::TestError)
    }

    /// One-line summary for logging.
    pub fn summary(&self) -> String {
        let inner = self.lock();
        format!(
            "run={} runs_left={} passes={} last_run={} rerun_requested={} limit_exceeded={} messages={}",
            inner.run_number,
            inner.runs_left,
            inner.passes_completed,
            inner.looks_like_last_run,
            inner.rerun_requested,
            inner.run_limit_exceeded,
            inner.log.len(),
        )
    }
}
