//! Competition Runner - the bounded rerun loop
//!
//! Drives measurement passes until no rerun is wanted or the hard cap is
//! reached. Every failure ends up as a message; `run` never returns an
//! error and never panics on collaborator failure.
//!
//! # Rerun loop
//!
//! ```text
//! expected = 1, i = 0
//! loop:
//!     last_run = i >= max - 1
//!     init_on_run(last_run)
//!     pass ──error/panic──▶ ExecutionError, stop
//!       │
//!       ▼
//!     record summary, annotate, check limits, record findings
//!     i += 1
//!     last_run              → stop
//!     rerun requested       → expected = min(expected + 2, max), continue
//!     i < expected          → continue
//!     otherwise             → stop
//! ```
//!
//! A rerun request adds two passes: one to verify, one as buffer. The cap
//! is enforced unconditionally, so at most `max_rerun_count` passes run
//! whatever the collaborators request.
//!
//! Failed limit checks request a rerun once per competition. If the limits
//! still fail on the passes that follow, the loop ends with the failure
//! reported.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::error::{CompetitionError, CompetitionResult};
use crate::limits::{LimitChecker, LimitsUnionEngine, RatioObservation};
use crate::messages::{MessageSeverity, MessageSource};
use crate::runner::{
    AnnotationStore, CompetitionContext, CompetitionOutcome, CompetitionReport, HostLogger,
    InMemoryAnnotationStore, MeasurementEngine, PassContext, PassOutput, TracingHostLogger,
    ValidationFinding,
};
use crate::state::RunState;
use crate::targets::CompetitionTargets;

/// Passes added per rerun request.
pub const RERUN_STEP: u32 = 2;

/// Result of [`CompetitionRunner::run`].
#[derive(Debug)]
pub struct CompetitionRun<S> {
    pub state: Arc<RunState<S>>,
    pub report: CompetitionReport,
}

impl<S> CompetitionRun<S> {
    pub fn outcome(&self) -> CompetitionOutcome {
        self.report.outcome
    }
}

/// Orchestrates one competition over a measurement engine and an
/// annotation store.
pub struct CompetitionRunner<E, A = InMemoryAnnotationStore> {
    engine: E,
    store: A,
    logger: Arc<dyn HostLogger>,
    union: LimitsUnionEngine,
    checker: LimitChecker,
}

impl<E> CompetitionRunner<E, InMemoryAnnotationStore>
where
    E: MeasurementEngine,
{
    /// Runner with an empty in-memory annotation store.
    pub fn new(engine: E) -> Self {
        Self::with_store(engine, InMemoryAnnotationStore::new())
    }
}

impl<E, A> CompetitionRunner<E, A>
where
    E: MeasurementEngine,
    A: AnnotationStore,
{
    pub fn with_store(engine: E, store: A) -> Self {
        Self {
            engine,
            store,
            logger: Arc::new(TracingHostLogger),
            union: LimitsUnionEngine::new(),
            checker: LimitChecker::new(),
        }
    }

    /// Replace the host logger.
    pub fn with_logger(mut self, logger: Arc<dyn HostLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn store(&self) -> &A {
        &self.store
    }

    /// Run the competition to completion.
    pub async fn run(&mut self, ctx: &CompetitionContext) -> CompetitionRun<E::Summary> {
        let span = info_span!("competition", competition = %ctx.name);
        self.run_inner(ctx).instrument(span).await
    }

    async fn run_inner(&mut self, ctx: &CompetitionContext) -> CompetitionRun<E::Summary> {
        let state = ctx.run_state::<E::Summary>();
        state.reset();

        if let Err(e) = ctx.config.validate() {
            warn!(error = %e, "Invalid competition config, not running");
            state.write_message(MessageSource::Other, MessageSeverity::SetupError, e.to_string());
            let targets = CompetitionTargets::new();
            return self.finish(ctx, state, &targets);
        }

        let mut targets = self.load_targets(ctx, &state);
        let max = ctx.config.effective_max_rerun_count();
        let mut expected: u32 = 1;
        let mut pass_index: u32 = 0;
        let mut execution_failed = false;

        loop {
            let last_run = pass_index + 1 >= max;
            state.init_on_run(last_run, expected);
            let run_number = state.run_number();

            self.logger
                .write_info(&format!("Run #{}, expected total: {}", run_number, expected));
            info!(run = run_number, expected_total = expected, last_run, "Starting pass");

            match self
                .execute_pass(&state, &targets, run_number, expected, last_run)
                .await
            {
                Ok(output) => {
                    let PassOutput {
                        summary,
                        findings,
                        observations,
                    } = output;
                    state.run_succeed(summary);
                    self.process_pass(ctx, &state, &mut targets, &findings, &observations);
                }
                Err(e) => {
                    error!(run = run_number, code = e.code(), error = %e, "Pass failed");
                    state.write_message(
                        MessageSource::BenchmarkRunner,
                        MessageSeverity::ExecutionError,
                        e.to_string(),
                    );
                    execution_failed = true;
                    break;
                }
            }

            pass_index += 1;

            if last_run {
                debug!(run = run_number, "Last allowed pass finished");
                break;
            }
            if state.rerun_requested() {
                expected = (expected + RERUN_STEP).min(max);
                debug!(run = run_number, expected_total = expected, "Rerun requested");
                continue;
            }
            if pass_index < expected {
                continue;
            }
            break;
        }

        if !execution_failed {
            self.report_pass_count(&state, max);
        }

        self.finish(ctx, state, &targets)
    }

    /// Seed limits from the annotation store unless told to ignore them.
    fn load_targets(
        &self,
        ctx: &CompetitionContext,
        state: &RunState<E::Summary>,
    ) -> CompetitionTargets {
        let mut targets = CompetitionTargets::new();
        if ctx.config.ignore_existing_annotations {
            debug!("Ignoring existing annotations");
            return targets;
        }

        match self.store.existing_limits() {
            Ok(entries) => {
                debug!(count = entries.len(), "Loaded existing limits");
                targets.seed(entries);
            }
            Err(e) => {
                warn!(error = %e, "Failed to load existing limits");
                state.write_message(
                    MessageSource::Other,
                    MessageSeverity::SetupError,
                    format!("Could not load existing limits: {:#}", e),
                );
            }
        }
        targets
    }

    /// Run one pass, turning engine errors and panics into `CompetitionError`.
    async fn execute_pass(
        &mut self,
        state: &Arc<RunState<E::Summary>>,
        targets: &CompetitionTargets,
        run_number: u32,
        expected_runs: u32,
        last_run: bool,
    ) -> CompetitionResult<PassOutput<E::Summary>> {
        let pass_ctx = PassContext {
            run_number,
            expected_runs,
            last_run,
            state: Arc::clone(state),
            targets: targets.clone(),
        };

        match AssertUnwindSafe(self.engine.run_pass(pass_ctx))
            .catch_unwind()
            .await
        {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(CompetitionError::measurement(run_number, format!("{:#}", e))),
            Err(panic) => Err(CompetitionError::EnginePanicked {
                run: run_number,
                message: panic_message(panic.as_ref()),
            }),
        }
    }

    /// Annotate, check limits, record findings, and decide on reruns.
    fn process_pass(
        &mut self,
        ctx: &CompetitionContext,
        state: &RunState<E::Summary>,
        targets: &mut CompetitionTargets,
        findings: &[ValidationFinding],
        observations: &[RatioObservation],
    ) {
        let config = &ctx.config;

        for finding in findings {
            record_finding(state, MessageSource::Validator, finding);
        }

        if config.update_annotations && !observations.is_empty() {
            self.annotate(ctx, state, targets, observations);
        }

        if config.check_limits && !observations.is_empty() {
            for finding in self.checker.check(targets, observations) {
                record_finding(state, MessageSource::Analyser, &finding);
            }
        }

        // one rerun per competition; a failure that survives it is reported
        if config.rerun_if_limits_failed
            && !state.looks_like_last_run()
            && state.has_test_errors_in_run()
        {
            if state.grant_limits_rerun() {
                state.request_reruns(1, "limit checks failed");
            } else {
                debug!("Limit checks failed again, rerun already granted");
            }
        }
    }

    /// Widen limits from observations and persist the changed ones.
    fn annotate(
        &mut self,
        ctx: &CompetitionContext,
        state: &RunState<E::Summary>,
        targets: &mut CompetitionTargets,
        observations: &[RatioObservation],
    ) {
        let updates = self.union.apply(targets, observations);
        if updates.is_empty() {
            debug!("No limits changed");
            return;
        }

        let changed = targets.changed_entries();
        match self.store.try_annotate(&changed) {
            Ok(annotated) => {
                info!(count = annotated.len(), "Annotations updated");
                for entry in &annotated {
                    state.write_message(
                        MessageSource::Analyser,
                        MessageSeverity::Informational,
                        format!("Limit for {} updated to {}", entry.target, entry.limit),
                    );
                }
                targets.merge_annotated(annotated);

                if ctx.config.rerun_after_annotation && !state.looks_like_last_run() {
                    state.request_reruns(1, "limits were updated");
                }
            }
            Err(e) => {
                warn!(error = %e, "Annotation store rejected update");
                state.write_message(
                    MessageSource::Other,
                    MessageSeverity::SetupError,
                    CompetitionError::annotation(format!("{:#}", e)).to_string(),
                );
            }
        }
    }

    /// Emit the one terminal summary for multi-pass competitions.
    fn report_pass_count(&self, state: &RunState<E::Summary>, max: u32) {
        let passes = state.passes_completed();
        if passes <= 1 {
            return;
        }

        if passes >= max {
            state.mark_run_limit_exceeded();
            warn!(passes, max, "Rerun limit exceeded");
            state.write_message(
                MessageSource::Other,
                MessageSeverity::TestError,
                format!(
                    "The benchmark was run {} times and reached the rerun limit ({}). Adjust the competition limits.",
                    passes, max
                ),
            );
        } else {
            state.write_message(
                MessageSource::Other,
                MessageSeverity::Warning,
                format!(
                    "The benchmark was run {} times. Consider adjusting the competition limits.",
                    passes
                ),
            );
        }
    }

    fn finish(
        &self,
        ctx: &CompetitionContext,
        state: Arc<RunState<E::Summary>>,
        targets: &CompetitionTargets,
    ) -> CompetitionRun<E::Summary> {
        let final_run = state.run_number();
        let mut deciding = state.messages_in_run(0);
        if final_run > 0 {
            deciding.extend(state.messages_in_run(final_run));
        }
        let outcome =
            CompetitionOutcome::classify(deciding.iter(), ctx.config.report_warnings_as_errors);

        let report = CompetitionReport {
            name: ctx.name.clone(),
            outcome,
            passes: state.passes_completed(),
            final_run,
            run_limit_exceeded: state.run_limit_exceeded(),
            messages: state.messages(),
            targets: targets.iter().cloned().collect(),
        };

        info!(
            outcome = %report.outcome,
            passes = report.passes,
            worst = ?state.highest_severity(),
            state = %state.summary(),
            "Competition finished"
        );

        CompetitionRun { state, report }
    }
}

fn record_finding<S>(state: &RunState<S>, source: MessageSource, finding: &ValidationFinding) {
    let severity = if finding.is_critical {
        MessageSeverity::TestError
    } else {
        MessageSeverity::Warning
    };
    state.write_message(source, severity, finding.message.clone());
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
