//! The `replay` command: scenario in, report out.

use std::path::PathBuf;

use anyhow::Result;
use competition::{
    AnnotationStore, CompetitionConfig, CompetitionContext, CompetitionReport, CompetitionRunner,
    InMemoryAnnotationStore,
};
use tracing::info;

use crate::config::AppConfig;
use crate::scenario::{ReplayEngine, Scenario};
use crate::store::JsonLimitsStore;

/// Inputs of one replay, after CLI parsing.
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    pub scenario: PathBuf,
    pub config: Option<PathBuf>,
    pub limits: Option<PathBuf>,
    pub max_reruns: Option<u32>,
    pub update_annotations: bool,
}

impl ReplayOptions {
    /// Resolve the effective config: file, then environment, then flags.
    pub fn resolve(&self) -> Result<(CompetitionConfig, Option<PathBuf>)> {
        let mut app = AppConfig::load(self.config.as_deref())?;
        if let Some(max) = self.max_reruns {
            app.competition.max_rerun_count = max;
        }
        if self.update_annotations {
            app.competition.update_annotations = true;
        }
        let limits = self.limits.clone().or(app.limits_path);
        Ok((app.competition, limits))
    }
}

/// Replay a scenario through the runner.
///
/// Fails only when an input file cannot be read; everything that goes
/// wrong during the competition ends up in the returned report.
pub async fn replay(options: &ReplayOptions) -> Result<CompetitionReport> {
    let scenario = Scenario::from_file(&options.scenario)?;
    let (config, limits_path) = options.resolve()?;
    info!(
        scenario = %scenario.name,
        passes = scenario.passes.len(),
        max_reruns = config.max_rerun_count,
        update_annotations = config.update_annotations,
        "Replaying scenario"
    );

    let ctx = CompetitionContext::new(scenario.name.clone(), config);
    let engine = ReplayEngine::new(scenario);

    let report = match limits_path {
        Some(path) => run_with(engine, JsonLimitsStore::open(path)?, &ctx).await,
        None => run_with(engine, InMemoryAnnotationStore::new(), &ctx).await,
    };
    Ok(report)
}

async fn run_with<A: AnnotationStore>(
    engine: ReplayEngine,
    store: A,
    ctx: &CompetitionContext,
) -> CompetitionReport {
    let mut runner = CompetitionRunner::with_store(engine, store);
    runner.run(ctx).await.report
}
