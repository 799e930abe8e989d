//! Recorded scenarios and the engine that replays them.
//!
//! A scenario file lists what each measurement pass produced: ratio
//! samples per target, validation findings, or a failure. Pass `i` replays
//! entry `min(i, len - 1)`, so a scenario can be shorter than the number of
//! passes the runner decides to make.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use competition::{
    MeasurementEngine, PassContext, PassOutput, RatioObservation, ValidationFinding,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One recorded measurement pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPass {
    /// Ratio samples keyed by target name.
    #[serde(default)]
    pub samples: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub findings: Vec<ValidationFinding>,
    /// When set, the pass fails with this error instead of producing output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<String>,
}

/// A named sequence of recorded passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub passes: Vec<ScenarioPass>,
}

impl Scenario {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
        Self::from_json(&content).context(format!("Invalid scenario {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let scenario: Scenario =
            serde_json::from_str(json).context("Failed to parse scenario JSON")?;
        if scenario.passes.is_empty() {
            anyhow::bail!("Scenario '{}' has no passes", scenario.name);
        }
        Ok(scenario)
    }

    /// Entry replayed for the given 0-based pass index.
    pub fn pass(&self, index: usize) -> Option<&ScenarioPass> {
        let last = self.passes.len().checked_sub(1)?;
        self.passes.get(index.min(last))
    }
}

/// What the replay engine keeps per pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub run_number: u32,
    /// Scenario entry that was replayed.
    pub entry: usize,
    pub observed_targets: usize,
}

/// Measurement engine backed by a [`Scenario`].
#[derive(Debug)]
pub struct ReplayEngine {
    scenario: Scenario,
    replayed: usize,
}

impl ReplayEngine {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            replayed: 0,
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Passes replayed so far.
    pub fn replayed(&self) -> usize {
        self.replayed
    }
}

#[async_trait]
impl MeasurementEngine for ReplayEngine {
    type Summary = ReplaySummary;

    async fn run_pass(
        &mut self,
        ctx: PassContext<ReplaySummary>,
    ) -> Result<PassOutput<ReplaySummary>> {
        let index = self.replayed;
        self.replayed += 1;

        let Some(pass) = self.scenario.pass(index) else {
            anyhow::bail!("Scenario '{}' has no passes", self.scenario.name);
        };
        let entry = index.min(self.scenario.passes.len() - 1);
        debug!(run = ctx.run_number, entry, "Replaying scenario pass");

        if let Some(error) = &pass.fail {
            anyhow::bail!("{}", error);
        }

        let mut findings = pass.findings.clone();
        let mut observations = Vec::with_capacity(pass.samples.len());
        for (target, samples) in &pass.samples {
            match RatioObservation::from_samples(target.as_str(), samples) {
                Some(observation) => observations.push(observation),
                None => findings.push(ValidationFinding::warning(
                    format!("Target {}: no usable samples", target),
                    Some(target.as_str().into()),
                )),
            }
        }

        let summary = ReplaySummary {
            run_number: ctx.run_number,
            entry,
            observed_targets: observations.len(),
        };
        Ok(PassOutput::new(summary)
            .with_findings(findings)
            .with_observations(observations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use competition::RunState;
    use std::sync::Arc;

    const SCENARIO: &str = r#"{
        "name": "Sorting",
        "passes": [
            { "samples": { "Sort.Quick": [1.0, 1.1, 1.2] } },
            {
                "samples": { "Sort.Quick": [1.0], "Sort.Empty": [] },
                "findings": [ { "is_critical": true, "message": "too slow" } ]
            },
            { "fail": "benchmark process exited with code 3" }
        ]
    }"#;

    fn ctx(run_number: u32) -> PassContext<ReplaySummary> {
        PassContext {
            run_number,
            expected_runs: 1,
            last_run: false,
            state: Arc::new(RunState::new()),
            targets: Default::default(),
        }
    }

    #[test]
    fn test_parse_and_clamp_index() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        assert_eq!(scenario.passes.len(), 3);
        assert!(scenario.pass(0).unwrap().fail.is_none());
        assert_eq!(scenario.pass(7), scenario.pass(2));
    }

    #[test]
    fn test_empty_scenario_rejected() {
        let err = Scenario::from_json(r#"{"name": "x", "passes": []}"#).unwrap_err();
        assert!(err.to_string().contains("no passes"));
    }

    #[tokio::test]
    async fn test_replay_passes_in_order() {
        let mut engine = ReplayEngine::new(Scenario::from_json(SCENARIO).unwrap());

        let first = engine.run_pass(ctx(1)).await.unwrap();
        assert_eq!(first.summary.entry, 0);
        assert_eq!(first.observations.len(), 1);
        assert!(first.findings.is_empty());

        let second = engine.run_pass(ctx(2)).await.unwrap();
        assert_eq!(second.summary.observed_targets, 1);
        assert_eq!(second.findings.len(), 2);
        assert!(second.findings[0].is_critical);
        assert!(second.findings[1].message.contains("Sort.Empty"));

        let err = engine.run_pass(ctx(3)).await.unwrap_err();
        assert!(err.to_string().contains("exited with code 3"));

        // past the end the last entry repeats
        assert!(engine.run_pass(ctx(4)).await.is_err());
        assert_eq!(engine.replayed(), 4);
    }
}
