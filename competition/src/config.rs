//! Competition configuration

use serde::{Deserialize, Serialize};

use crate::error::{CompetitionError, CompetitionResult};

/// Default hard cap on passes per competition.
pub const DEFAULT_MAX_RERUN_COUNT: u32 = 10;

/// Policy knobs for one competition run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitionConfig {
    /// Hard cap on passes; the loop never runs more than this.
    pub max_rerun_count: u32,
    /// Request a rerun when a pass produced critical findings.
    pub rerun_if_limits_failed: bool,
    /// Widen limits from observations and send them to the annotation store.
    pub update_annotations: bool,
    /// Request a verification rerun after annotations changed a limit.
    pub rerun_after_annotation: bool,
    /// Start every target from an empty limit.
    pub ignore_existing_annotations: bool,
    /// Classify a warned competition as failed.
    pub report_warnings_as_errors: bool,
    /// Check observations against current limits.
    pub check_limits: bool,
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self {
            max_rerun_count: DEFAULT_MAX_RERUN_COUNT,
            rerun_if_limits_failed: true,
            update_annotations: false,
            rerun_after_annotation: true,
            ignore_existing_annotations: false,
            report_warnings_as_errors: false,
            check_limits: true,
        }
    }
}

impl CompetitionConfig {
    /// Reject settings the runner cannot honour.
    pub fn validate(&self) -> CompetitionResult<()> {
        if self.max_rerun_count == 0 {
            return Err(CompetitionError::config(
                "max_rerun_count must be at least 1",
            ));
        }
        Ok(())
    }

    /// The cap actually used by the runner (at least one pass).
    pub fn effective_max_rerun_count(&self) -> u32 {
        self.max_rerun_count.max(1)
    }
}
