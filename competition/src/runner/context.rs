//! Competition context: config plus the run state slots for one competition

use std::sync::Arc;

use crate::config::CompetitionConfig;
use crate::state::{RunState, RunStateSlots};

/// Everything scoped to one competition (benchmark type + config).
///
/// Passed explicitly into [`super::CompetitionRunner::run`]; the run state
/// is looked up in `slots`, so reusing a context reuses its run state.
#[derive(Debug)]
pub struct CompetitionContext {
    pub name: String,
    pub config: CompetitionConfig,
    slots: RunStateSlots,
}

impl CompetitionContext {
    pub fn new(name: impl Into<String>, config: CompetitionConfig) -> Self {
        Self {
            name: name.into(),
            config,
            slots: RunStateSlots::new(),
        }
    }

    /// Run state for summaries of type `S`, created on first access.
    pub fn run_state<S>(&self) -> Arc<RunState<S>>
    where
        S: Send + Sync + 'static,
    {
        self.slots.get_or_create::<RunState<S>>()
    }

    pub fn slots(&self) -> &RunStateSlots {
        &self.slots
    }
}
