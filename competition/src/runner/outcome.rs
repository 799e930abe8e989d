//! Outcome classification and report routing
//!
//! The competition's verdict is taken from the messages that still matter
//! once the loop has stopped: those written during the final pass plus
//! those written before the first pass (setup). Findings from earlier
//! passes that a rerun superseded stay in the log for diagnosis only.

use serde::{Deserialize, Serialize};

use crate::error::CompetitionResult;
use crate::messages::{Message, MessageSeverity};
use crate::runner::ReportSink;
use crate::targets::TargetLimitEntry;

/// Final classification of a competition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionOutcome {
    Passed,
    Warned,
    Failed,
}

impl CompetitionOutcome {
    /// Classify by the highest severity present.
    pub fn classify<'a>(
        messages: impl IntoIterator<Item = &'a Message>,
        warnings_as_errors: bool,
    ) -> Self {
        let highest = messages.into_iter().map(|m| m.severity).max();
        match highest {
            Some(s) if s.is_critical() => Self::Failed,
            Some(MessageSeverity::Warning) if warnings_as_errors => Self::Failed,
            Some(MessageSeverity::Warning) => Self::Warned,
            _ => Self::Passed,
        }
    }

    pub fn is_failed(self) -> bool {
        self == Self::Failed
    }
}

impl std::fmt::Display for CompetitionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "PASSED"),
            Self::Warned => write!(f, "WARNED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Message texts grouped by the reporting callback they go to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBuckets {
    pub execution_errors: Vec<String>,
    pub assertions_failed: Vec<String>,
    pub warnings: Vec<String>,
}

impl ReportBuckets {
    /// ExecutionError and SetupError are execution errors, TestError is an
    /// assertion failure, Warning is a warning. Lower severities are log-only.
    pub fn from_messages<'a>(messages: impl IntoIterator<Item = &'a Message>) -> Self {
        let mut buckets = Self::default();
        for message in messages {
            match message.severity {
                MessageSeverity::ExecutionError | MessageSeverity::SetupError => {
                    buckets.execution_errors.push(message.text.clone())
                }
                MessageSeverity::TestError => buckets.assertions_failed.push(message.text.clone()),
                MessageSeverity::Warning => buckets.warnings.push(message.text.clone()),
                MessageSeverity::Informational | MessageSeverity::Verbose => {}
            }
        }
        buckets
    }

    pub fn is_empty(&self) -> bool {
        self.execution_errors.is_empty()
            && self.assertions_failed.is_empty()
            && self.warnings.is_empty()
    }

    /// Call each non-empty bucket's callback once.
    pub fn route(&self, sink: &dyn ReportSink) {
        if !self.execution_errors.is_empty() {
            sink.report_execution_errors(&self.execution_errors.join("\n"));
        }
        if !self.assertions_failed.is_empty() {
            sink.report_assertions_failed(&self.assertions_failed.join("\n"));
        }
        if !self.warnings.is_empty() {
            sink.report_warnings(&self.warnings.join("\n"));
        }
    }
}

/// Full record of a finished competition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionReport {
    pub name: String,
    pub outcome: CompetitionOutcome,
    /// Passes that ran to completion.
    pub passes: u32,
    /// Number of the final pass (0 when none started).
    pub final_run: u32,
    pub run_limit_exceeded: bool,
    /// Every message across all passes.
    pub messages: Vec<Message>,
    /// Limits as known when the competition ended.
    pub targets: Vec<TargetLimitEntry>,
}

impl CompetitionReport {
    /// Messages that decide the outcome: setup plus the final pass.
    pub fn final_messages(&self) -> impl Iterator<Item = &Message> {
        let final_run = self.final_run;
        self.messages
            .iter()
            .filter(move |m| m.run_number == 0 || m.run_number == final_run)
    }

    pub fn buckets(&self) -> ReportBuckets {
        ReportBuckets::from_messages(self.final_messages())
    }

    /// Route the outcome-relevant messages to the host's callbacks.
    pub fn route_to(&self, sink: &dyn ReportSink) {
        self.buckets().route(sink);
    }

    /// Pretty-printed JSON form of the report.
    pub fn to_json(&self) -> CompetitionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Format as a human-readable summary.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Competition '{}': {} after {} pass(es){}",
            self.name,
            self.outcome,
            self.passes,
            if self.run_limit_exceeded {
                " [rerun limit exceeded]"
            } else {
                ""
            },
        )];
        for message in self.final_messages() {
            if message.severity >= MessageSeverity::Warning {
                lines.push(format!("  {}", message));
            }
        }
        for entry in &self.targets {
            lines.push(format!("  {} {}", entry.target, entry.limit));
        }
        lines.join("\n")
    }
}
