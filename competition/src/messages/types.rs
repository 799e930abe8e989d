//! Message types for severity-tagged diagnostics produced during a run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    Other,
    Validator,
    BenchmarkRunner,
    Analyser,
}

impl std::fmt::Display for MessageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other => write!(f, "other"),
            Self::Validator => write!(f, "validator"),
            Self::BenchmarkRunner => write!(f, "benchmark_runner"),
            Self::Analyser => write!(f, "analyser"),
        }
    }
}

/// Message severity.
///
/// Severities compare by declaration order. Do not reorder the variants:
/// escalation checks such as `severity <= Warning` rely on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSeverity {
    /// Debug-level detail.
    Verbose,
    /// Progress and informational notes.
    Informational,
    /// Non-critical finding.
    Warning,
    /// Critical finding: a limit failed or the rerun cap was hit.
    TestError,
    /// The competition was set up incorrectly.
    SetupError,
    /// The measurement pass itself failed.
    ExecutionError,
}

impl MessageSeverity {
    /// At or above `TestError`: the competition fails.
    pub fn is_critical(self) -> bool {
        self >= Self::TestError
    }
}

impl std::fmt::Display for MessageSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verbose => write!(f, "verbose"),
            Self::Informational => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::TestError => write!(f, "test-error"),
            Self::SetupError => write!(f, "setup-error"),
            Self::ExecutionError => write!(f, "execution-error"),
        }
    }
}

/// A single diagnostic message. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Pass that produced the message (0 before the first pass).
    pub run_number: u32,
    /// Position within the run, starting at 1.
    pub sequence_number: u32,
    pub source: MessageSource,
    pub severity: MessageSeverity,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{}.{} [{}/{}] {}",
            self.run_number, self.sequence_number, self.severity, self.source, self.text
        )
    }
}
