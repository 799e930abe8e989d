//! Append-only, ordered message list
//!
//! The log itself is not synchronized; [`crate::state::RunState`] owns it
//! behind the same lock as the rest of the run state so every append is
//! serialized with counter updates.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::types::{Message, MessageSeverity, MessageSource};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageLog {
    messages: Vec<Message>,
    current_run: u32,
    next_sequence: u32,
    highest_in_run: Option<MessageSeverity>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new pass: sequence numbers restart and the per-run max resets.
    pub fn begin_run(&mut self, run_number: u32) {
        self.current_run = run_number;
        self.next_sequence = 0;
        self.highest_in_run = None;
    }

    /// Append a message tagged with the current run.
    pub fn write(
        &mut self,
        source: MessageSource,
        severity: MessageSeverity,
        text: impl Into<String>,
    ) -> &Message {
        self.next_sequence += 1;
        self.highest_in_run = Some(match self.highest_in_run {
            Some(current) => current.max(severity),
            None => severity,
        });
        self.messages.push(Message {
            run_number: self.current_run,
            sequence_number: self.next_sequence,
            source,
            severity,
            text: text.into(),
            timestamp: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Copy of every message written so far.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Highest severity written during the current pass.
    pub fn max_severity_in_run(&self) -> Option<MessageSeverity> {
        self.highest_in_run
    }

    /// Highest severity across all passes.
    pub fn max_severity(&self) -> Option<MessageSeverity> {
        self.messages.iter().map(|m| m.severity).max()
    }

    /// Messages written during a given pass.
    pub fn messages_in_run(&self, run_number: u32) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| m.run_number == run_number)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop everything; used when a context starts a fresh competition.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
