//! Messages: the run's diagnostic record
//!
//! Every finding, failure and progress note of a competition ends up as a
//! [`Message`] in the run's [`MessageLog`]. The outcome of the competition
//! is derived from the severities recorded there.

pub mod log;
pub mod types;

pub use log::MessageLog;
pub use types::{Message, MessageSeverity, MessageSource};
