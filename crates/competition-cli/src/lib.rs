//! Host embedding of the competition engine.
//!
//! Replays recorded measurement passes from a JSON scenario through
//! [`competition::CompetitionRunner`], keeping limits in a JSON file.

pub mod config;
pub mod replay;
pub mod report;
pub mod scenario;
pub mod store;

pub use config::AppConfig;
pub use replay::{replay, ReplayOptions};
pub use report::{render, TextReportSink};
pub use scenario::{ReplayEngine, ReplaySummary, Scenario, ScenarioPass};
pub use store::JsonLimitsStore;
