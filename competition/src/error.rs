//! Competition error types
//!
//! The core only fails on caller contract violations (bad numeric input,
//! bad config) and on report serialization. Failures of external
//! collaborators are recorded as messages by the runner instead of being
//! returned.

use thiserror::Error;

/// Result type alias for competition operations
pub type CompetitionResult<T> = Result<T, CompetitionError>;

/// Errors that can occur in the competition core
#[derive(Error, Debug)]
pub enum CompetitionError {
    /// A limit bound was NaN
    #[error("Invalid limit value for {bound}: {value}")]
    InvalidLimit { bound: &'static str, value: f64 },

    /// The measurement engine returned an error for a pass
    #[error("Measurement pass #{run} failed: {message}")]
    MeasurementFailed { run: u32, message: String },

    /// The measurement engine panicked during a pass
    #[error("Measurement pass #{run} panicked: {message}")]
    EnginePanicked { run: u32, message: String },

    /// The annotation store rejected an update
    #[error("Annotation failed: {message}")]
    AnnotationFailed { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompetitionError {
    /// Create an invalid limit error
    pub fn invalid_limit(bound: &'static str, value: f64) -> Self {
        Self::InvalidLimit { bound, value }
    }

    /// Create a measurement failure error
    pub fn measurement(run: u32, message: impl Into<String>) -> Self {
        Self::MeasurementFailed {
            run,
            message: message.into(),
        }
    }

    /// Create an annotation failure error
    pub fn annotation(message: impl Into<String>) -> Self {
        Self::AnnotationFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidLimit { .. } => "INVALID_LIMIT",
            Self::MeasurementFailed { .. } => "MEASUREMENT_FAILED",
            Self::EnginePanicked { .. } => "ENGINE_PANICKED",
            Self::AnnotationFailed { .. } => "ANNOTATION_FAILED",
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }
}
