//! Error types for lineup optimization.

use crate::mip::SolverStatus;
use thiserror::Error;

/// Errors raised while preparing, assembling, or reading back a lineup model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LineupError {
    /// No athlete has a recorded time in a column, so no default exists.
    #[error("no recorded times for {column}")]
    NoRecordedTimes { column: String },

    /// A recorded time is negative or not finite.
    #[error("invalid time {value} for {athlete} in {column}")]
    InvalidTime {
        athlete: String,
        column: String,
        value: f64,
    },

    /// Event name not present in the meet.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Two events share a name.
    #[error("duplicate event: {0}")]
    DuplicateEvent(String),

    /// Athlete not present in the roster.
    #[error("unknown athlete: {0}")]
    UnknownAthlete(String),

    /// Scenario list and probabilities are inconsistent.
    #[error("invalid scenarios: {0}")]
    InvalidScenarios(String),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Assembled model failed validation.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// The solver returned no usable solution.
    #[error("no solution ({status:?}){}", suffix(.message))]
    NoSolution {
        status: SolverStatus,
        message: Option<String>,
    },
}

fn suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}
