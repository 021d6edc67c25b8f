//! Simulation error types.

use crate::data::SeriesError;
use std::fmt;
use thiserror::Error;

/// Which of the two input series an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesRole {
    Signal,
    Execution,
}

impl fmt::Display for SeriesRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesRole::Signal => f.write_str("signal"),
            SeriesRole::Execution => f.write_str("execution"),
        }
    }
}

/// Fatal errors raised before or during a run.
///
/// Recoverable conditions (undefined signals, signals with no execution bar
/// or no usable distance unit) never surface here; they are logged and
/// counted in `RunStats`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("{role} series is not strictly increasing: {source}")]
    Ordering {
        role: SeriesRole,
        #[source]
        source: SeriesError,
    },

    #[error("{role} series is invalid: {source}")]
    InvalidSeries {
        role: SeriesRole,
        #[source]
        source: SeriesError,
    },

    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("iteration budget of {budget} exceeded")]
    IterationBudgetExceeded { budget: u64 },
}

impl SimError {
    /// Classify a series construction error for the given role.
    pub fn from_series(role: SeriesRole, source: SeriesError) -> Self {
        match source {
            SeriesError::NotIncreasing { .. } => SimError::Ordering { role, source },
            _ => SimError::InvalidSeries { role, source },
        }
    }
}
