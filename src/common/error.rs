//! Error types for rust_swarm_nav

use thiserror::Error;

/// Why a planning call produced no path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NoPathReason {
    /// The goal position maps onto an occupied cell
    #[error("goal cell is occupied")]
    GoalOccupied,
    /// The open set emptied before the goal cell was finalized
    #[error("goal is unreachable from start")]
    Unreachable,
}

/// Main error type for the navigation stack
#[derive(Debug, Error)]
pub enum NavError {
    /// Path planning found no route
    #[error("No path: {0}")]
    NoPath(NoPathReason),
    /// Invalid construction parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Scenario file could not be parsed
    #[error("Config error: {0}")]
    Config(String),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Visualization error
    #[error("Visualization error: {0}")]
    Visualization(String),
}

impl NavError {
    /// True for the expected "no route" outcome of a planning call
    pub fn is_no_path(&self) -> bool {
        matches!(self, NavError::NoPath(_))
    }
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

/// Result type alias for navigation operations
pub type NavResult<T> = Result<T, NavError>;
