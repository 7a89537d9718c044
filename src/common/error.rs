//! Error types for cartesian_planner

use thiserror::Error;

/// Main error type for the planner and its collaborators
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Invalid configuration parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Reference line could not be built (too few waypoints, degenerate spline, ...)
    #[error("Invalid reference line: {0}")]
    InvalidReference(String),
    /// Configuration file could not be read or parsed
    #[error("Config load error: {0}")]
    ConfigLoad(String),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
