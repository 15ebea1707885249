//! Error types for loopspec-core
//!
//! Provides unified error handling across the crate.

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for planner operations
#[derive(Debug, Error)]
pub enum PlannerError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Program model that violates its own invariants
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Profile that does not match the program
    #[error("Profile error: {0}")]
    Profile(String),

    /// JSON (de)serialization of inputs and reports
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PlannerError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        PlannerError::MalformedInput(msg.into())
    }

    pub fn profile(msg: impl Into<String>) -> Self {
        PlannerError::Profile(msg.into())
    }
}

/// Result type alias for planner operations
pub type Result<T> = std::result::Result<T, PlannerError>;
