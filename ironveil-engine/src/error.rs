//! Centralized error handling for ironveil
//!
//! Only engine construction surfaces errors to the caller. A running
//! engine recovers from rule-source corruption and malformed input
//! internally; the worst case for a single scan is a conservative
//! unsafe verdict, never an error.

use thiserror::Error;

/// Central error type for the engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rule document could not be read or parsed
    #[error("Pattern load error: {0}")]
    PatternLoad(String),

    /// A single detection pattern failed validation
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
