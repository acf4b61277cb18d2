//! Error types for moodify-engine
//!
//! The decision core itself never fails outward; these errors cover input
//! decoding and the CLI plumbing around it.

use thiserror::Error;

/// Engine error type
#[derive(Debug, Error)]
pub enum EngineError {
    /// Request line could not be decoded
    #[error("Invalid request: {0}")]
    Json(#[from] serde_json::Error),

    /// Request decoded but its contents are unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
