//! Error types for the Knowledge Base Builder core
//!
//! Two families live here. [`CoreError`] covers local failures (file I/O,
//! serialization, cache misuse) and is what the storage types return.
//! [`ErrorCode`] is the closed set of wire codes that end up in the `error.type`
//! field of a response envelope.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Main error type for core operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Attempt to cache an error envelope
    #[error("Only successful responses can be cached")]
    UncacheableResponse,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Wire-level error codes carried in `error.type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation
    InvalidJson,
    MissingField,
    InvalidType,
    InvalidAgent,
    UnsupportedIntent,
    MissingParameter,

    // Handlers
    LlmParsingError,
    DatabaseError,
    LtmWriteFailed,
    ProcessingError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidJson => "INVALID_JSON",
            ErrorCode::MissingField => "MISSING_FIELD",
            ErrorCode::InvalidType => "INVALID_TYPE",
            ErrorCode::InvalidAgent => "INVALID_AGENT",
            ErrorCode::UnsupportedIntent => "UNSUPPORTED_INTENT",
            ErrorCode::MissingParameter => "MISSING_PARAMETER",
            ErrorCode::LlmParsingError => "LLM_PARSING_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::LtmWriteFailed => "LTM_WRITE_FAILED",
            ErrorCode::ProcessingError => "PROCESSING_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
