//! Intent handlers
//!
//! Every business intent is served by one [`IntentHandler`]. Handlers return
//! a [`HandlerResult`]: an [`Output`] on success or a [`HandlerError`] whose
//! variant decides the protocol error code.

pub mod health;
pub mod task;
pub mod wiki;

use thiserror::Error;

use kbb_core::{ErrorCode, Output, RequestEnvelope};

pub use health::HealthCheckHandler;
pub use task::TaskCreationHandler;
pub use wiki::WikiUpdateHandler;

/// Handler failures, one per protocol error tag
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("Failed to parse task input with LLM: {0}")]
    LlmParsing(String),

    #[error("Failed to store task: {0}")]
    Database(String),

    #[error("Failed to write long-term memory: {0}")]
    WriteFailed(String),

    #[error("Error processing request: {0}")]
    Processing(String),
}

impl HandlerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            HandlerError::LlmParsing(_) => ErrorCode::LlmParsingError,
            HandlerError::Database(_) => ErrorCode::DatabaseError,
            HandlerError::WriteFailed(_) => ErrorCode::LtmWriteFailed,
            HandlerError::Processing(_) => ErrorCode::ProcessingError,
        }
    }
}

pub type HandlerResult = std::result::Result<Output, HandlerError>;

/// A business operation behind one intent
#[async_trait::async_trait]
pub trait IntentHandler: Send + Sync {
    async fn execute(&self, request: &RequestEnvelope) -> HandlerResult;
}

/// Render an error with its whole cause chain on one line
pub(crate) fn chain(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            HandlerError::LlmParsing("x".into()).code(),
            ErrorCode::LlmParsingError
        );
        assert_eq!(HandlerError::Database("x".into()).code(), ErrorCode::DatabaseError);
        assert_eq!(HandlerError::WriteFailed("x".into()).code(), ErrorCode::LtmWriteFailed);
        assert_eq!(HandlerError::Processing("x".into()).code(), ErrorCode::ProcessingError);
    }

    #[test]
    fn test_chain_keeps_causes() {
        let err = anyhow::anyhow!("connection refused").context("INSERT tasks");
        assert_eq!(chain(&err), "INSERT tasks: connection refused");
    }
}
