//! Error types for devassist core
//!
//! Provides a unified error type for operations that can fail a whole
//! conversation turn. Tool failures never reach this type; they are rendered
//! to text at the tool registry boundary.

use crate::llm::LlmError;
use thiserror::Error;

/// Result type for devassist core operations
pub type Result<T> = std::result::Result<T, DevAssistError>;

/// Unified error type for devassist core
#[derive(Error, Debug)]
pub enum DevAssistError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model service error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// The caller sent something the orchestrator cannot work with
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The tool-calling loop was stopped before the model finished
    #[error("Conversation aborted: {reason}")]
    Aborted { reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DevAssistError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        DevAssistError::Config(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        DevAssistError::InvalidRequest(msg.into())
    }

    /// Create an aborted error
    pub fn aborted(reason: impl Into<String>) -> Self {
        DevAssistError::Aborted {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for DevAssistError {
    fn from(err: serde_json::Error) -> Self {
        DevAssistError::Serialization(err.to_string())
    }
}

impl From<crate::config::ConfigError> for DevAssistError {
    fn from(err: crate::config::ConfigError) -> Self {
        DevAssistError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aborted_message() {
        let err = DevAssistError::aborted("exceeded 25 model calls");
        assert_eq!(
            err.to_string(),
            "Conversation aborted: exceeded 25 model calls"
        );
    }

    #[test]
    fn test_llm_error_wraps() {
        let err: DevAssistError = LlmError::Timeout.into();
        assert_eq!(err.to_string(), "LLM error: Request timed out");
    }
}
