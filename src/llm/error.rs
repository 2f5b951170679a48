//! LLM error types

use thiserror::Error;

/// LLM error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn model_not_found(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ModelNotFound, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ServerError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::InvalidRequest, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Connection refused, timeouts. Usually means Ollama is not running
    Network,
    /// Model is not pulled on the Ollama host (404)
    ModelNotFound,
    /// Server error (5xx)
    ServerError,
    /// Bad request (400)
    InvalidRequest,
    /// Unknown error, including unparseable bodies
    Unknown,
}

impl LlmErrorKind {
    /// Whether the backend itself could not be reached or used, as opposed to
    /// the request being malformed
    pub fn is_unavailable(self) -> bool {
        matches!(self, Self::Network | Self::ModelNotFound | Self::ServerError)
    }
}
