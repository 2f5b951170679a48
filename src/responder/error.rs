//! Responder error types

use crate::llm::LlmError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResponderError {
    /// Backend could not be reached or refused to answer
    #[error("responder unavailable: {0}")]
    Unavailable(String),
    #[error("responder timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// Backend answered with something other than `{"answer": ...}`
    #[error("invalid response from responder: {0}")]
    InvalidResponse(String),
}

impl From<LlmError> for ResponderError {
    fn from(e: LlmError) -> Self {
        if e.kind.is_unavailable() {
            ResponderError::Unavailable(e.message)
        } else {
            ResponderError::InvalidResponse(e.message)
        }
    }
}
