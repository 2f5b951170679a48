//! API request and response types

use crate::chat::{Message, Sender};
use crate::format::{render_html, RenderBlock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/teleData`. A missing question is reported as a bad
/// request rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct TeleDataQuery {
    #[serde(default)]
    pub question: Option<String>,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub id: String,
}

/// A transcript entry with its formatted rendering
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: u64,
    pub sender: Sender,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
    pub blocks: Vec<RenderBlock>,
    pub html: String,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        let blocks = message.render();
        Self {
            id: message.id,
            sender: message.sender,
            raw_text: message.raw_text.clone(),
            created_at: message.created_at,
            html: render_html(&blocks),
            blocks,
        }
    }
}

/// Response with a session's transcript
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub messages: Vec<MessageView>,
    pub pending: bool,
}

/// Response for chat action
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub accepted: bool,
}

/// Response for reset
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
