//! Transcript entries

use crate::format::{format_message, RenderBlock};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One transcript entry. `raw_text` is the source of truth; render blocks are
/// derived from it on demand and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: u64,
    pub sender: Sender,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn render(&self) -> Vec<RenderBlock> {
        format_message(&self.raw_text)
    }
}

/// Ordered, append-only message list
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    /// Next id to hand out. Survives `clear` so ids are never reused.
    next_id: u64,
}

impl Transcript {
    pub fn append(&mut self, sender: Sender, raw_text: impl Into<String>) -> &Message {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            sender,
            raw_text: raw_text.into(),
            created_at: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
