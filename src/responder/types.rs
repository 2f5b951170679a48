//! `teleData` wire types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /api/teleData`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeleDataRequest {
    pub question: String,
}

/// Reply to `POST /api/teleData`. `answer` is always present and is what a
/// chat client displays; the rest describes how it was produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeleDataAnswer {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raw_results: Vec<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TeleDataAnswer {
    /// Answer with no query details, as produced by non-database responders
    pub fn plain(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            ..Self::default()
        }
    }
}
