//! Ollama chat provider
//!
//! Talks to `POST {base}/api/chat` with streaming disabled.

use super::types::{LlmRequest, LlmResponse, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "mistral:7b";

/// Ollama service implementation
pub struct OllamaService {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaService {
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
            model: model.into(),
        })
    }

    fn translate_request(&self, request: &LlmRequest) -> OllamaRequest {
        OllamaRequest {
            model: self.model.clone(),
            messages: vec![OllamaMessage {
                role: "user",
                content: request.prompt.clone(),
            }],
            stream: false,
        }
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> LlmError {
        // Ollama reports failures as {"error": "..."}
        let message = serde_json::from_str::<OllamaErrorBody>(body)
            .map_or_else(|_| body.to_string(), |b| b.error);
        match status.as_u16() {
            404 => LlmError::model_not_found(format!("Model not found: {message}")),
            400 => LlmError::invalid_request(format!("Invalid request: {message}")),
            500..=599 => LlmError::server_error(format!("Server error: {message}")),
            _ => LlmError::unknown(format!("HTTP {status}: {message}")),
        }
    }
}

fn normalize_response(resp: OllamaResponse) -> Result<LlmResponse, LlmError> {
    let Some(message) = resp.message else {
        return Err(LlmError::unknown("Ollama response had no message"));
    };
    Ok(LlmResponse {
        text: message.content,
        usage: Usage {
            input_tokens: resp.prompt_eval_count.unwrap_or(0),
            output_tokens: resp.eval_count.unwrap_or(0),
        },
    })
}

#[async_trait]
impl LlmService for OllamaService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let ollama_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        let ollama_response: OllamaResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        normalize_response(ollama_response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaReplyMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: Option<OllamaReplyMessage>,
    prompt_eval_count: Option<u64>,
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}
