//! Common types for LLM interactions

/// Single user-turn completion request, the shape every contacts prompt uses
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
}

impl LlmRequest {
    pub fn user(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// LLM response
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub text: String,
    pub usage: Usage,
}

/// Usage statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
