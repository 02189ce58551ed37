//! Chat-completion wire types (OpenAI-compatible)

use crate::error::{Nl2SqlError, Result};
use serde::{Deserialize, Serialize};

/// Message in OpenAI chat format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String, // "system", "user", "assistant"
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub n: u32,
    pub stream: bool,
}

impl ChatCompletionRequest {
    pub fn new(
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature,
            max_tokens,
            n: 1,
            stream: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub completion_tokens: Option<u64>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if it carries any content
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }

    pub fn completion_tokens(&self) -> u64 {
        self.usage
            .as_ref()
            .and_then(|usage| usage.completion_tokens)
            .unwrap_or(0)
    }
}

/// Successful completion call
#[derive(Debug, Clone)]
pub struct Completion {
    pub response: ChatCompletionResponse,
    /// Usage total across all calls so far, including this one
    pub cumulative_usage: u64,
}

impl Completion {
    /// Message text of the first choice. A choice without content is a
    /// malformed response, which the pipelines' outer loop retries.
    pub fn content(&self) -> Result<&str> {
        self.response.first_text().ok_or_else(|| {
            Nl2SqlError::MalformedResponse("first choice has no message content".to_string())
        })
    }
}
