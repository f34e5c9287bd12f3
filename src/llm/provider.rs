//! LLM provider trait and the chat-completion wire types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// One message in a chat-completion prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// A completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A completed generation.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
}

/// Generative-text backend. One request per call, no retries here —
/// the draft loop owns failure policy.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier sent with requests.
    fn model_name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_roles() {
        assert_eq!(ChatMessage::system("a").role, "system");
        assert_eq!(ChatMessage::user("b").role, "user");
    }

    #[test]
    fn request_builder_sets_knobs() {
        let request = CompletionRequest::new(vec![ChatMessage::user("hi")])
            .with_temperature(0.7)
            .with_max_tokens(512);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(512));
        assert_eq!(request.messages.len(), 1);
    }
}
