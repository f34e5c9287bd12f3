//! LLM integration — the generative-text adapter behind draft generation.
//!
//! The wire contract is the OpenAI-style chat-completions shape: one `POST`
//! with a two-message prompt (system + user) and a fixed model identifier;
//! the first choice's message content is the draft. `base_url` is overridable
//! so any compatible endpoint works.

pub mod provider;

pub use provider::{ChatMessage, Completion, CompletionRequest, LlmProvider};

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::error::LlmError;

/// Configuration for creating an LLM provider.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = OpenAiProvider::new(config)?;
    info!(model = %config.model, "Using chat-completions provider");
    Ok(Arc::new(provider))
}

// ── OpenAI-compatible provider ──────────────────────────────────────

/// Chat-completions client over `reqwest`.
pub struct OpenAiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

#[derive(serde::Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(serde::Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(serde::Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(serde::Deserialize)]
struct WireMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let body = WireRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::AuthFailed);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        // First completion choice is the draft.
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".into()))?;

        Ok(Completion { content })
    }
}
