//! Client for an OpenAI-compatible chat-completion API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::constants::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::models::ChatMessage;

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("No completion API key configured. Set LLAMA_API_KEY or OPENAI_API_KEY.")]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("No response from AI model")]
    EmptyResponse,
}

impl CompletionError {
    /// Upstream HTTP status, when the API answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            CompletionError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Anything that can turn a message list into generated text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiCompletion {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiCompletion {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompletion {
    #[instrument(skip(self, messages, params), fields(messages = messages.len()))]
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::MissingApiKey)?;

        let body = OpenAiRequest {
            model,
            messages: messages
                .iter()
                .map(|m| OpenAiMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            error!(status, %message, "Completion API request failed");
            return Err(CompletionError::Api { status, message });
        }

        let data: OpenAiResponse = resp.json().await?;
        let content = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)?;

        debug!(chars = content.len(), "Received completion");
        Ok(content)
    }
}

/// Which primary failures are worth one attempt with the fallback model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FallbackTrigger {
    Never,
    /// HTTP 400 only.
    #[default]
    BadRequest,
    /// Any HTTP 4xx.
    ClientError,
}

impl FallbackTrigger {
    pub fn matches(&self, err: &CompletionError) -> bool {
        match (self, err.status()) {
            (FallbackTrigger::Never, _) | (_, None) => false,
            (FallbackTrigger::BadRequest, Some(status)) => status == 400,
            (FallbackTrigger::ClientError, Some(status)) => (400..500).contains(&status),
        }
    }
}

/// Ordered model attempts: the primary model, then at most one fallback when
/// the primary error matches `trigger`. A failed fallback surfaces the
/// primary error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPlan {
    pub primary: String,
    pub fallback: Option<String>,
    pub trigger: FallbackTrigger,
}

impl ModelPlan {
    pub fn single(model: impl Into<String>) -> Self {
        Self {
            primary: model.into(),
            fallback: None,
            trigger: FallbackTrigger::Never,
        }
    }

    pub async fn run(
        &self,
        backend: &dyn CompletionBackend,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<String, CompletionError> {
        let primary_err = match backend.complete(&self.primary, messages, params).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };

        let fallback = match self.fallback.as_deref() {
            Some(model) if self.trigger.matches(&primary_err) => model,
            _ => return Err(primary_err),
        };

        warn!(
            primary = %self.primary,
            fallback,
            error = %primary_err,
            "Primary model failed, trying fallback model"
        );
        match backend.complete(fallback, messages, params).await {
            Ok(text) => Ok(text),
            Err(fallback_err) => {
                warn!(error = %fallback_err, "Fallback model failed as well");
                Err(primary_err)
            }
        }
    }
}
