//! Client for a search/answer API (Perplexity-style chat completions with citations).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::models::SearchResult;
use crate::prompt::Persona;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("No search API key configured. Set PERPLEXITY_API_KEY.")]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Search API error: {status} - {body}")]
    Status { status: u16, body: String },
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResult, SearchError>;
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    model: &'a str,
    messages: [SearchMessage; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct SearchMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    choices: Vec<SearchChoice>,
    #[serde(default)]
    citations: Option<Vec<CitationEntry>>,
    #[serde(default)]
    search_results: Option<Vec<CitationEntry>>,
}

#[derive(Debug, Deserialize)]
struct SearchChoice {
    #[serde(default)]
    message: Option<SearchChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct SearchChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// One citation as providers send it: a bare URL, an object carrying `url`,
/// or something unusable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CitationEntry {
    Url(String),
    Record { url: Value },
    Other(Value),
}

impl CitationEntry {
    fn usable_url(&self) -> Option<String> {
        let candidate = match self {
            CitationEntry::Url(url) => url.as_str(),
            CitationEntry::Record { url: Value::String(url) } => url.as_str(),
            _ => return None,
        };
        let candidate = candidate.trim();
        (candidate.starts_with("https://") || candidate.starts_with("http://"))
            .then(|| candidate.to_string())
    }
}

impl SearchResponse {
    /// Flat `citations` win when present; otherwise `search_results` objects.
    /// Entries without a usable URL are dropped.
    pub fn sources(&self) -> Vec<String> {
        self.citations
            .as_ref()
            .or(self.search_results.as_ref())
            .map(|entries| entries.iter().filter_map(CitationEntry::usable_url).collect())
            .unwrap_or_default()
    }

    pub fn answer(&self) -> String {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone())
            .unwrap_or_default()
    }

    pub fn into_result(self) -> SearchResult {
        SearchResult {
            answer: self.answer(),
            sources: self.sources(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PerplexitySearch {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    persona: Persona,
}

impl PerplexitySearch {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        persona: Persona,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            persona,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SearchProvider for PerplexitySearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<SearchResult, SearchError> {
        let api_key = self.api_key.as_deref().ok_or(SearchError::MissingApiKey)?;
        let short = &self.persona.short_name;

        let body = SearchRequest {
            model: &self.model,
            messages: [
                SearchMessage {
                    role: "system",
                    content: format!(
                        "You are a helpful assistant that searches for accurate, up-to-date information about {} ({}). Provide a concise answer and include sources in the response metadata.",
                        self.persona.name, short
                    ),
                },
                SearchMessage {
                    role: "user",
                    content: format!("Find current information about {short} related to: {query}"),
                },
            ],
            temperature: 0.1,
            max_tokens: 1000,
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
            let body = resp.text().await.unwrap_or_default();
            error!(status, %body, "Search API returned non-success status");
            return Err(SearchError::Status { status, body });
        }

        let result = resp.json::<SearchResponse>().await?.into_result();
        debug!(sources = result.sources.len(), "Search answered");
        Ok(result)
    }
}
