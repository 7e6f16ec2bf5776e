//! Runtime configuration, read from flags and the environment at start-up.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use reqwest::Client;
use tracing::warn;

use crate::chat::ChatService;
use crate::classifier::ClassifierMode;
use crate::completion::{FallbackTrigger, GenerationParams, ModelPlan, OpenAiCompletion};
use crate::constants;
use crate::prompt::Persona;
use crate::search::PerplexitySearch;

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    #[arg(long, env = "CAMPUS_CHAT_HOST", default_value = "0.0.0.0", help = "Address to bind the web server to.")]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
    pub port: u16,

    #[arg(long, env = "LLAMA_API_KEY", hide_env_values = true, help = "API key for the completion endpoint.")]
    pub llama_api_key: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, help = "Used when no Llama key is set.")]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "LLAMA_BASE_URL", default_value = constants::DEFAULT_COMPLETION_BASE_URL)]
    pub completion_base_url: String,

    #[arg(long, env = "COMPLETION_MODEL", default_value = constants::DEFAULT_COMPLETION_MODEL)]
    pub completion_model: String,

    #[arg(long, env = "COMPLETION_FALLBACK_MODEL", help = "Model tried once when the primary model fails.")]
    pub fallback_model: Option<String>,

    #[arg(long, env = "COMPLETION_FALLBACK_ON", value_enum, default_value_t = FallbackTrigger::BadRequest)]
    pub fallback_on: FallbackTrigger,

    #[arg(long, default_value_t = constants::DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    #[arg(long, default_value_t = constants::DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    #[arg(long, env = "PERPLEXITY_API_KEY", hide_env_values = true, help = "API key for the search endpoint.")]
    pub search_api_key: Option<String>,

    #[arg(long, env = "PERPLEXITY_BASE_URL", default_value = constants::DEFAULT_SEARCH_BASE_URL)]
    pub search_base_url: String,

    #[arg(long, env = "SEARCH_MODEL", default_value = constants::DEFAULT_SEARCH_MODEL)]
    pub search_model: String,

    #[arg(long, env = "CAMPUS_CHAT_CLASSIFIER", value_enum, default_value_t = ClassifierMode::Keyword, help = "How to decide whether a question needs search.")]
    pub classifier: ClassifierMode,

    #[arg(long, default_value = constants::DEFAULT_INSTITUTION)]
    pub institution: String,

    #[arg(long, default_value = constants::DEFAULT_INSTITUTION_SHORT)]
    pub institution_short: String,

    #[arg(long, default_value_t = constants::DEFAULT_REQUEST_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..), help = "Timeout in seconds for each outbound API call.")]
    pub request_timeout_secs: u64,

    #[arg(long, default_value = "templates")]
    pub templates_dir: PathBuf,

    #[arg(long, default_value = "static")]
    pub static_dir: PathBuf,
}

impl ServeConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn persona(&self) -> Persona {
        Persona::new(&self.institution, &self.institution_short)
    }

    /// The Llama key wins over the OpenAI key.
    pub fn completion_api_key(&self) -> Option<String> {
        self.llama_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.openai_api_key.clone())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn search_api_key(&self) -> Option<String> {
        self.search_api_key.clone().filter(|k| !k.trim().is_empty())
    }

    pub fn model_plan(&self) -> ModelPlan {
        ModelPlan {
            primary: self.completion_model.clone(),
            fallback: self.fallback_model.clone(),
            trigger: self.fallback_on,
        }
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Builds the HTTP client and both collaborators. Missing keys are not an
    /// error here; they fail the first request that needs them.
    pub fn build_chat_service(&self) -> Result<ChatService> {
        let http = Client::builder()
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let api_key = self.completion_api_key();
        if api_key.is_none() {
            warn!("No completion API key found. Set LLAMA_API_KEY or OPENAI_API_KEY in your environment.");
        }
        let search_key = self.search_api_key();
        if search_key.is_none() {
            warn!("No search API key found; questions will be answered without search.");
        }

        let persona = self.persona();
        let completion = OpenAiCompletion::new(http.clone(), &self.completion_base_url, api_key);
        let search = PerplexitySearch::new(
            http,
            &self.search_base_url,
            search_key,
            &self.search_model,
            persona.clone(),
        );

        Ok(ChatService::new(
            persona,
            Arc::new(search),
            Arc::new(completion),
            self.model_plan(),
        )
        .with_classifier(self.classifier)
        .with_params(self.generation_params()))
    }
}
