// Backend logic for one chat round trip: validate, optionally search,
// assemble the prompt, complete, shape the reply.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::classifier::{classify_with_model, ClassifierMode, KeywordClassifier};
use crate::completion::{CompletionBackend, GenerationParams, ModelPlan};
use crate::error::ChatError;
use crate::models::{ChatMessage, ChatResponse, Role, SearchResult};
use crate::prompt::{build_messages, Persona};
use crate::search::SearchProvider;
use crate::validator::{QueryValidator, Validation};

pub struct ChatService {
    persona: Persona,
    validator: QueryValidator,
    keywords: KeywordClassifier,
    classifier: ClassifierMode,
    search: Arc<dyn SearchProvider>,
    completion: Arc<dyn CompletionBackend>,
    models: ModelPlan,
    params: GenerationParams,
}

impl ChatService {
    pub fn new(
        persona: Persona,
        search: Arc<dyn SearchProvider>,
        completion: Arc<dyn CompletionBackend>,
        models: ModelPlan,
    ) -> Self {
        Self {
            validator: QueryValidator::new(&persona),
            keywords: KeywordClassifier::new(&persona),
            persona,
            classifier: ClassifierMode::default(),
            search,
            completion,
            models,
            params: GenerationParams::default(),
        }
    }

    pub fn with_classifier(mut self, mode: ClassifierMode) -> Self {
        self.classifier = mode;
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    #[instrument(skip_all, fields(history = messages.len()))]
    pub async fn respond(&self, messages: &[ChatMessage]) -> Result<ChatResponse, ChatError> {
        let last = messages
            .last()
            .ok_or_else(|| ChatError::bad_request("No messages provided"))?;
        if last.role != Role::User {
            return Err(ChatError::bad_request("Last message must be from user"));
        }

        if let Validation::Rejected { reason } = self.validator.validate(&last.content) {
            info!("Query rejected by validator");
            return Ok(ChatResponse::rejection(reason));
        }

        let search = if self.needs_search(&last.content).await {
            self.search_best_effort(&last.content).await
        } else {
            None
        };

        let prompt = build_messages(
            &self.persona,
            messages,
            search.as_ref().map(|s| s.answer.as_str()),
        );
        let message = self
            .models
            .run(self.completion.as_ref(), &prompt, self.params)
            .await?;

        info!(used_search = search.is_some(), "Chat request answered");
        Ok(ChatResponse::answer(message, search))
    }

    async fn needs_search(&self, query: &str) -> bool {
        match self.classifier {
            ClassifierMode::Keyword => self.keywords.requires_institution_info(query),
            ClassifierMode::Model => {
                classify_with_model(
                    self.completion.as_ref(),
                    &self.models.primary,
                    &self.persona,
                    query,
                )
                .await
                .search
            }
        }
    }

    async fn search_best_effort(&self, query: &str) -> Option<SearchResult> {
        match self.search.search(query).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(error = %e, "Search failed, continuing without search results");
                None
            }
        }
    }
}
