#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use campus_chat::completion::{CompletionBackend, CompletionError, GenerationParams, ModelPlan};
use campus_chat::prompt::Persona;
use campus_chat::search::{SearchError, SearchProvider};
use campus_chat::web_server::{router, AppState};
use campus_chat::{ChatMessage, ChatService, SearchResult};

pub struct CountingSearch {
    pub calls: AtomicUsize,
    pub outcome: Result<SearchResult, u16>,
}

impl CountingSearch {
    pub fn answering(answer: &str, sources: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcome: Ok(SearchResult {
                answer: answer.to_string(),
                sources: sources.iter().map(|s| s.to_string()).collect(),
            }),
        })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcome: Err(status),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for CountingSearch {
    async fn search(&self, _query: &str) -> Result<SearchResult, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(result) => Ok(result.clone()),
            Err(status) => Err(SearchError::Status {
                status: *status,
                body: "search down".to_string(),
            }),
        }
    }
}

pub struct RecordingCompletion {
    pub prompts: Mutex<Vec<Vec<ChatMessage>>>,
    pub reply: Option<String>,
}

impl RecordingCompletion {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            reply: Some(reply.to_string()),
        })
    }

    /// Behaves like an API that returned no usable text.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            reply: None,
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Vec<ChatMessage> {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CompletionBackend for RecordingCompletion {
    async fn complete(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        _params: GenerationParams,
    ) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        self.reply.clone().ok_or(CompletionError::EmptyResponse)
    }
}

pub fn chat_service(search: Arc<CountingSearch>, completion: Arc<RecordingCompletion>) -> ChatService {
    ChatService::new(Persona::default(), search, completion, ModelPlan::single("test-model"))
}

pub fn test_server(chat: ChatService, templates: &Path, static_dir: &Path) -> TestServer {
    let app = router(AppState::new(templates, chat), static_dir);
    TestServer::new(app).unwrap()
}
