//! Conversation state kept by a chat client for the length of a session.

use std::collections::{HashMap, HashSet};

use crate::constants::GENERIC_ERROR_MESSAGE;
use crate::models::{ChatMessage, ChatRequest, ChatResponse};

/// Messages in display order, the in-flight flag, and per-message sources.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    loading: bool,
    sources: HashMap<usize, Vec<String>>,
    expanded: HashSet<usize>,
}

impl Transcript {
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::assistant(greeting).stamped()],
            loading: false,
            sources: HashMap::new(),
            expanded: HashSet::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Appends the user's message before the reply arrives and returns the
    /// request to send. `None` when the input is blank or a request is
    /// already outstanding.
    pub fn begin_send(&mut self, input: &str) -> Option<ChatRequest> {
        let content = input.trim();
        if content.is_empty() || self.loading {
            return None;
        }

        self.messages.push(ChatMessage::user(content).stamped());
        self.loading = true;
        Some(ChatRequest {
            messages: self.messages.clone(),
        })
    }

    /// Records the assistant's reply; returns its index.
    pub fn complete(&mut self, response: ChatResponse) -> usize {
        self.messages.push(ChatMessage::assistant(response.message).stamped());
        let index = self.messages.len() - 1;
        if let Some(sources) = response.sources.filter(|s| !s.is_empty()) {
            self.sources.insert(index, sources);
        }
        self.loading = false;
        index
    }

    pub fn fail(&mut self) -> usize {
        self.messages.push(ChatMessage::assistant(GENERIC_ERROR_MESSAGE).stamped());
        self.loading = false;
        self.messages.len() - 1
    }

    pub fn sources_for(&self, index: usize) -> Option<&[String]> {
        self.sources.get(&index).map(Vec::as_slice)
    }

    /// Flips source disclosure for a message; returns the new state. Messages
    /// without sources never expand.
    pub fn toggle_sources(&mut self, index: usize) -> bool {
        if !self.sources.contains_key(&index) {
            return false;
        }
        if !self.expanded.remove(&index) {
            self.expanded.insert(index);
        }
        self.is_expanded(index)
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.contains(&index)
    }

    /// Index of the most recent message that carries sources.
    pub fn last_with_sources(&self) -> Option<usize> {
        self.sources.keys().max().copied()
    }
}
