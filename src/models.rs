//! Wire types shared by the endpoint, the collaborators and the chat clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// One entry of a conversation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Stamps the message with the current time.
    pub fn stamped(mut self) -> Self {
        self.timestamp = Some(Utc::now());
        self
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Synthesized answer plus citation URLs from the search API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub answer: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub used_search: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    /// A normal answer. `sources` is only kept when search was applied.
    pub fn answer(message: impl Into<String>, search: Option<SearchResult>) -> Self {
        Self {
            message: message.into(),
            used_search: search.is_some(),
            sources: search.map(|s| s.sources),
            error: None,
        }
    }

    /// A refusal produced without contacting any upstream service.
    pub fn rejection(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            used_search: false,
            sources: None,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            used_search: false,
            sources: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_wire_format() {
        let msg: ChatMessage = serde_json::from_value(json!({
            "role": "user",
            "content": "When does the semester start?",
            "timestamp": "2024-08-20T17:30:00.000Z"
        }))
        .unwrap();

        assert_eq!(msg.role, Role::User);
        assert!(msg.timestamp.is_some());

        let untimed = serde_json::to_value(ChatMessage::assistant("Hi")).unwrap();
        assert_eq!(untimed, json!({"role": "assistant", "content": "Hi"}));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let parsed = serde_json::from_value::<ChatMessage>(json!({
            "role": "tool",
            "content": "x"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_request_without_messages_defaults_to_empty() {
        let req: ChatRequest = serde_json::from_str("{}").unwrap();
        assert!(req.messages.is_empty());
    }

    #[test]
    fn test_response_camel_case_and_optional_fields() {
        let rejected = serde_json::to_value(ChatResponse::rejection("nope")).unwrap();
        assert_eq!(rejected, json!({"message": "nope", "usedSearch": false}));

        let answered = ChatResponse::answer(
            "Tuition is listed online.",
            Some(SearchResult {
                answer: "ctx".to_string(),
                sources: vec!["https://www.sfsu.edu/tuition".to_string()],
            }),
        );
        let value = serde_json::to_value(&answered).unwrap();
        assert_eq!(value["usedSearch"], json!(true));
        assert_eq!(value["sources"], json!(["https://www.sfsu.edu/tuition"]));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_response_survives_client_parse() {
        let sent = ChatResponse::answer(
            "Parking permits are sold per semester.",
            Some(SearchResult {
                answer: String::new(),
                sources: vec![
                    "https://parking.sfsu.edu".to_string(),
                    "https://www.sfsu.edu/permits".to_string(),
                ],
            }),
        );
        let wire = serde_json::to_string(&sent).unwrap();
        let received: ChatResponse = serde_json::from_str(&wire).unwrap();

        assert_eq!(received.message, sent.message);
        assert_eq!(received.used_search, sent.used_search);
        assert_eq!(received.sources, sent.sources);
    }
}
