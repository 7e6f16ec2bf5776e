//! Request-level errors of the chat endpoint and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::completion::CompletionError;
use crate::constants::GENERIC_ERROR_MESSAGE;
use crate::models::ChatResponse;

#[derive(Error, Debug)]
pub enum ChatError {
    /// Malformed or unusable request; never retried.
    #[error("{0}")]
    BadRequest(String),

    /// Missing credentials, detected on first use.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Completion failed: {0}")]
    Completion(CompletionError),
}

impl From<CompletionError> for ChatError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::MissingApiKey => ChatError::Config(err.to_string()),
            other => ChatError::Completion(other),
        }
    }
}

impl ChatError {
    pub fn bad_request(reason: impl Into<String>) -> Self {
        ChatError::BadRequest(reason.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ChatError::Config(_) | ChatError::Completion(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ChatError::BadRequest(reason) => (status, Json(json!({ "error": reason }))).into_response(),
            ChatError::Config(detail) => {
                error!(%detail, "Chat request failed on configuration");
                let body = ChatResponse::failure("Configuration error", GENERIC_ERROR_MESSAGE);
                (status, Json(body)).into_response()
            }
            ChatError::Completion(err) => {
                error!(error = %err, "Chat request failed");
                let body = ChatResponse::failure("Internal server error", GENERIC_ERROR_MESSAGE);
                (status, Json(body)).into_response()
            }
        }
    }
}
