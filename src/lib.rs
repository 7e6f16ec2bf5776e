pub mod chat;
pub mod classifier;
pub mod client;
pub mod completion;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod prompt;
pub mod search;
pub mod transcript;
pub mod validator;
pub mod web_server;

pub use chat::ChatService;
pub use error::ChatError;
pub use models::{ChatMessage, ChatRequest, ChatResponse, Role, SearchResult};
