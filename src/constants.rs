// Defaults shared by the server, the collaborators and the terminal client.
// Anything deployment-specific is overridable through `config`.

pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.llama.com/compat/v1/";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-3.5-turbo";

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_SEARCH_MODEL: &str = "sonar";

pub const DEFAULT_INSTITUTION: &str = "San Francisco State University";
pub const DEFAULT_INSTITUTION_SHORT: &str = "SFSU";

/// Low temperature keeps answers factual and repeatable.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Conversation messages forwarded to the completion API after the system message.
pub const HISTORY_WINDOW: usize = 5;

/// Shortest trimmed query the validator accepts.
pub const MIN_QUERY_CHARS: usize = 3;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Shown whenever a request could not be answered.
pub const GENERIC_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";
