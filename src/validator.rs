//! Screens user queries before any upstream call is made.

use crate::constants::MIN_QUERY_CHARS;
use crate::prompt::Persona;

const DISALLOWED_KEYWORDS: &[&str] = &[
    "porn",
    "sex",
    "drugs",
    "violence",
    "hate",
    "racism",
    "how to cheat",
    "homework answers",
    "exam answers",
    "illegal",
    "hack",
    "break into",
    "password",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Rejected { reason: String },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }
}

#[derive(Debug, Clone)]
pub struct QueryValidator {
    disallowed: Vec<String>,
    min_chars: usize,
    topic_refusal: String,
    too_short_refusal: String,
}

impl QueryValidator {
    pub fn new(persona: &Persona) -> Self {
        Self {
            disallowed: DISALLOWED_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            min_chars: MIN_QUERY_CHARS,
            topic_refusal: format!(
                "I can only help with general questions about {}. Please ask something related to the university.",
                persona.short_name
            ),
            too_short_refusal: format!(
                "Please provide a more specific question about {}.",
                persona.short_name
            ),
        }
    }

    /// Disallowed topics are checked first, then the minimum length.
    pub fn validate(&self, query: &str) -> Validation {
        let normalized = query.trim().to_lowercase();

        if self
            .disallowed
            .iter()
            .any(|keyword| normalized.contains(keyword.as_str()))
        {
            return Validation::Rejected {
                reason: self.topic_refusal.clone(),
            };
        }

        if normalized.chars().count() < self.min_chars {
            return Validation::Rejected {
                reason: self.too_short_refusal.clone(),
            };
        }

        Validation::Valid
    }
}
