//! Decides whether a query needs fresh, institution-specific facts from search.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::completion::{CompletionBackend, GenerationParams};
use crate::models::ChatMessage;
use crate::prompt::Persona;

const INSTITUTION_VOCABULARY: &[&str] = &[
    "gators",
    "admission",
    "enrollment",
    "tuition",
    "fees",
    "campus",
    "classes",
    "courses",
    "departments",
    "faculty",
    "professors",
    "library",
    "housing",
    "dormitory",
    "dining",
    "events",
    "clubs",
    "sports",
    "athletics",
    "parking",
    "transportation",
    "muni",
    "registration",
    "schedule",
    "grades",
    "transcript",
    "graduation",
    "degree",
    "major",
    "minor",
    "academic calendar",
    "semester",
    "financial aid",
    "scholarships",
    "student services",
    "health center",
    "counseling",
    "career center",
    "bookstore",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ClassifierMode {
    /// Fixed vocabulary lookup.
    #[default]
    Keyword,
    /// Ask the completion model for a JSON verdict.
    Model,
}

/// Keyword variant.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new(persona: &Persona) -> Self {
        let mut keywords = vec![
            persona.short_name.to_lowercase(),
            persona.name.to_lowercase(),
        ];
        // "San Francisco State University" also answers to "San Francisco State"
        if let Some(stem) = persona.name.strip_suffix(" University") {
            keywords.push(stem.to_lowercase());
        }
        keywords.extend(INSTITUTION_VOCABULARY.iter().map(|k| k.to_string()));
        Self { keywords }
    }

    pub fn requires_institution_info(&self, query: &str) -> bool {
        let lower = query.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

/// Verdict returned by the model variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchDecision {
    pub search: bool,
    #[serde(default)]
    pub explanation: String,
}

/// Reads the model's verdict. Falls back to the first brace-delimited span,
/// then to "no search".
pub fn parse_decision(reply: &str) -> SearchDecision {
    if let Ok(decision) = serde_json::from_str::<SearchDecision>(reply.trim()) {
        return decision;
    }

    let embedded = reply
        .find('{')
        .and_then(|start| reply.rfind('}').filter(|end| *end > start).map(|end| &reply[start..=end]));

    match embedded.map(|json| serde_json::from_str::<SearchDecision>(json)) {
        Some(Ok(decision)) => decision,
        _ => {
            debug!(%reply, "Classifier reply was not a JSON verdict");
            SearchDecision {
                search: false,
                explanation: "unparseable classifier reply".to_string(),
            }
        }
    }
}

fn classifier_prompt(persona: &Persona) -> String {
    format!(
        r#"You decide whether a question to the {name} ({short}) chatbot needs a live web search for current, {short}-specific facts (dates, fees, deadlines, locations, contacts, policies).
Reply with ONLY a JSON object and nothing else:
{{"search": true or false, "explanation": "one short sentence"}}"#,
        name = persona.name,
        short = persona.short_name,
    )
}

/// Model variant. Any failure means "no search".
pub async fn classify_with_model(
    backend: &dyn CompletionBackend,
    model: &str,
    persona: &Persona,
    query: &str,
) -> SearchDecision {
    let messages = [
        ChatMessage::system(classifier_prompt(persona)),
        ChatMessage::user(query),
    ];
    let params = GenerationParams {
        temperature: 0.0,
        max_tokens: 150,
    };

    match backend.complete(model, &messages, params).await {
        Ok(reply) => {
            let decision = parse_decision(&reply);
            debug!(search = decision.search, explanation = %decision.explanation, "Model classifier verdict");
            decision
        }
        Err(e) => {
            warn!(error = %e, "Search classifier call failed, continuing without search");
            SearchDecision::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionError;
    use async_trait::async_trait;

    #[test]
    fn test_keyword_matches_vocabulary_and_names() {
        let classifier = KeywordClassifier::new(&Persona::default());
        assert!(classifier.requires_institution_info("How much is TUITION this year?"));
        assert!(classifier.requires_institution_info("Is SFSU a good school?"));
        assert!(classifier.requires_institution_info("things to do at san francisco state"));
        assert!(classifier.requires_institution_info("When is the Academic Calendar posted?"));
        assert!(!classifier.requires_institution_info("Explain photosynthesis"));
    }

    #[test]
    fn test_keyword_uses_configured_persona() {
        let classifier = KeywordClassifier::new(&Persona::new("Example State University", "ESU"));
        assert!(classifier.requires_institution_info("what is esu known for"));
        assert!(classifier.requires_institution_info("example state rankings"));
        assert!(!classifier.requires_institution_info("what is sfsu known for"));
    }

    #[test]
    fn test_parse_strict_json() {
        assert_eq!(
            parse_decision(r#"{"search": true, "explanation": "needs dates"}"#),
            SearchDecision {
                search: true,
                explanation: "needs dates".to_string()
            }
        );
    }

    #[test]
    fn test_parse_embedded_json() {
        let reply = "Sure! Here is my answer:\n```json\n{\"search\": true, \"explanation\": \"fees change\"}\n```";
        assert!(parse_decision(reply).search);
    }

    #[test]
    fn test_parse_garbage_defaults_to_no_search() {
        for reply in ["yes, search it", "{not json}", "} backwards {", ""] {
            assert!(!parse_decision(reply).search, "reply {reply:?}");
        }
    }

    struct FixedReply(Result<&'static str, u16>);

    #[async_trait]
    impl CompletionBackend for FixedReply {
        async fn complete(
            &self,
            _model: &str,
            messages: &[ChatMessage],
            _params: GenerationParams,
        ) -> Result<String, CompletionError> {
            assert_eq!(messages.len(), 2);
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(CompletionError::Api {
                    status,
                    message: "boom".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_model_classifier_verdicts() {
        let persona = Persona::default();
        let yes = FixedReply(Ok(r#"{"search": true, "explanation": "deadline"}"#));
        assert!(classify_with_model(&yes, "m", &persona, "Fall deadline?").await.search);

        let failing = FixedReply(Err(500));
        assert!(!classify_with_model(&failing, "m", &persona, "Fall deadline?").await.search);
    }
}
