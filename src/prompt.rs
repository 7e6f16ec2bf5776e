//! Persona text and the message list sent to the completion API.

use crate::constants::{DEFAULT_INSTITUTION, DEFAULT_INSTITUTION_SHORT, HISTORY_WINDOW};
use crate::models::ChatMessage;

/// The institution the assistant speaks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub name: String,
    pub short_name: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: DEFAULT_INSTITUTION.to_string(),
            short_name: DEFAULT_INSTITUTION_SHORT.to_string(),
        }
    }
}

impl Persona {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_name: short_name.into(),
        }
    }

    pub fn system_prompt(&self) -> String {
        let short = &self.short_name;
        format!(
            r#"You are a helpful chatbot for {name} ({short}).
You can only answer questions about {short} and general educational topics.

IMPORTANT RULES:
1. Only provide information about {short} or general educational guidance
2. If you don't have specific information about {short}, explicitly say so
3. Never make up facts about {short} - always admit if you're unsure
4. If the user asks about non-{short} topics, politely redirect them to {short}-related questions
5. Be helpful, friendly, and informative
6. When you receive search results about {short}, use that information to provide accurate answers"#,
            name = self.name,
        )
    }

    /// Opening assistant message shown by the chat clients.
    pub fn greeting(&self) -> String {
        format!(
            "Hello! I'm the {short} Chatbot. I can help answer questions about {name}. What would you like to know?",
            short = self.short_name,
            name = self.name,
        )
    }
}

/// System message (optionally carrying search context) followed by the
/// trailing window of the conversation. Timestamps are not forwarded.
pub fn build_messages(
    persona: &Persona,
    history: &[ChatMessage],
    search_context: Option<&str>,
) -> Vec<ChatMessage> {
    let mut system = persona.system_prompt();
    if let Some(context) = search_context.filter(|c| !c.trim().is_empty()) {
        system.push_str(&format!(
            "\n\nHere is current information about {} related to the user's question:\n{}",
            persona.short_name, context
        ));
    }

    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut messages = Vec::with_capacity(1 + history.len() - start);
    messages.push(ChatMessage::system(system));
    messages.extend(
        history[start..]
            .iter()
            .map(|m| ChatMessage::new(m.role, m.content.clone())),
    );
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn history(len: usize) -> Vec<ChatMessage> {
        (0..len)
            .map(|i| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                ChatMessage::new(role, format!("turn {i}")).stamped()
            })
            .collect()
    }

    #[test]
    fn test_window_never_exceeds_system_plus_five() {
        let persona = Persona::default();
        for len in [1, 4, 5, 6, 11, 40] {
            let built = build_messages(&persona, &history(len), None);
            assert_eq!(built.len(), 1 + len.min(HISTORY_WINDOW), "history of {len}");
            assert_eq!(built[0].role, Role::System);
            assert_eq!(built.last().unwrap().content, format!("turn {}", len - 1));
        }
    }

    #[test]
    fn test_window_keeps_most_recent_in_order() {
        let built = build_messages(&Persona::default(), &history(8), None);
        let contents: Vec<_> = built[1..].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["turn 3", "turn 4", "turn 5", "turn 6", "turn 7"]);
        assert!(built.iter().all(|m| m.timestamp.is_none()));
    }

    #[test]
    fn test_search_context_extends_system_message() {
        let persona = Persona::default();
        let built = build_messages(&persona, &history(1), Some("Fall classes begin Aug 26."));
        assert!(built[0].content.starts_with(&persona.system_prompt()));
        assert!(built[0]
            .content
            .ends_with("related to the user's question:\nFall classes begin Aug 26."));

        let blank = build_messages(&persona, &history(1), Some("  "));
        assert_eq!(blank[0].content, persona.system_prompt());
    }

    #[test]
    fn test_persona_names_flow_into_prompt() {
        let persona = Persona::new("Example State University", "ESU");
        let prompt = persona.system_prompt();
        assert!(prompt.starts_with("You are a helpful chatbot for Example State University (ESU)."));
        assert!(prompt.contains("non-ESU topics"));
        assert!(persona.greeting().contains("ESU Chatbot"));
        assert!(!persona.greeting().contains('*'));
    }
}
