//! Contract with the chat exchange endpoint.
//!
//! The engine never talks to a network itself. Front ends implement
//! [`ChatExchange`] (or drive [`SessionStore::prepare_submit`] and
//! [`SessionStore::complete_submit`] around their own async call).
//!
//! [`SessionStore::prepare_submit`]: crate::session::SessionStore::prepare_submit
//! [`SessionStore::complete_submit`]: crate::session::SessionStore::complete_submit

use serde::{Deserialize, Serialize};

use crate::error::ExchangeError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSubmitRequest {
    pub model_id: u32,
    pub prompt: String,
    #[serde(default)]
    pub sources_list: Vec<String>,
}

impl ChatSubmitRequest {
    /// The prompt as the model sees it, sources appended
    pub fn composed_prompt(&self) -> String {
        compose_prompt(&self.prompt, &self.sources_list)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSubmitResponse {
    pub model_id: u32,
    pub response_text: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl ChatSubmitResponse {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// A synchronous chat exchange
pub trait ChatExchange {
    fn submit(&mut self, request: &ChatSubmitRequest) -> Result<ChatSubmitResponse, ExchangeError>;
}

/// `"{prompt}\n\nSOURCES:\n{s1}\n\n{s2}..."`, or the bare prompt when the
/// joined sources are empty
pub fn compose_prompt(prompt: &str, sources: &[String]) -> String {
    let sources = sources.join("\n\n");
    if sources.is_empty() {
        prompt.to_string()
    } else {
        format!("{prompt}\n\nSOURCES:\n{sources}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_without_sources_is_unchanged() {
        assert_eq!(compose_prompt("Why?", &[]), "Why?");
    }

    #[test]
    fn sources_are_appended_in_order() {
        let sources = vec!["first answer".to_string(), "second answer".to_string()];
        assert_eq!(
            compose_prompt("Compare these", &sources),
            "Compare these\n\nSOURCES:\nfirst answer\n\nsecond answer"
        );
    }

    #[test]
    fn request_defaults_to_no_sources() {
        let request: ChatSubmitRequest =
            serde_json::from_str(r#"{ "model_id": 3, "prompt": "hi" }"#).unwrap();
        assert!(request.sources_list.is_empty());
        assert_eq!(request.composed_prompt(), "hi");
    }

    #[test]
    fn response_totals_tokens() {
        let response = ChatSubmitResponse {
            model_id: 1,
            response_text: "ok".into(),
            prompt_tokens: 12,
            completion_tokens: 30,
        };
        assert_eq!(response.total_tokens(), 42);
    }

    #[test]
    fn huge_token_counts_saturate() {
        let response = ChatSubmitResponse {
            model_id: 1,
            response_text: "ok".into(),
            prompt_tokens: u64::MAX - 1,
            completion_tokens: 5,
        };
        assert_eq!(response.total_tokens(), u64::MAX);
    }
}
