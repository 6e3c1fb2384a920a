use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Message, Role};

/// A conversation with one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub title: String,
    pub model_id: u32,
    pub pretty_name: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Set while a submission is outstanding
    #[serde(skip)]
    in_flight: bool,
    /// Indices of model messages ticked as context for the next prompt
    #[serde(skip)]
    sources: BTreeSet<usize>,
}

impl Chat {
    pub fn new(model_id: u32, pretty_name: impl Into<String>) -> Self {
        let now = Utc::now();
        let pretty_name = pretty_name.into();
        Self {
            id: Uuid::new_v4(),
            title: pretty_name.clone(),
            model_id,
            pretty_name,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            in_flight: false,
            sources: BTreeSet::new(),
        }
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Sum of reported token usage over all messages
    pub fn tokens_used(&self) -> u64 {
        self.messages.iter().filter_map(|m| m.tokens_used).sum()
    }

    pub fn highlight_count(&self) -> usize {
        self.messages.iter().map(|m| m.highlights.len()).sum()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Claim the submit gate. Returns false if a request is already outstanding.
    pub(crate) fn begin_submit(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub(crate) fn finish_submit(&mut self) {
        self.in_flight = false;
    }

    /// Tick or untick a model response as a prompt source.
    /// Returns the new ticked state, or None if the index is not a model message.
    pub fn toggle_source(&mut self, index: usize) -> Option<bool> {
        let message = self.messages.get(index)?;
        if message.role != Role::Model {
            return None;
        }
        if self.sources.remove(&index) {
            Some(false)
        } else {
            self.sources.insert(index);
            Some(true)
        }
    }

    pub fn is_source(&self, index: usize) -> bool {
        self.sources.contains(&index)
    }

    /// Contents of the ticked sources, in message order
    pub fn sources_list(&self) -> Vec<String> {
        self.sources
            .iter()
            .filter_map(|&i| self.messages.get(i))
            .map(|m| m.content.clone())
            .collect()
    }

    pub fn clear_sources(&mut self) {
        self.sources.clear();
    }

    /// Label shown next to a source checkbox ("Response #n")
    pub fn source_label(index: usize) -> String {
        format!("Response #{}", index.div_ceil(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chat() -> Chat {
        let mut chat = Chat::new(5, "Model C");
        chat.push_message(Message::user(5, "How is your day going?"));
        chat.push_message(Message::model(5, "My day is going fairly well.", Some(40)));
        chat.push_message(Message::user(5, "Can you help me with a math question?"));
        chat.push_message(Message::model(5, "I would love to help.", Some(25)));
        chat
    }

    #[test]
    fn tokens_sum_over_messages() {
        assert_eq!(sample_chat().tokens_used(), 65);
    }

    #[test]
    fn only_model_messages_can_be_sources() {
        let mut chat = sample_chat();
        assert_eq!(chat.toggle_source(0), None);
        assert_eq!(chat.toggle_source(3), Some(true));
        assert_eq!(chat.toggle_source(1), Some(true));
        assert_eq!(
            chat.sources_list(),
            vec!["My day is going fairly well.", "I would love to help."]
        );
        assert_eq!(chat.toggle_source(3), Some(false));
        assert_eq!(chat.sources_list().len(), 1);
    }

    #[test]
    fn source_labels_count_responses() {
        assert_eq!(Chat::source_label(1), "Response #1");
        assert_eq!(Chat::source_label(3), "Response #2");
    }

    #[test]
    fn submit_gate_is_exclusive() {
        let mut chat = sample_chat();
        assert!(chat.begin_submit());
        assert!(!chat.begin_submit());
        chat.finish_submit();
        assert!(chat.begin_submit());
    }
}
