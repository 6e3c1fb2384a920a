//! Save payload import/export.
//!
//! A saved chat is `{ title, anonymous, history: { model_id, pretty_name,
//! messages: [{ role, content, highlights }] } }`. A whole session is a list
//! of saved chats. Either shape, a list of bare histories, or a single bare
//! history can be loaded back.
//!
//! Highlight offsets on the wire count UTF-16 code units, the way browser
//! string indices do. In memory they are byte offsets into `content`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{Chat, Highlight, Message, Role, TextRange};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub title: String,
    #[serde(default)]
    pub anonymous: bool,
    pub history: ChatHistory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistory {
    pub model_id: u32,
    #[serde(default)]
    pub pretty_name: Option<String>,
    pub messages: Vec<HistoryMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub highlights: Option<Vec<Highlight>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
}

impl SaveRequest {
    pub fn from_chat(chat: &Chat, anonymous: bool) -> Self {
        Self {
            title: chat.title.clone(),
            anonymous,
            history: ChatHistory::from(chat),
        }
    }

    pub fn into_chat(self) -> Chat {
        let mut chat = Chat::from(self.history);
        chat.title = self.title;
        chat
    }
}

impl From<&Chat> for ChatHistory {
    fn from(chat: &Chat) -> Self {
        Self {
            model_id: chat.model_id,
            pretty_name: Some(chat.pretty_name.clone()),
            messages: chat
                .messages
                .iter()
                .map(|m| HistoryMessage {
                    role: m.role,
                    content: m.content.clone(),
                    highlights: Some(highlights_to_wire(&m.content, &m.highlights)),
                    tokens_used: m.tokens_used,
                })
                .collect(),
        }
    }
}

impl From<ChatHistory> for Chat {
    fn from(history: ChatHistory) -> Self {
        let pretty_name = history
            .pretty_name
            .unwrap_or_else(|| format!("Model {}", history.model_id));
        let mut chat = Chat::new(history.model_id, pretty_name);
        chat.messages = history
            .messages
            .into_iter()
            .map(|m| Message {
                role: m.role,
                model_id: history.model_id,
                highlights: highlights_from_wire(&m.content, m.highlights.unwrap_or_default()),
                content: m.content,
                tokens_used: m.tokens_used,
            })
            .collect();
        chat
    }
}

fn highlights_to_wire(content: &str, highlights: &[Highlight]) -> Vec<Highlight> {
    highlights
        .iter()
        .filter_map(|h| match h.range().to_utf16(content) {
            Some(range) => Some(Highlight::new(range, h.comment.clone())),
            None => {
                warn!(range = ?h.range(), "highlight is off a char boundary, not exported");
                None
            }
        })
        .collect()
}

fn highlights_from_wire(content: &str, highlights: Vec<Highlight>) -> Vec<Highlight> {
    highlights
        .into_iter()
        .filter_map(|h| {
            let converted = (h.starting_index < h.ending_index)
                .then(|| TextRange::from_utf16(h.range(), content))
                .flatten();
            match converted {
                Some(range) => Some(Highlight::new(range, h.comment)),
                None => {
                    warn!(range = ?h.range(), "stored highlight does not fit its content");
                    None
                }
            }
        })
        .collect()
}

/// Anything a save file may hold
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SavedChats {
    Save(SaveRequest),
    Session(Vec<SaveRequest>),
    Histories(Vec<ChatHistory>),
    History(ChatHistory),
}

/// Parse a save payload, a session dump, or a single history.
///
/// Stored highlights that break the message invariants are dropped (see
/// [`sanitize_highlights`]).
pub fn load_chats(json: &str, max_highlights: usize) -> serde_json::Result<Vec<Chat>> {
    let mut chats = match serde_json::from_str(json)? {
        SavedChats::Save(save) => vec![save.into_chat()],
        SavedChats::Session(saves) => saves.into_iter().map(SaveRequest::into_chat).collect(),
        SavedChats::Histories(histories) => histories.into_iter().map(Chat::from).collect(),
        SavedChats::History(history) => vec![Chat::from(history)],
    };
    for chat in &mut chats {
        for message in &mut chat.messages {
            sanitize_highlights(message, max_highlights);
        }
    }
    Ok(chats)
}

pub fn to_json(save: &SaveRequest) -> serde_json::Result<String> {
    serde_json::to_string_pretty(save)
}

/// Session dump: every chat as a save payload, titles included
pub fn session_to_json(chats: &[Chat]) -> serde_json::Result<String> {
    let saves: Vec<SaveRequest> = chats
        .iter()
        .map(|chat| SaveRequest::from_chat(chat, false))
        .collect();
    serde_json::to_string_pretty(&saves)
}

/// Keep, in creation order, only highlights that fit the content, sit on
/// character boundaries, overlap no earlier highlight and fit under `limit`.
/// Returns how many were dropped.
pub fn sanitize_highlights(message: &mut Message, limit: usize) -> usize {
    let before = message.highlights.len();
    let content = &message.content;
    let mut kept: Vec<Highlight> = Vec::with_capacity(before.min(limit));

    for highlight in message.highlights.drain(..) {
        let range = highlight.range();
        let fits = highlight.starting_index < highlight.ending_index
            && content.get(range.start..range.end).is_some();
        let clear = kept.iter().all(|k| !k.range().overlaps(&range));
        if fits && clear && kept.len() < limit {
            kept.push(highlight);
        } else {
            warn!(?range, len = content.len(), "dropping invalid stored highlight");
        }
    }

    message.highlights = kept;
    before - message.highlights.len()
}

/// URL-safe name for a chat title: lowercase, runs of anything outside
/// `[a-z0-9-]` collapsed to `-`, edges trimmed. Falls back to `"chat"`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_run = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            slug.push(c);
            in_run = false;
        } else if !in_run {
            slug.push('-');
            in_run = true;
        }
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "chat".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextRange;

    const SAVED: &str = r#"{
        "title": "Do LLMs dream?",
        "anonymous": true,
        "history": {
            "model_id": 4,
            "pretty_name": "Model D",
            "messages": [
                { "role": 0, "content": "Do you dream?", "highlights": null },
                {
                    "role": 1,
                    "content": "<p>I do not <b>sleep</b>.</p>",
                    "highlights": [
                        { "starting_index": 3, "ending_index": 7, "comment": "hedge" },
                        { "starting_index": 5, "ending_index": 9, "comment": null },
                        { "starting_index": 0, "ending_index": 99 }
                    ]
                }
            ]
        }
    }"#;

    #[test]
    fn save_request_loads_and_drops_bad_highlights() {
        let chats = load_chats(SAVED, 10).unwrap();
        assert_eq!(chats.len(), 1);
        let chat = &chats[0];
        assert_eq!(chat.title, "Do LLMs dream?");
        assert_eq!(chat.pretty_name, "Model D");
        assert!(chat.messages[0].highlights.is_empty());
        assert_eq!(chat.messages[1].role, Role::Model);
        assert_eq!(
            chat.messages[1].highlights,
            vec![Highlight::new(TextRange::new(3, 7), Some("hedge".into()))]
        );
    }

    #[test]
    fn session_dump_loads_every_history() {
        let mut a = Chat::new(1, "Model A");
        a.push_message(Message::model(1, "alpha", Some(3)));
        let b = Chat::new(2, "Model B");

        let json = session_to_json(&[a, b]).unwrap();
        let chats = load_chats(&json, 10).unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].messages[0].tokens_used, Some(3));
        assert_eq!(chats[1].model_id, 2);
    }

    #[test]
    fn session_dump_keeps_titles() {
        let mut chat = Chat::new(1, "Model A");
        chat.title = "Consciousness".into();
        let json = session_to_json(&[chat]).unwrap();
        let chats = load_chats(&json, 10).unwrap();
        assert_eq!(chats[0].title, "Consciousness");
        assert_eq!(chats[0].pretty_name, "Model A");
    }

    #[test]
    fn list_of_bare_histories_still_loads() {
        let json = r#"[{ "model_id": 1, "messages": [] }, { "model_id": 2, "messages": [] }]"#;
        let chats = load_chats(json, 10).unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[1].pretty_name, "Model 2");
    }

    #[test]
    fn wire_offsets_count_utf16_units() {
        let json = r#"{
            "model_id": 2,
            "messages": [{
                "role": 1,
                "content": "café <b>crème</b>",
                "highlights": [{ "starting_index": 8, "ending_index": 13, "comment": "rich" }]
            }]
        }"#;
        let chats = load_chats(json, 10).unwrap();
        let message = &chats[0].messages[0];
        assert_eq!(message.highlights.len(), 1);
        assert_eq!(message.highlighted_markup(&message.highlights[0]), Some("crème"));

        let rendered = crate::render(&message.content, &message.highlights, "highlight");
        assert!(rendered.contains(r#"data-index="0""#));
        assert!(rendered.contains(">crème</span>"));

        // Exporting turns the byte offsets back into the same UTF-16 indices
        let exported = to_json(&SaveRequest::from_chat(&chats[0], false)).unwrap();
        assert!(exported.contains(r#""starting_index": 8"#));
        assert!(exported.contains(r#""ending_index": 13"#));
        assert_eq!(load_chats(&exported, 10).unwrap()[0].messages[0].highlights, message.highlights);
    }

    #[test]
    fn reversed_or_split_wire_offsets_are_dropped() {
        let json = r#"{
            "model_id": 2,
            "messages": [{
                "role": 1,
                "content": "a🙂b",
                "highlights": [
                    { "starting_index": 3, "ending_index": 1 },
                    { "starting_index": 2, "ending_index": 4 }
                ]
            }]
        }"#;
        let chats = load_chats(json, 10).unwrap();
        assert!(chats[0].messages[0].highlights.is_empty());
    }

    #[test]
    fn truncated_json_is_an_error() {
        assert!(load_chats(r#"[{ "title": "Half", "history": "#, 10).is_err());
        assert!(load_chats(r#"{ "colour": "red" }"#, 10).is_err());
    }

    #[test]
    fn bare_history_gets_a_default_name() {
        let json = r#"{ "model_id": 7, "messages": [] }"#;
        let chats = load_chats(json, 10).unwrap();
        assert_eq!(chats[0].pretty_name, "Model 7");
    }

    #[test]
    fn exported_payload_uses_wire_field_names() {
        let mut chat = Chat::new(3, "Model C");
        chat.title = "Ethics".into();
        chat.push_message(Message::user(3, "Is lying wrong?"));
        let json = to_json(&SaveRequest::from_chat(&chat, false)).unwrap();

        assert!(json.contains(r#""title": "Ethics""#));
        assert!(json.contains(r#""anonymous": false"#));
        assert!(json.contains(r#""role": 0"#));
        assert!(json.contains(r#""highlights": []"#));
        assert!(!json.contains("tokens_used"));
    }

    #[test]
    fn sanitize_enforces_the_limit() {
        let mut message = Message::model(1, "abcdefghij", None);
        for i in 0..5 {
            message
                .highlights
                .push(Highlight::new(TextRange::new(i * 2, i * 2 + 1), None));
        }
        assert_eq!(sanitize_highlights(&mut message, 3), 2);
        assert_eq!(message.highlights.len(), 3);
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Do LLMs dream?"), "do-llms-dream");
        assert_eq!(slugify("  a - b  "), "a---b");
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
        assert_eq!(slugify("???"), "chat");
    }
}
