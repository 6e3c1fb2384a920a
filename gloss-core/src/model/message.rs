use serde::{Deserialize, Deserializer, Serialize};

use super::Highlight;

/// Author of a message. Encoded on the wire as `0` (user) or `1` (model).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Model => "Model",
        }
    }
}

impl TryFrom<u8> for Role {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Role::User),
            1 => Ok(Role::Model),
            other => Err(format!("unknown role {other}, expected 0 (user) or 1 (model)")),
        }
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        match role {
            Role::User => 0,
            Role::Model => 1,
        }
    }
}

/// One message of a chat: canonical markup plus its highlights
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub model_id: u32,
    /// Canonical markup. Never contains highlight wrapper markup.
    pub content: String,
    #[serde(default)]
    pub tokens_used: Option<u64>,
    /// Creation order, not offset order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub highlights: Vec<Highlight>,
}

impl Message {
    pub fn user(model_id: u32, content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            model_id,
            content: content.into(),
            tokens_used: None,
            highlights: Vec::new(),
        }
    }

    pub fn model(model_id: u32, content: impl Into<String>, tokens_used: Option<u64>) -> Self {
        Self {
            role: Role::Model,
            model_id,
            content: content.into(),
            tokens_used,
            highlights: Vec::new(),
        }
    }

    /// Get highlights sorted by start offset
    pub fn highlights_sorted(&self) -> Vec<(usize, &Highlight)> {
        let mut sorted: Vec<_> = self.highlights.iter().enumerate().collect();
        sorted.sort_by_key(|(_, h)| h.starting_index);
        sorted
    }

    /// Content covered by a highlight, if its offsets still fit the content
    pub fn highlighted_markup(&self, highlight: &Highlight) -> Option<&str> {
        self.content
            .get(highlight.starting_index..highlight.ending_index)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Highlight>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Highlight>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_uses_numeric_wire_values() {
        assert_eq!(serde_json::to_string(&Role::Model).unwrap(), "1");
        let role: Role = serde_json::from_str("0").unwrap();
        assert_eq!(role, Role::User);
        assert!(serde_json::from_str::<Role>("2").is_err());
    }

    #[test]
    fn null_highlights_deserialize_as_empty() {
        let json = r#"{
            "role": 0,
            "model_id": 2,
            "content": "What is the meaning of life?",
            "tokens_used": null,
            "highlights": null
        }"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert!(message.highlights.is_empty());
        assert_eq!(message.tokens_used, None);
    }

    #[test]
    fn highlights_sorted_keeps_creation_index() {
        let mut message = Message::model(2, "abcdefghij", Some(12));
        message.highlights.push(Highlight {
            starting_index: 6,
            ending_index: 8,
            comment: None,
        });
        message.highlights.push(Highlight {
            starting_index: 1,
            ending_index: 3,
            comment: None,
        });

        let sorted = message.highlights_sorted();
        assert_eq!(sorted[0].0, 1);
        assert_eq!(sorted[1].0, 0);
        assert_eq!(message.highlighted_markup(sorted[0].1), Some("bc"));
    }
}
