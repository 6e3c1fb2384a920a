use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_HIGHLIGHTS: usize = 10;
pub const DEFAULT_MAX_CHATS: usize = 4;
pub const DEFAULT_WRAPPER_CLASS: &str = "highlight";

/// Limits and naming used by the annotation engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Highlights allowed per message
    pub max_highlights_per_message: usize,
    /// Concurrent chats in a session
    pub max_chats: usize,
    /// CSS class of the rendered highlight wrapper
    pub wrapper_class: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_highlights_per_message: DEFAULT_MAX_HIGHLIGHTS,
            max_chats: DEFAULT_MAX_CHATS,
            wrapper_class: DEFAULT_WRAPPER_CLASS.to_string(),
        }
    }
}
