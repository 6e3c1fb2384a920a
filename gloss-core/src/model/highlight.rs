use serde::{Deserialize, Serialize};

use super::TextRange;

/// A highlighted span of a message with an optional comment.
///
/// Offsets index the message content as it was when the highlight was
/// committed. Field names follow the saved-chat wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Highlight {
    pub starting_index: usize,
    pub ending_index: usize,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Highlight {
    pub fn new(range: TextRange, comment: Option<String>) -> Self {
        Self {
            starting_index: range.start,
            ending_index: range.end,
            comment,
        }
    }

    pub fn range(&self) -> TextRange {
        TextRange {
            start: self.starting_index,
            end: self.ending_index,
        }
    }

    /// Comment text, treating a blank comment as absent
    pub fn comment_text(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.trim().is_empty())
    }
}
