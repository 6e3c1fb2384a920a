//! Markup handling for message content.
//!
//! Content is treated as a flat sequence of tags and text runs. Nothing here
//! ever rewrites source bytes: offsets into content stay valid across a
//! parse/serialize round trip.

pub mod token;
pub mod tree;

pub use token::{tokenize, Tag, TagKind, Token};
pub use tree::{parse, serialize, unwrap_class, Element, Node};

use crate::model::TextRange;

/// Text content with all tags dropped
pub fn visible_text(markup: &str) -> String {
    tokenize(markup)
        .filter_map(|(_, token)| match token {
            Token::Text(text) => Some(text),
            Token::Tag(_) => None,
        })
        .collect()
}

/// Map a markup offset to the matching offset in `visible_text(markup)`.
/// Offsets inside a tag map to the position just before that tag.
pub fn visible_offset(markup: &str, offset: usize) -> usize {
    let mut visible = 0;
    for (start, token) in tokenize(markup) {
        if start >= offset {
            break;
        }
        if let Token::Text(text) = token {
            visible += text.len().min(offset - start);
        }
    }
    visible
}

/// Byte ranges occupied by tags
pub fn tag_ranges(markup: &str) -> Vec<TextRange> {
    tokenize(markup)
        .filter_map(|(start, token)| match token {
            Token::Tag(tag) => Some(TextRange::new(start, start + tag.raw().len())),
            Token::Text(_) => None,
        })
        .collect()
}

/// True if `offset` falls strictly inside a tag
pub fn splits_tag(tags: &[TextRange], offset: usize) -> bool {
    tags.iter().any(|t| t.start < offset && offset < t.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_text_drops_tags() {
        assert_eq!(visible_text("<p>Hello <b>bold</b> world</p>"), "Hello bold world");
    }

    #[test]
    fn visible_offset_skips_tags() {
        let markup = "<b>abc</b>def";
        assert_eq!(visible_offset(markup, 0), 0);
        assert_eq!(visible_offset(markup, 3), 0);
        assert_eq!(visible_offset(markup, 5), 2);
        assert_eq!(visible_offset(markup, 10), 3);
        assert_eq!(visible_offset(markup, 11), 4);
        assert_eq!(visible_offset(markup, 1), 0);
    }

    #[test]
    fn detects_offsets_inside_tags() {
        let tags = tag_ranges("<b>abc</b>def");
        assert!(splits_tag(&tags, 1));
        assert!(!splits_tag(&tags, 3));
        assert!(splits_tag(&tags, 8));
        assert!(!splits_tag(&tags, 10));
    }
}
