//! Capability interface between the annotation engine and whatever displays
//! rendered messages (a DOM, a terminal buffer, a test fixture).

mod markup_view;

pub use markup_view::{Caret, MarkupView, TextRun};

use std::fmt;

use uuid::Uuid;

/// Attribute carried by marker elements in views that must serialize them as markup
pub const MARKER_ATTR: &str = "data-gloss-marker";

/// Identifier of a zero-width boundary marker
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerId(String);

impl MarkerId {
    /// Random id; collisions with content text are practically impossible
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Markup emitted for this marker by views that cannot track offsets
    pub fn token(&self) -> String {
        format!(r#"<span {MARKER_ATTR}="{}"></span>"#, self.0)
    }
}

impl Default for MarkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A selection as reported by the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRange<P> {
    pub start: P,
    pub end: P,
    pub collapsed: bool,
}

/// Where a marker ended up in serialized output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSpan {
    pub id: MarkerId,
    pub offset: usize,
    /// Bytes the marker itself occupies in `markup`
    pub len: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Serialized {
    pub markup: String,
    pub markers: Vec<MarkerSpan>,
}

impl Serialized {
    pub fn marker(&self, id: &MarkerId) -> Option<&MarkerSpan> {
        self.markers.iter().find(|m| &m.id == id)
    }

    /// Build from markup that still contains marker tokens, locating each
    /// `MarkerId::token()` occurrence exactly.
    pub fn from_marker_tokens(markup: String) -> Self {
        let prefix = format!(r#"<span {MARKER_ATTR}=""#);
        let mut markers = Vec::new();
        let mut search_from = 0;

        while let Some(found) = markup[search_from..].find(&prefix) {
            let offset = search_from + found;
            let id_start = offset + prefix.len();
            let Some(id_len) = markup[id_start..].find('"') else {
                break;
            };
            let id = MarkerId(markup[id_start..id_start + id_len].to_string());
            let token = id.token();
            if markup[offset..].starts_with(&token) {
                markers.push(MarkerSpan {
                    id,
                    offset,
                    len: token.len(),
                });
                search_from = offset + token.len();
            } else {
                search_from = id_start;
            }
        }

        Self { markup, markers }
    }
}

/// What the engine needs from a rendered message view.
///
/// Markers are inserted into the live view, a disposable copy is taken, and
/// the markers are removed again; everything else happens on the copy.
pub trait ViewAdapter {
    /// A point inside the view
    type Position;
    /// Disposable copy of the view's content
    type Copy;

    fn current_selection_range(&self) -> Option<SelectionRange<Self::Position>>;

    /// Insert an invisible zero-width marker. A marker that cannot be placed
    /// is simply absent from later serializations.
    fn insert_marker(&mut self, at: &Self::Position, id: &MarkerId);

    fn remove_marker(&mut self, id: &MarkerId);

    /// Deep copy of the current content, markers included
    fn detach(&self) -> Self::Copy;

    /// Replace every element with `class` by its children
    fn unwrap_elements_by_class(&self, copy: &mut Self::Copy, class: &str);

    fn serialize(&self, copy: &Self::Copy) -> Serialized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_tokens_are_located_exactly() {
        let a = MarkerId::new();
        let b = MarkerId::new();
        let markup = format!("ab{}cd{}ef", a.token(), b.token());
        let serialized = Serialized::from_marker_tokens(markup);

        let first = serialized.marker(&a).unwrap();
        let second = serialized.marker(&b).unwrap();
        assert_eq!(first.offset, 2);
        assert_eq!(first.len, a.token().len());
        assert_eq!(second.offset, 4 + a.token().len());
    }

    #[test]
    fn lookalike_attribute_text_is_not_a_marker() {
        let markup = format!(r#"<span {MARKER_ATTR}="x">kept</span>"#);
        let serialized = Serialized::from_marker_tokens(markup);
        assert!(serialized.markers.is_empty());
    }
}
