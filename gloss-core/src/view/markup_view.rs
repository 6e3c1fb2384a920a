use tracing::warn;

use super::{MarkerId, SelectionRange, Serialized, ViewAdapter};
use crate::markup::tree::{self, locate_mut, text_at, text_slots, NodePath, TextSlot};
use crate::markup::Node;

/// A point inside one text node of a `MarkupView`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caret {
    path: NodePath,
    /// Byte offset within the text node
    offset: usize,
}

/// Which text node wins when an offset sits between two of them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bias {
    /// Start of the following node (selection starts)
    Forward,
    /// End of the preceding node (selection ends)
    Backward,
}

/// A run of visible text and the highlight wrapper enclosing it, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    /// Visible-text offset of the run's first byte
    pub start: usize,
    /// `data-index` of the enclosing wrapper
    pub highlight: Option<usize>,
}

/// In-memory view over rendered markup.
///
/// Selections are expressed in offsets of the view's visible text, the way a
/// terminal cursor sees it.
#[derive(Debug, Clone, Default)]
pub struct MarkupView {
    nodes: Vec<Node>,
    selection: Option<SelectionRange<Caret>>,
}

impl MarkupView {
    pub fn parse(markup: &str) -> Self {
        Self {
            nodes: tree::parse(markup),
            selection: None,
        }
    }

    /// Current markup of the live view (markers serialize as nothing)
    pub fn markup(&self) -> String {
        tree::serialize(&self.nodes).markup
    }

    pub fn text(&self) -> String {
        let mut text = String::new();
        for slot in text_slots(&self.nodes) {
            if let Some(t) = text_at(&self.nodes, &slot.path) {
                text.push_str(t);
            }
        }
        text
    }

    pub fn text_len(&self) -> usize {
        text_slots(&self.nodes).last().map(TextSlot::end).unwrap_or(0)
    }

    /// Select `[start, end)` of the visible text. Returns false if either
    /// end is out of range or not on a character boundary.
    pub fn select_text(&mut self, start: usize, end: usize) -> bool {
        let (start, end) = (start.min(end), start.max(end));
        let slots = text_slots(&self.nodes);

        let selection = if start == end {
            self.caret_at(&slots, start, Bias::Forward)
                .or_else(|| self.caret_at(&slots, start, Bias::Backward))
                .map(|caret| SelectionRange {
                    start: caret.clone(),
                    end: caret,
                    collapsed: true,
                })
        } else {
            match (
                self.caret_at(&slots, start, Bias::Forward),
                self.caret_at(&slots, end, Bias::Backward),
            ) {
                (Some(start), Some(end)) => Some(SelectionRange {
                    start,
                    end,
                    collapsed: false,
                }),
                _ => None,
            }
        };

        self.selection = selection;
        self.selection.is_some()
    }

    fn caret_at(&self, slots: &[TextSlot], offset: usize, bias: Bias) -> Option<Caret> {
        let slot = match bias {
            Bias::Forward => slots
                .iter()
                .find(|s| s.start <= offset && offset < s.end()),
            Bias::Backward => slots
                .iter()
                .find(|s| s.start < offset && offset <= s.end()),
        }?;
        let within = offset - slot.start;
        let text = text_at(&self.nodes, &slot.path)?;
        text.is_char_boundary(within).then(|| Caret {
            path: slot.path.clone(),
            offset: within,
        })
    }

    fn caret_is_valid(&self, caret: &Caret) -> bool {
        text_at(&self.nodes, &caret.path).is_some_and(|t| t.is_char_boundary(caret.offset))
    }

    /// Visible text split at wrapper boundaries, tagged with the wrapper's highlight index
    pub fn runs(&self, wrapper_class: &str) -> Vec<TextRun> {
        let mut runs = Vec::new();
        let mut pos = 0;
        collect_runs(&self.nodes, wrapper_class, None, &mut pos, &mut runs);
        runs
    }
}

fn collect_runs(
    nodes: &[Node],
    class: &str,
    highlight: Option<usize>,
    pos: &mut usize,
    out: &mut Vec<TextRun>,
) {
    for node in nodes {
        match node {
            Node::Text(text) if !text.is_empty() => {
                match out.last_mut() {
                    Some(run) if run.highlight == highlight && run.start + run.text.len() == *pos => {
                        run.text.push_str(text)
                    }
                    _ => out.push(TextRun {
                        text: text.clone(),
                        start: *pos,
                        highlight,
                    }),
                }
                *pos += text.len();
            }
            Node::Element(el) => {
                let inner = if el.has_class(class) {
                    el.tag()
                        .attr("data-index")
                        .and_then(|i| i.parse().ok())
                        .or(highlight)
                } else {
                    highlight
                };
                collect_runs(&el.children, class, inner, pos, out);
            }
            _ => {}
        }
    }
}

impl ViewAdapter for MarkupView {
    type Position = Caret;
    type Copy = Vec<Node>;

    fn current_selection_range(&self) -> Option<SelectionRange<Caret>> {
        let selection = self.selection.as_ref()?;
        (self.caret_is_valid(&selection.start) && self.caret_is_valid(&selection.end))
            .then(|| selection.clone())
    }

    fn insert_marker(&mut self, at: &Caret, id: &MarkerId) {
        let Some((siblings, index)) = locate_mut(&mut self.nodes, &at.path) else {
            warn!(marker = %id, "marker position no longer exists");
            return;
        };
        let Some(Node::Text(text)) = siblings.get_mut(index) else {
            warn!(marker = %id, "marker position is not a text node");
            return;
        };
        if !text.is_char_boundary(at.offset) {
            warn!(marker = %id, offset = at.offset, "marker offset splits a character");
            return;
        }
        let tail = text.split_off(at.offset);
        siblings.splice(
            index + 1..index + 1,
            [Node::Marker(id.clone()), Node::Text(tail)],
        );
    }

    fn remove_marker(&mut self, id: &MarkerId) {
        tree::remove_marker(&mut self.nodes, id);
    }

    fn detach(&self) -> Vec<Node> {
        self.nodes.clone()
    }

    fn unwrap_elements_by_class(&self, copy: &mut Vec<Node>, class: &str) {
        tree::unwrap_class(copy, class);
    }

    fn serialize(&self, copy: &Vec<Node>) -> Serialized {
        tree::serialize(copy)
    }
}
