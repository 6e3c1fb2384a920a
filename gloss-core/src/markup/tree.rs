//! Lossless markup tree.
//!
//! Every node keeps the exact source text it was parsed from, so serializing
//! a parsed tree reproduces the input byte for byte. Offsets computed against
//! the serializer's output are therefore offsets into canonical content.

use super::token::{tokenize, Tag, TagKind, Token};
use crate::view::{MarkerId, MarkerSpan, Serialized};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Void tags, comments, doctypes and unmatched closing tags
    Raw(String),
    /// Zero-width boundary marker inserted during range resolution
    Marker(MarkerId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Opening tag as written
    pub open: String,
    /// Lowercased element name
    pub name: String,
    pub children: Vec<Node>,
    /// Closing tag as written; None when the source never closed the element
    pub close: Option<String>,
}

impl Element {
    pub fn tag(&self) -> Tag<'_> {
        Tag::new(&self.open)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.tag().has_class(class)
    }
}

/// Parse markup into a forest of nodes
pub fn parse(markup: &str) -> Vec<Node> {
    let mut root = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    for (_, token) in tokenize(markup) {
        match token {
            Token::Text(text) => attach(&mut stack, &mut root, Node::Text(text.to_string())),
            Token::Tag(tag) => match tag.kind() {
                TagKind::Open => stack.push(Element {
                    open: tag.raw().to_string(),
                    name: tag.name().unwrap_or_default().to_ascii_lowercase(),
                    children: Vec::new(),
                    close: None,
                }),
                TagKind::Close => {
                    let name = tag.name().unwrap_or_default().to_ascii_lowercase();
                    match stack.iter().rposition(|el| el.name == name) {
                        Some(depth) => {
                            // Elements left open inside the matched one end here unclosed
                            while stack.len() > depth + 1 {
                                if let Some(el) = stack.pop() {
                                    attach(&mut stack, &mut root, Node::Element(el));
                                }
                            }
                            if let Some(mut el) = stack.pop() {
                                el.close = Some(tag.raw().to_string());
                                attach(&mut stack, &mut root, Node::Element(el));
                            }
                        }
                        None => attach(&mut stack, &mut root, Node::Raw(tag.raw().to_string())),
                    }
                }
                TagKind::SelfClosing | TagKind::Other => {
                    attach(&mut stack, &mut root, Node::Raw(tag.raw().to_string()))
                }
            },
        }
    }

    while let Some(el) = stack.pop() {
        attach(&mut stack, &mut root, Node::Element(el));
    }
    root
}

fn attach(stack: &mut [Element], root: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => root.push(node),
    }
}

/// Serialize nodes, recording the offset of every marker as it is passed.
/// Markers emit no text.
pub fn serialize(nodes: &[Node]) -> Serialized {
    let mut out = Serialized::default();
    emit(nodes, &mut out);
    out
}

fn emit(nodes: &[Node], out: &mut Serialized) {
    for node in nodes {
        match node {
            Node::Text(text) | Node::Raw(text) => out.markup.push_str(text),
            Node::Element(el) => {
                out.markup.push_str(&el.open);
                emit(&el.children, out);
                if let Some(close) = &el.close {
                    out.markup.push_str(close);
                }
            }
            Node::Marker(id) => out.markers.push(MarkerSpan {
                id: id.clone(),
                offset: out.markup.len(),
                len: 0,
            }),
        }
    }
}

/// Replace every element carrying `class` by its children, at any depth
pub fn unwrap_class(nodes: &mut Vec<Node>, class: &str) {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        match node {
            Node::Element(mut el) => {
                unwrap_class(&mut el.children, class);
                if el.has_class(class) {
                    out.extend(el.children);
                } else {
                    out.push(Node::Element(el));
                }
            }
            other => out.push(other),
        }
    }
    *nodes = out;
}

/// Remove a marker anywhere in the forest. Returns true if one was removed.
pub fn remove_marker(nodes: &mut Vec<Node>, id: &MarkerId) -> bool {
    if let Some(index) = nodes
        .iter()
        .position(|n| matches!(n, Node::Marker(m) if m == id))
    {
        nodes.remove(index);
        merge_text(nodes);
        return true;
    }
    nodes.iter_mut().any(|node| match node {
        Node::Element(el) => remove_marker(&mut el.children, id),
        _ => false,
    })
}

/// Join adjacent text nodes split by marker insertion
fn merge_text(nodes: &mut Vec<Node>) {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        match (merged.last_mut(), node) {
            (Some(Node::Text(prev)), Node::Text(text)) => prev.push_str(&text),
            (_, node) => merged.push(node),
        }
    }
    *nodes = merged;
}

/// Location of a text node: child indices from the root down to it
pub(crate) type NodePath = Vec<usize>;

/// A text node together with its span in the visible text
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextSlot {
    pub path: NodePath,
    /// Visible-text offset of the node's first byte
    pub start: usize,
    pub len: usize,
}

impl TextSlot {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

pub(crate) fn text_slots(nodes: &[Node]) -> Vec<TextSlot> {
    let mut slots = Vec::new();
    let mut path = Vec::new();
    let mut pos = 0;
    collect_slots(nodes, &mut path, &mut pos, &mut slots);
    slots
}

fn collect_slots(nodes: &[Node], path: &mut NodePath, pos: &mut usize, out: &mut Vec<TextSlot>) {
    for (i, node) in nodes.iter().enumerate() {
        path.push(i);
        match node {
            Node::Text(text) => {
                out.push(TextSlot {
                    path: path.clone(),
                    start: *pos,
                    len: text.len(),
                });
                *pos += text.len();
            }
            Node::Element(el) => collect_slots(&el.children, path, pos, out),
            Node::Raw(_) | Node::Marker(_) => {}
        }
        path.pop();
    }
}

/// Sibling list and index holding the node at `path`
pub(crate) fn locate_mut<'a>(
    nodes: &'a mut Vec<Node>,
    path: &[usize],
) -> Option<(&'a mut Vec<Node>, usize)> {
    let (&last, parents) = path.split_last()?;
    let mut current = nodes;
    for &i in parents {
        match current.get_mut(i)? {
            Node::Element(el) => current = &mut el.children,
            _ => return None,
        }
    }
    (last < current.len()).then_some((current, last))
}

pub(crate) fn text_at<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a str> {
    let (&last, parents) = path.split_last()?;
    let mut current = nodes;
    for &i in parents {
        match current.get(i)? {
            Node::Element(el) => current = &el.children,
            _ => return None,
        }
    }
    match current.get(last)? {
        Node::Text(text) => Some(text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_is_lossless() {
        let sources = [
            "plain text",
            "<b>abc</b>def",
            "<p>one<br>two<img src=\"x.png\"/></p>\n<ul>\n<li>a</li>\n</ul>",
            "<p>unclosed <em>inner</p> tail",
            "stray </div> close and a < b",
            "<!-- note --><P CLASS=\"x\">Mixed</P>",
        ];
        for src in sources {
            assert_eq!(serialize(&parse(src)).markup, src, "round trip of {src:?}");
        }
    }

    #[test]
    fn builds_nested_elements() {
        let nodes = parse("<p>a<b>c</b></p>");
        let Node::Element(p) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(p.name, "p");
        assert_eq!(p.children.len(), 2);
        assert!(matches!(&p.children[1], Node::Element(b) if b.name == "b" && b.close.is_some()));
    }

    #[test]
    fn unwraps_matching_class_only() {
        let mut nodes = parse(
            r#"<p>a<span class="highlight">b</span><span class="other">c</span></p>"#,
        );
        unwrap_class(&mut nodes, "highlight");
        assert_eq!(
            serialize(&nodes).markup,
            r#"<p>ab<span class="other">c</span></p>"#
        );
    }

    #[test]
    fn text_slots_follow_document_order() {
        let nodes = parse("<p>ab<b>cd</b></p>ef");
        let slots = text_slots(&nodes);
        let spans: Vec<_> = slots.iter().map(|s| (s.path.clone(), s.start, s.len)).collect();
        assert_eq!(
            spans,
            vec![(vec![0, 0], 0, 2), (vec![0, 1, 0], 2, 2), (vec![1], 4, 2)]
        );
        assert_eq!(text_at(&nodes, &[0, 1, 0]), Some("cd"));
    }

    #[test]
    fn markers_are_recorded_without_text() {
        let id = MarkerId::new();
        let nodes = vec![
            Node::Text("ab".into()),
            Node::Marker(id.clone()),
            Node::Text("cd".into()),
        ];
        let out = serialize(&nodes);
        assert_eq!(out.markup, "abcd");
        assert_eq!(out.markers, vec![MarkerSpan { id, offset: 2, len: 0 }]);
    }

    #[test]
    fn removing_marker_merges_text() {
        let id = MarkerId::new();
        let mut nodes = parse("<p>x</p>");
        if let Node::Element(p) = &mut nodes[0] {
            p.children = vec![
                Node::Text("a".into()),
                Node::Marker(id.clone()),
                Node::Text("b".into()),
            ];
        }
        assert!(remove_marker(&mut nodes, &id));
        let Node::Element(p) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(p.children, vec![Node::Text("ab".into())]);
        assert!(!remove_marker(&mut nodes, &id));
    }
}
