//! [`ViewAdapter`] over a live DOM element holding a rendered message

use gloss_core::view::{MarkerId, SelectionRange, Serialized, MARKER_ATTR};
use gloss_core::ViewAdapter;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Node};

/// A boundary point: a DOM node and an offset inside it
#[derive(Debug, Clone)]
pub struct DomPoint {
    pub node: Node,
    pub offset: u32,
}

/// The element a message was rendered into
pub struct DomView {
    container: Element,
}

impl DomView {
    pub fn new(container: Element) -> Self {
        Self { container }
    }

    fn marker_selector(id: &MarkerId) -> String {
        format!(r#"[{MARKER_ATTR}="{id}"]"#)
    }

    fn try_insert(&self, at: &DomPoint, id: &MarkerId) -> Result<(), JsValue> {
        let document = self.container.owner_document().ok_or("No document")?;
        let marker = document.create_element("span")?;
        marker.set_attribute(MARKER_ATTR, id.as_str())?;

        let range = document.create_range()?;
        range.set_start(&at.node, at.offset)?;
        range.insert_node(&marker)?;
        Ok(())
    }

    fn try_unwrap(copy: &Element, class: &str) -> Result<(), JsValue> {
        let wrappers = copy.query_selector_all(&format!(".{class}"))?;
        for i in 0..wrappers.length() {
            let Some(wrapper) = wrappers.item(i) else {
                continue;
            };
            let Some(parent) = wrapper.parent_node() else {
                continue;
            };
            while let Some(child) = wrapper.first_child() {
                parent.insert_before(&child, Some(&wrapper))?;
            }
            parent.remove_child(&wrapper)?;
        }
        Ok(())
    }
}

fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

impl ViewAdapter for DomView {
    type Position = DomPoint;
    /// `None` when the browser refused to clone the container
    type Copy = Option<Element>;

    fn current_selection_range(&self) -> Option<SelectionRange<DomPoint>> {
        let selection = web_sys::window()?.get_selection().ok()??;
        if selection.range_count() == 0 {
            return None;
        }
        let range = selection.get_range_at(0).ok()?;

        let common = range.common_ancestor_container().ok()?;
        if !self.container.contains(Some(&common)) {
            return None;
        }

        Some(SelectionRange {
            start: DomPoint {
                node: range.start_container().ok()?,
                offset: range.start_offset().ok()?,
            },
            end: DomPoint {
                node: range.end_container().ok()?,
                offset: range.end_offset().ok()?,
            },
            collapsed: range.collapsed(),
        })
    }

    fn insert_marker(&mut self, at: &DomPoint, id: &MarkerId) {
        if let Err(e) = self.try_insert(at, id) {
            warn(&format!("marker {id} not inserted: {e:?}"));
        }
    }

    fn remove_marker(&mut self, id: &MarkerId) {
        match self.container.query_selector(&Self::marker_selector(id)) {
            Ok(Some(marker)) => marker.remove(),
            Ok(None) => {}
            Err(e) => warn(&format!("marker {id} lookup failed: {e:?}")),
        }
        // Re-merge the text nodes split by the insertion
        self.container.normalize();
    }

    fn detach(&self) -> Option<Element> {
        self.container
            .clone_node_with_deep(true)
            .ok()
            .and_then(|node| node.dyn_into::<Element>().ok())
    }

    fn unwrap_elements_by_class(&self, copy: &mut Option<Element>, class: &str) {
        if let Some(copy) = copy {
            if let Err(e) = Self::try_unwrap(copy, class) {
                warn(&format!("unwrapping .{class} failed: {e:?}"));
            }
        }
    }

    fn serialize(&self, copy: &Option<Element>) -> Serialized {
        match copy {
            Some(copy) => Serialized::from_marker_tokens(copy.inner_html()),
            None => Serialized::default(),
        }
    }
}
