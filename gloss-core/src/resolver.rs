//! Maps a selection in a rendered (decorated) view back to offsets in
//! canonical content.

use tracing::debug;

use crate::error::ResolveError;
use crate::model::TextRange;
use crate::view::{MarkerId, ViewAdapter};

/// Offsets of a selection plus the content they index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub range: TextRange,
    /// The view's content with wrappers and markers stripped
    pub normalized_content: String,
}

/// Resolve the view's current selection.
///
/// Leaves the live view as it was found: markers are removed again before
/// this returns, whatever the outcome.
pub fn resolve<V: ViewAdapter>(view: &mut V, wrapper_class: &str) -> Result<Resolution, ResolveError> {
    let selection = view
        .current_selection_range()
        .ok_or(ResolveError::NoSelection)?;
    if selection.collapsed {
        return Err(ResolveError::Collapsed);
    }

    let start_id = MarkerId::new();
    let end_id = MarkerId::new();

    // End first, so inserting the start marker cannot shift the end position
    view.insert_marker(&selection.end, &end_id);
    view.insert_marker(&selection.start, &start_id);
    let mut copy = view.detach();
    view.remove_marker(&start_id);
    view.remove_marker(&end_id);

    view.unwrap_elements_by_class(&mut copy, wrapper_class);
    let serialized = view.serialize(&copy);

    let first = serialized
        .marker(&start_id)
        .ok_or(ResolveError::MarkerMissing("start"))?;
    let second = serialized
        .marker(&end_id)
        .ok_or(ResolveError::MarkerMissing("end"))?;
    if second.offset < first.offset + first.len {
        return Err(ResolveError::MarkersOutOfOrder);
    }

    let start = first.offset;
    // The start marker is still in the string when the end marker is measured
    let end = second.offset - first.len;
    if start >= end {
        return Err(ResolveError::Collapsed);
    }

    let markup = &serialized.markup;
    let mut normalized = String::with_capacity(markup.len());
    normalized.push_str(&markup[..first.offset]);
    normalized.push_str(&markup[first.offset + first.len..second.offset]);
    normalized.push_str(&markup[second.offset + second.len..]);

    debug!(start, end, "resolved selection");
    Ok(Resolution {
        range: TextRange { start, end },
        normalized_content: normalized,
    })
}
