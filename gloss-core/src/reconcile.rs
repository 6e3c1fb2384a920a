//! Fits a proposed range between existing highlights

use tracing::debug;

use crate::error::Rejection;
use crate::model::{Highlight, TextRange};

/// Trim `proposed` so it overlaps none of `existing`, or reject it.
///
/// A proposal that would swallow a whole highlight is rejected, since
/// nesting is not supported. A proposal that starts or ends inside a
/// highlight is clipped to that highlight's edge. `existing` must itself be
/// free of overlaps, which makes the result independent of its order.
pub fn reconcile(proposed: TextRange, existing: &[Highlight]) -> Result<TextRange, Rejection> {
    let TextRange { mut start, mut end } = proposed;

    for h in existing {
        let (h_start, h_end) = (h.starting_index, h.ending_index);
        if h_start >= start && h_end <= end {
            debug!(?proposed, existing = ?h.range(), "proposal encloses a highlight");
            return Err(Rejection::Encloses {
                proposed,
                existing: h.range(),
            });
        } else if h_start <= start && start < h_end {
            start = h_end;
        } else if h_start < end && end <= h_end {
            end = h_start;
        }
    }

    if start >= end {
        debug!(?proposed, "proposal fully covered by highlights");
        return Err(Rejection::Consumed);
    }
    Ok(TextRange { start, end })
}
