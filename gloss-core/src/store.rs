//! The only writer of message annotation state

use tracing::info;

use crate::error::StoreError;
use crate::model::{Highlight, Message, TextRange};

/// A reconciled range waiting to be committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub range: TextRange,
    pub normalized_content: String,
}

/// Replace the message content with its normalized form and append the
/// highlight. Every check here is a precondition that the resolver and
/// reconciler already guarantee; an error means a caller skipped them.
pub fn commit<'a>(
    message: &'a mut Message,
    accepted: Accepted,
    comment: Option<String>,
    limit: usize,
) -> Result<&'a Message, StoreError> {
    let Accepted {
        range,
        normalized_content,
    } = accepted;

    if range.start >= range.end || range.end > normalized_content.len() {
        return Err(StoreError::OutOfBounds {
            range,
            len: normalized_content.len(),
        });
    }
    if !normalized_content.is_char_boundary(range.start)
        || !normalized_content.is_char_boundary(range.end)
    {
        return Err(StoreError::NotCharBoundary(range));
    }
    if message.highlights.len() >= limit {
        return Err(StoreError::Full(message.highlights.len()));
    }
    if let Some(existing) = message
        .highlights
        .iter()
        .map(Highlight::range)
        .find(|h| h.overlaps(&range))
    {
        return Err(StoreError::Overlap {
            proposed: range,
            existing,
        });
    }

    let comment = comment.filter(|c| !c.trim().is_empty());
    message.content = normalized_content;
    message.highlights.push(Highlight::new(range, comment));
    info!(
        start = range.start,
        end = range.end,
        count = message.highlights.len(),
        "highlight committed"
    );
    Ok(message)
}
