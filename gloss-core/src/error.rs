//! Error types for the annotation pipeline and session handling

use thiserror::Error;

use crate::model::TextRange;
use crate::session::MessageRef;

/// Why a selection could not be mapped back to canonical offsets
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no selection inside the message view")]
    NoSelection,

    #[error("selection is collapsed")]
    Collapsed,

    #[error("boundary marker {0} not found after serialization")]
    MarkerMissing(&'static str),

    #[error("boundary markers serialized out of order")]
    MarkersOutOfOrder,
}

/// A proposed range that cannot coexist with existing highlights
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("proposed range {proposed:?} would enclose highlight {existing:?}")]
    Encloses {
        proposed: TextRange,
        existing: TextRange,
    },

    /// Nothing visible is left once the range is clipped to its neighbours
    #[error("proposed range is fully covered by existing highlights")]
    Consumed,
}

/// Store preconditions. Reaching one of these means upstream validation is broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no message at {0:?}")]
    UnknownMessage(MessageRef),

    #[error("range {range:?} is outside content of length {len}")]
    OutOfBounds { range: TextRange, len: usize },

    #[error("range {0:?} does not fall on character boundaries")]
    NotCharBoundary(TextRange),

    #[error("range {proposed:?} overlaps stored highlight {existing:?}")]
    Overlap {
        proposed: TextRange,
        existing: TextRange,
    },

    #[error("message already holds {0} highlights")]
    Full(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("maximum limit of {0} conversations reached")]
    ChatLimit(usize),

    #[error("no chat at index {0}")]
    UnknownChat(usize),

    #[error("a request is already in flight for this chat")]
    InFlight,

    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

/// Failure reported by the chat exchange endpoint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("exchange rejected the request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("exchange unavailable: {0}")]
    Unavailable(String),
}
