//! The annotation authoring flow as an explicit state machine.
//!
//! ```text
//! IDLE --toggle--> SELECTING --capture ok--> PENDING --commit--> COMMITTED --> IDLE
//!                       |                       |
//!                       +--capture failed-------+--discard/toggle--> CANCELLED --> IDLE
//! ```
//!
//! COMMITTED and CANCELLED are transient: they are reported as an
//! [`Outcome`] and the machine is back in IDLE when the call returns.
//! No failure in the pipeline escapes as a panic.

use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::{Rejection, ResolveError, StoreError};
use crate::markup;
use crate::reconcile::reconcile;
use crate::resolver::resolve;
use crate::session::{MessageRef, SessionStore};
use crate::store::Accepted;
use crate::view::ViewAdapter;

/// A resolved and reconciled range waiting for its comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAnnotation {
    pub target: MessageRef,
    pub accepted: Accepted,
}

impl PendingAnnotation {
    /// Markup covered by the pending range
    pub fn selected_markup(&self) -> &str {
        let range = self.accepted.range;
        self.accepted
            .normalized_content
            .get(range.start..range.end)
            .unwrap_or_default()
    }

    /// Visible text covered by the pending range
    pub fn excerpt(&self) -> String {
        markup::visible_text(self.selected_markup())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthoringState {
    #[default]
    Idle,
    Selecting,
    Pending(PendingAnnotation),
}

/// Why an authoring attempt ended without a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// Annotation mode was switched off mid-flow
    ModeOff,
    /// The pending annotation was dropped by the user
    Discarded,
    Unresolved(ResolveError),
    Rejected(Rejection),
    CapacityExceeded { limit: usize },
    /// The store refused the commit; this is a bug upstream
    StoreFault(StoreError),
}

impl CancelReason {
    /// Whether the user should be told. Resolution failures and rejections are silent.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            CancelReason::CapacityExceeded { .. } | CancelReason::StoreFault(_)
        )
    }

    pub fn notice(&self) -> String {
        match self {
            CancelReason::ModeOff => "Annotation mode off".to_string(),
            CancelReason::Discarded => "Highlight discarded".to_string(),
            CancelReason::Unresolved(err) => format!("Selection not usable: {err}"),
            CancelReason::Rejected(rejection) => format!("Highlight rejected: {rejection}"),
            CancelReason::CapacityExceeded { limit } => {
                format!("A message can hold at most {limit} highlights")
            }
            CancelReason::StoreFault(err) => format!("Could not save highlight: {err}"),
        }
    }
}

/// Result of driving the machine one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Selecting,
    Pending,
    Committed(MessageRef),
    Cancelled(CancelReason),
    /// The event has no meaning in the current state
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct Authoring {
    state: AuthoringState,
}

impl Authoring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AuthoringState {
        &self.state
    }

    /// Annotation mode is on while the machine is outside IDLE
    pub fn is_active(&self) -> bool {
        self.state != AuthoringState::Idle
    }

    pub fn pending(&self) -> Option<&PendingAnnotation> {
        match &self.state {
            AuthoringState::Pending(pending) => Some(pending),
            _ => None,
        }
    }

    /// Switch annotation mode. Turning it off from any non-idle state cancels.
    pub fn toggle(&mut self) -> Outcome {
        match self.state {
            AuthoringState::Idle => {
                self.state = AuthoringState::Selecting;
                Outcome::Selecting
            }
            _ => self.cancel(CancelReason::ModeOff),
        }
    }

    /// Resolve and reconcile the view's selection over `target`.
    ///
    /// The capacity check runs first, so a full message never touches the view.
    pub fn capture<V: ViewAdapter>(
        &mut self,
        sessions: &SessionStore,
        target: MessageRef,
        view: &mut V,
        config: &EngineConfig,
    ) -> Outcome {
        if self.state != AuthoringState::Selecting {
            return Outcome::Ignored;
        }

        let Some(message) = sessions.message(target) else {
            error!(?target, "capture on a message that does not exist");
            return self.cancel(CancelReason::StoreFault(StoreError::UnknownMessage(target)));
        };

        let limit = config.max_highlights_per_message;
        if message.highlights.len() >= limit {
            warn!(?target, limit, "highlight limit reached");
            return self.cancel(CancelReason::CapacityExceeded { limit });
        }

        let resolution = match resolve(view, &config.wrapper_class) {
            Ok(resolution) => resolution,
            Err(err) => {
                debug!(%err, "selection did not resolve");
                return self.cancel(CancelReason::Unresolved(err));
            }
        };

        let range = match reconcile(resolution.range, &message.highlights) {
            Ok(range) => range,
            Err(rejection) => {
                info!(%rejection, "selection rejected");
                return self.cancel(CancelReason::Rejected(rejection));
            }
        };

        let covered = resolution
            .normalized_content
            .get(range.start..range.end)
            .unwrap_or_default();
        if markup::visible_text(covered).is_empty() {
            info!(?range, "clipped selection holds only markup");
            return self.cancel(CancelReason::Rejected(Rejection::Consumed));
        }

        debug!(?target, ?range, "highlight pending");
        self.state = AuthoringState::Pending(PendingAnnotation {
            target,
            accepted: Accepted {
                range,
                normalized_content: resolution.normalized_content,
            },
        });
        Outcome::Pending
    }

    /// Store the pending annotation with its comment
    pub fn commit(
        &mut self,
        sessions: &mut SessionStore,
        comment: Option<String>,
        config: &EngineConfig,
    ) -> Outcome {
        let pending = match std::mem::take(&mut self.state) {
            AuthoringState::Pending(pending) => pending,
            other => {
                self.state = other;
                return Outcome::Ignored;
            }
        };

        let target = pending.target;
        match sessions.commit(
            target,
            pending.accepted,
            comment,
            config.max_highlights_per_message,
        ) {
            Ok(_) => Outcome::Committed(target),
            Err(err) => {
                error!(?target, %err, "store refused a reconciled highlight");
                Outcome::Cancelled(CancelReason::StoreFault(err))
            }
        }
    }

    /// Drop whatever is in progress
    pub fn discard(&mut self) -> Outcome {
        match self.state {
            AuthoringState::Idle => Outcome::Ignored,
            _ => self.cancel(CancelReason::Discarded),
        }
    }

    fn cancel(&mut self, reason: CancelReason) -> Outcome {
        self.state = AuthoringState::Idle;
        Outcome::Cancelled(reason)
    }
}
