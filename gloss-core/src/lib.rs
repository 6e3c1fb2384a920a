//! Gloss Core - Platform-agnostic annotation engine for chat transcripts
//!
//! This crate turns a selection in rendered, highlight-decorated message
//! markup into stable offsets over the canonical content, keeps highlights
//! non-overlapping, and renders them back. It's designed to work both in
//! native CLI and WASM environments; rendering surfaces plug in through
//! [`view::ViewAdapter`].

pub mod app;
pub mod authoring;
pub mod config;
pub mod cursor;
pub mod error;
pub mod exchange;
pub mod export;
pub mod markup;
pub mod model;
pub mod reconcile;
pub mod render;
pub mod resolver;
pub mod session;
pub mod stats;
pub mod store;
pub mod view;

pub use app::{App, Focus, Mode};
pub use authoring::{Authoring, AuthoringState, CancelReason, Outcome, PendingAnnotation};
pub use config::EngineConfig;
pub use cursor::CursorState;
pub use error::{ExchangeError, Rejection, ResolveError, SessionError, StoreError};
pub use exchange::{compose_prompt, ChatExchange, ChatSubmitRequest, ChatSubmitResponse};
pub use export::{load_chats, slugify, ChatHistory, HistoryMessage, SaveRequest};
pub use model::{Chat, Highlight, Message, Role, TextRange};
pub use reconcile::reconcile;
pub use render::render;
pub use resolver::{resolve, Resolution};
pub use session::{MessageRef, SessionStore};
pub use store::Accepted;
pub use view::{MarkupView, ViewAdapter};
