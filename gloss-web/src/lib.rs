//! Gloss Web - WebAssembly bindings for the annotation engine
//!
//! The page renders messages with [`Workspace::render_message`], hands the
//! message element back on `mouseup`, and drives the authoring flow through
//! the methods below. Chat submission is split in two so the page can run
//! the network request itself.

use wasm_bindgen::prelude::*;

use gloss_core::{
    render, App, CancelReason, Chat, ChatSubmitRequest, ChatSubmitResponse, EngineConfig,
    ExchangeError, MessageRef, Outcome, SessionError,
};

pub mod dom;
pub mod io;

use dom::DomView;

const STORAGE_KEY: &str = "gloss-session";

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"Gloss WASM initialized".into());
    Ok(())
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Session state shared with the page
#[wasm_bindgen]
pub struct Workspace {
    app: App,
}

#[wasm_bindgen]
impl Workspace {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Workspace {
        Workspace {
            app: App::new(EngineConfig::default()),
        }
    }

    /// Replace the session with a save payload, session dump or bare history
    pub fn load(&mut self, json: &str) -> Result<usize, JsValue> {
        let chats = gloss_core::load_chats(json, self.app.config.max_highlights_per_message)
            .map_err(js_error)?;
        let count = chats.len();
        self.app.load_chats(chats);
        Ok(count)
    }

    /// Load the session saved by [`Self::persist`], if any
    pub fn restore(&mut self) -> Result<bool, JsValue> {
        let stored = io::load_session(STORAGE_KEY, self.app.config.max_highlights_per_message)?;
        match stored {
            Some(chats) => {
                self.app.load_chats(chats);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn persist(&self) -> Result<(), JsValue> {
        io::save_session(STORAGE_KEY, self.app.sessions.chats())
    }

    #[wasm_bindgen(js_name = addChat)]
    pub fn add_chat(&mut self, model_id: u32, pretty_name: String) -> Result<usize, JsValue> {
        if !self.app.add_chat(Chat::new(model_id, pretty_name)) {
            return Err(self.status_error());
        }
        Ok(self.app.sessions.len() - 1)
    }

    /// Make a chat active. Its ticked sources are cleared.
    #[wasm_bindgen(js_name = switchChat)]
    pub fn switch_chat(&mut self, index: usize) -> Result<(), JsValue> {
        self.app.switch_chat(index);
        match self.app.sessions.active_index() {
            Some(active) if active == index => Ok(()),
            _ => Err(self.status_error()),
        }
    }

    #[wasm_bindgen(js_name = chatCount)]
    pub fn chat_count(&self) -> usize {
        self.app.sessions.len()
    }

    #[wasm_bindgen(js_name = messageCount)]
    pub fn message_count(&self, chat: usize) -> usize {
        self.app
            .sessions
            .chat(chat)
            .map_or(0, |c| c.messages.len())
    }

    /// Message content with its highlights wrapped, ready for `innerHTML`
    #[wasm_bindgen(js_name = renderMessage)]
    pub fn render_message(&self, chat: usize, message: usize) -> Option<String> {
        let message = self.app.sessions.message(MessageRef::new(chat, message))?;
        Some(render(
            &message.content,
            &message.highlights,
            &self.app.config.wrapper_class,
        ))
    }

    /// Turn annotation mode on or off. Returns whether it is now on.
    #[wasm_bindgen(js_name = toggleAnnotationMode)]
    pub fn toggle_annotation_mode(&mut self) -> bool {
        self.app.authoring.toggle();
        self.app.authoring.is_active()
    }

    /// Capture the page selection inside `container` for a message.
    ///
    /// Returns the selected text when a highlight is pending and `undefined`
    /// when the selection was silently dropped. Limits are reported as errors.
    pub fn capture(
        &mut self,
        chat: usize,
        message: usize,
        container: web_sys::Element,
    ) -> Result<Option<String>, JsValue> {
        let mut view = DomView::new(container);
        let target = MessageRef::new(chat, message);
        let app = &mut self.app;
        let outcome = app
            .authoring
            .capture(&app.sessions, target, &mut view, &app.config);

        match outcome {
            Outcome::Pending => Ok(app.authoring.pending().map(|p| p.excerpt())),
            Outcome::Cancelled(reason) => cancelled(reason).map(|_| None),
            _ => Ok(None),
        }
    }

    /// Store the pending highlight. An empty comment is stored as none.
    pub fn commit(&mut self, comment: Option<String>) -> Result<bool, JsValue> {
        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let app = &mut self.app;
        match app.authoring.commit(&mut app.sessions, comment, &app.config) {
            Outcome::Committed(_) => Ok(true),
            Outcome::Cancelled(reason) => cancelled(reason).map(|_| false),
            _ => Ok(false),
        }
    }

    pub fn discard(&mut self) {
        self.app.authoring.discard();
    }

    /// Tick or untick a model response as a source for the next prompt
    #[wasm_bindgen(js_name = toggleSource)]
    pub fn toggle_source(&mut self, chat: usize, message: usize) -> Result<bool, JsValue> {
        self.app
            .sessions
            .chat_mut(chat)
            .and_then(|c| c.toggle_source(message))
            .ok_or_else(|| JsValue::from_str("Only model responses can be sources"))
    }

    /// Claim the chat's submit gate. Returns the request body to send.
    #[wasm_bindgen(js_name = prepareSubmit)]
    pub fn prepare_submit(&mut self, chat: usize, prompt: &str) -> Result<String, JsValue> {
        let request = self
            .app
            .sessions
            .prepare_submit(chat, prompt)
            .map_err(js_error)?;
        serde_json::to_string(&request).map_err(js_error)
    }

    /// Apply the exchange's response body for a request from [`Self::prepare_submit`]
    #[wasm_bindgen(js_name = completeSubmit)]
    pub fn complete_submit(
        &mut self,
        chat: usize,
        request: &str,
        response: &str,
    ) -> Result<usize, JsValue> {
        let request: ChatSubmitRequest = serde_json::from_str(request).map_err(js_error)?;
        let result = serde_json::from_str::<ChatSubmitResponse>(response)
            .map_err(|e| ExchangeError::Unavailable(e.to_string()));
        self.app
            .sessions
            .complete_submit(chat, &request, result)
            .map_err(js_error)?;
        Ok(self.message_count(chat))
    }

    /// Release the submit gate after a failed request
    #[wasm_bindgen(js_name = failSubmit)]
    pub fn fail_submit(&mut self, chat: usize, request: &str, reason: String) -> Result<(), JsValue> {
        let request: ChatSubmitRequest = serde_json::from_str(request).map_err(js_error)?;
        let result = self.app.sessions.complete_submit(
            chat,
            &request,
            Err(ExchangeError::Unavailable(reason)),
        );
        match result {
            Ok(_) | Err(SessionError::Exchange(_)) => Ok(()),
            Err(err) => Err(js_error(err)),
        }
    }

    /// Download the active chat's save payload. Returns the file name.
    pub fn export(&self, anonymous: bool) -> Result<String, JsValue> {
        let payload = self
            .app
            .export_payload(anonymous)
            .ok_or("No chat to export")?;
        io::download_save(&payload)
    }

    #[wasm_bindgen(js_name = mostCommonWord)]
    pub fn most_common_word(&self, chat: usize, message: usize) -> Option<String> {
        self.app
            .sessions
            .message(MessageRef::new(chat, message))
            .and_then(|m| gloss_core::stats::most_common_word(&m.content))
    }

    /// Tokens used by the active chat
    #[wasm_bindgen(js_name = chatTokens)]
    pub fn chat_tokens(&self) -> u64 {
        self.app.token_totals().chat
    }

    #[wasm_bindgen(js_name = sessionTokens)]
    pub fn session_tokens(&self) -> u64 {
        self.app.token_totals().session
    }
}

impl Workspace {
    fn status_error(&self) -> JsValue {
        JsValue::from_str(self.app.status_message.as_deref().unwrap_or("Request failed"))
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

fn cancelled(reason: CancelReason) -> Result<(), JsValue> {
    if reason.is_user_visible() {
        Err(JsValue::from_str(&reason.notice()))
    } else {
        Ok(())
    }
}
