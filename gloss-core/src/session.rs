//! Session state: the open chats and which one is active.
//!
//! Everything the front ends would otherwise keep in globals lives here and
//! is passed by reference to whoever needs it.

use tracing::{info, warn};

use crate::config::{EngineConfig, DEFAULT_MAX_CHATS};
use crate::error::{ExchangeError, SessionError, StoreError};
use crate::exchange::{ChatExchange, ChatSubmitRequest, ChatSubmitResponse};
use crate::model::{Chat, Message};
use crate::store::{self, Accepted};

/// Address of one message inside a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat: usize,
    pub message: usize,
}

impl MessageRef {
    pub fn new(chat: usize, message: usize) -> Self {
        Self { chat, message }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    chats: Vec<Chat>,
    active: Option<usize>,
    max_chats: usize,
}

impl SessionStore {
    pub fn new(max_chats: usize) -> Self {
        Self {
            chats: Vec::new(),
            active: None,
            max_chats,
        }
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self::new(config.max_chats)
    }

    /// Build a session around chats loaded from disk. Chats beyond the cap
    /// are dropped with a warning.
    pub fn from_chats(mut chats: Vec<Chat>, max_chats: usize) -> Self {
        if chats.len() > max_chats {
            warn!(
                loaded = chats.len(),
                max_chats, "dropping chats beyond the session limit"
            );
            chats.truncate(max_chats);
        }
        let active = (!chats.is_empty()).then_some(0);
        Self {
            chats,
            active,
            max_chats,
        }
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    pub fn max_chats(&self) -> usize {
        self.max_chats
    }

    pub fn is_full(&self) -> bool {
        self.chats.len() >= self.max_chats
    }

    /// Open a chat and make it active. Returns its index.
    pub fn add_chat(&mut self, chat: Chat) -> Result<usize, SessionError> {
        if self.is_full() {
            warn!(max_chats = self.max_chats, "chat limit reached");
            return Err(SessionError::ChatLimit(self.max_chats));
        }
        self.chats.push(chat);
        let index = self.chats.len() - 1;
        self.switch_chat(index)?;
        info!(index, "chat added");
        Ok(index)
    }

    /// Make `index` the active chat. Its source selection starts empty.
    pub fn switch_chat(&mut self, index: usize) -> Result<(), SessionError> {
        let chat = self
            .chats
            .get_mut(index)
            .ok_or(SessionError::UnknownChat(index))?;
        chat.clear_sources();
        self.active = Some(index);
        Ok(())
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_chat(&self) -> Option<&Chat> {
        self.chats.get(self.active?)
    }

    pub fn active_chat_mut(&mut self) -> Option<&mut Chat> {
        self.chats.get_mut(self.active?)
    }

    pub fn chat(&self, index: usize) -> Option<&Chat> {
        self.chats.get(index)
    }

    pub fn chat_mut(&mut self, index: usize) -> Option<&mut Chat> {
        self.chats.get_mut(index)
    }

    pub fn message(&self, target: MessageRef) -> Option<&Message> {
        self.chats.get(target.chat)?.messages.get(target.message)
    }

    /// Commit an accepted highlight to the addressed message
    pub fn commit(
        &mut self,
        target: MessageRef,
        accepted: Accepted,
        comment: Option<String>,
        limit: usize,
    ) -> Result<&Message, StoreError> {
        let chat = self
            .chats
            .get_mut(target.chat)
            .ok_or(StoreError::UnknownMessage(target))?;
        let message = chat
            .messages
            .get_mut(target.message)
            .ok_or(StoreError::UnknownMessage(target))?;
        store::commit(message, accepted, comment, limit)?;
        chat.touch();
        chat.messages
            .get(target.message)
            .ok_or(StoreError::UnknownMessage(target))
    }

    /// Claim the chat's submit gate and build the request to send.
    ///
    /// Every successful call must be followed by [`Self::complete_submit`]
    /// for the same chat, or the chat stays locked.
    pub fn prepare_submit(
        &mut self,
        chat_index: usize,
        prompt: &str,
    ) -> Result<ChatSubmitRequest, SessionError> {
        let chat = self
            .chats
            .get_mut(chat_index)
            .ok_or(SessionError::UnknownChat(chat_index))?;
        if !chat.begin_submit() {
            return Err(SessionError::InFlight);
        }
        Ok(ChatSubmitRequest {
            model_id: chat.model_id,
            prompt: prompt.to_string(),
            sources_list: chat.sources_list(),
        })
    }

    /// Release the submit gate and apply the exchange result. On failure
    /// no message is touched.
    pub fn complete_submit(
        &mut self,
        chat_index: usize,
        request: &ChatSubmitRequest,
        result: Result<ChatSubmitResponse, ExchangeError>,
    ) -> Result<&Message, SessionError> {
        let chat = self
            .chats
            .get_mut(chat_index)
            .ok_or(SessionError::UnknownChat(chat_index))?;
        chat.finish_submit();

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(chat = chat_index, %err, "chat exchange failed");
                return Err(err.into());
            }
        };

        let tokens = response.total_tokens();
        chat.push_message(Message::user(request.model_id, request.prompt.clone()));
        chat.push_message(Message::model(
            response.model_id,
            response.response_text,
            Some(tokens),
        ));
        chat.clear_sources();
        info!(chat = chat_index, tokens, "exchange completed");

        chat.messages
            .last()
            .ok_or(SessionError::UnknownChat(chat_index))
    }

    /// Run a full submission through a synchronous exchange
    pub fn submit<E: ChatExchange>(
        &mut self,
        chat_index: usize,
        prompt: &str,
        exchange: &mut E,
    ) -> Result<&Message, SessionError> {
        let request = self.prepare_submit(chat_index, prompt)?;
        let result = exchange.submit(&request);
        self.complete_submit(chat_index, &request, result)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHATS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextRange;

    /// Exchange that replays canned results and records what it was sent
    struct Scripted {
        results: Vec<Result<ChatSubmitResponse, ExchangeError>>,
        seen: Vec<ChatSubmitRequest>,
    }

    impl Scripted {
        fn new(results: Vec<Result<ChatSubmitResponse, ExchangeError>>) -> Self {
            Self {
                results,
                seen: Vec::new(),
            }
        }
    }

    impl ChatExchange for Scripted {
        fn submit(&mut self, request: &ChatSubmitRequest) -> Result<ChatSubmitResponse, ExchangeError> {
            self.seen.push(request.clone());
            self.results.remove(0)
        }
    }

    fn reply(text: &str) -> Result<ChatSubmitResponse, ExchangeError> {
        Ok(ChatSubmitResponse {
            model_id: 2,
            response_text: text.to_string(),
            prompt_tokens: 10,
            completion_tokens: 15,
        })
    }

    #[test]
    fn fifth_chat_is_refused() {
        let mut session = SessionStore::default();
        for i in 0..4 {
            assert_eq!(session.add_chat(Chat::new(i, format!("Model {i}"))), Ok(i as usize));
        }
        assert_eq!(session.active_index(), Some(3));
        assert_eq!(
            session.add_chat(Chat::new(9, "Model Z")),
            Err(SessionError::ChatLimit(4))
        );
        assert_eq!(session.len(), 4);
    }

    #[test]
    fn switching_to_missing_chat_fails() {
        let mut session = SessionStore::default();
        session.add_chat(Chat::new(1, "Model A")).unwrap();
        assert_eq!(session.switch_chat(3), Err(SessionError::UnknownChat(3)));
        assert_eq!(session.active_index(), Some(0));
    }

    #[test]
    fn submit_appends_user_and_model_messages() {
        let mut session = SessionStore::default();
        session.add_chat(Chat::new(2, "Model B")).unwrap();
        let mut exchange = Scripted::new(vec![reply("first"), reply("second")]);

        session.submit(0, "hello", &mut exchange).unwrap();
        session.chat_mut(0).unwrap().toggle_source(1);
        let message = session.submit(0, "again", &mut exchange).unwrap();
        assert_eq!(message.content, "second");
        assert_eq!(message.tokens_used, Some(25));

        let chat = session.chat(0).unwrap();
        assert_eq!(chat.messages.len(), 4);
        assert_eq!(chat.messages[2].content, "again");
        assert_eq!(chat.tokens_used(), 50);
        assert!(chat.sources_list().is_empty());
        assert_eq!(exchange.seen[1].sources_list, vec!["first"]);
    }

    #[test]
    fn failed_exchange_changes_nothing() {
        let mut session = SessionStore::default();
        session.add_chat(Chat::new(2, "Model B")).unwrap();
        let mut exchange = Scripted::new(vec![Err(ExchangeError::RateLimited(
            "Daily token limit reached.".into(),
        ))]);

        let err = session.submit(0, "hello", &mut exchange).unwrap_err();
        assert!(matches!(err, SessionError::Exchange(ExchangeError::RateLimited(_))));
        let chat = session.chat(0).unwrap();
        assert!(chat.messages.is_empty());
        assert!(!chat.is_in_flight());
    }

    #[test]
    fn second_submission_waits_for_the_first() {
        let mut session = SessionStore::default();
        session.add_chat(Chat::new(2, "Model B")).unwrap();

        let request = session.prepare_submit(0, "hello").unwrap();
        assert_eq!(
            session.prepare_submit(0, "again"),
            Err(SessionError::InFlight)
        );
        session.complete_submit(0, &request, reply("hi")).unwrap();
        assert!(session.prepare_submit(0, "again").is_ok());
    }

    #[test]
    fn commit_to_missing_message_is_an_invariant_violation() {
        let mut session = SessionStore::default();
        session.add_chat(Chat::new(2, "Model B")).unwrap();
        let target = MessageRef::new(0, 5);
        let err = session
            .commit(
                target,
                Accepted {
                    range: TextRange::new(0, 1),
                    normalized_content: "a".into(),
                },
                None,
                10,
            )
            .unwrap_err();
        assert_eq!(err, StoreError::UnknownMessage(target));
    }

    #[test]
    fn loaded_chats_are_capped() {
        let chats = (0..6).map(|i| Chat::new(i, "Model")).collect();
        let session = SessionStore::from_chats(chats, 4);
        assert_eq!(session.len(), 4);
        assert_eq!(session.active_index(), Some(0));
    }
}
