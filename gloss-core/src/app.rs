use crate::authoring::{Authoring, AuthoringState, CancelReason, Outcome};
use crate::config::EngineConfig;
use crate::cursor::CursorState;
use crate::export::SaveRequest;
use crate::markup;
use crate::model::{Chat, Highlight, Message};
use crate::render::render;
use crate::session::{MessageRef, SessionStore};
use crate::stats::{self, TokenTotals};
use crate::view::MarkupView;

/// Application mode, derived from the authoring state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Annotation mode on, selection follows the cursor
    Annotate,
    /// A highlight is pending and the comment dialog is open
    Comment,
    Help,
}

/// Focus area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Editor,
    Sidebar,
}

/// Platform-agnostic application state
pub struct App {
    pub sessions: SessionStore,
    pub authoring: Authoring,
    pub config: EngineConfig,
    pub cursor: CursorState,
    pub focus: Focus,
    pub running: bool,

    /// Index of the displayed message in the active chat
    pub message_index: usize,
    /// Visible-text offset where the selection started
    pub selection_anchor: Option<usize>,

    // Sidebar state
    pub sidebar_selected: usize,

    // Comment dialog
    pub input_buffer: String,

    pub status_message: Option<String>,
    pub show_help: bool,
}

impl App {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            sessions: SessionStore::with_config(&config),
            authoring: Authoring::new(),
            config,
            cursor: CursorState::new(),
            focus: Focus::Editor,
            running: true,

            message_index: 0,
            selection_anchor: None,

            sidebar_selected: 0,

            input_buffer: String::new(),

            status_message: None,
            show_help: false,
        }
    }

    pub fn load_chats(&mut self, chats: Vec<Chat>) {
        self.sessions = SessionStore::from_chats(chats, self.config.max_chats);
        self.authoring = Authoring::new();
        self.show_message(0);
    }

    pub fn mode(&self) -> Mode {
        if self.show_help {
            return Mode::Help;
        }
        match self.authoring.state() {
            AuthoringState::Idle => Mode::Normal,
            AuthoringState::Selecting => Mode::Annotate,
            AuthoringState::Pending(_) => Mode::Comment,
        }
    }

    pub fn current_ref(&self) -> Option<MessageRef> {
        let chat = self.sessions.active_index()?;
        let target = MessageRef::new(chat, self.message_index);
        self.sessions.message(target).map(|_| target)
    }

    pub fn current_message(&self) -> Option<&Message> {
        self.sessions.message(self.current_ref()?)
    }

    /// Current message with its highlights applied
    pub fn rendered_current(&self) -> Option<String> {
        let message = self.current_message()?;
        Some(render(
            &message.content,
            &message.highlights,
            &self.config.wrapper_class,
        ))
    }

    pub fn current_view(&self) -> Option<MarkupView> {
        self.rendered_current().map(|markup| MarkupView::parse(&markup))
    }

    fn show_message(&mut self, index: usize) {
        if self.authoring.is_active() {
            self.authoring.discard();
        }
        self.message_index = index;
        self.selection_anchor = None;
        self.sidebar_selected = 0;
        let text = self
            .current_message()
            .map(|m| markup::visible_text(&m.content))
            .unwrap_or_default();
        self.cursor.set_content(&text);
    }

    pub fn next_message(&mut self) {
        let count = self.sessions.active_chat().map_or(0, |c| c.messages.len());
        if self.message_index + 1 < count {
            self.show_message(self.message_index + 1);
        }
    }

    pub fn prev_message(&mut self) {
        if self.message_index > 0 {
            self.show_message(self.message_index - 1);
        }
    }

    pub fn switch_chat(&mut self, index: usize) {
        match self.sessions.switch_chat(index) {
            Ok(()) => {
                self.show_message(0);
                self.clear_status();
            }
            Err(err) => self.set_status(&err.to_string()),
        }
    }

    pub fn add_chat(&mut self, chat: Chat) -> bool {
        match self.sessions.add_chat(chat) {
            Ok(_) => {
                self.show_message(0);
                true
            }
            Err(err) => {
                self.set_status(&err.to_string());
                false
            }
        }
    }

    // Cursor movement methods
    pub fn move_up(&mut self) {
        self.cursor.move_up();
    }

    pub fn move_down(&mut self) {
        self.cursor.move_down();
    }

    pub fn move_left(&mut self) {
        self.cursor.move_left();
    }

    pub fn move_right(&mut self) {
        self.cursor.move_right();
    }

    pub fn move_to_top(&mut self) {
        self.cursor.move_to_top();
    }

    pub fn move_to_bottom(&mut self) {
        self.cursor.move_to_bottom();
    }

    pub fn move_word_forward(&mut self) {
        self.cursor.move_word_forward();
    }

    pub fn move_word_back(&mut self) {
        self.cursor.move_word_back();
    }

    /// Switch annotation mode on or off
    pub fn toggle_annotation_mode(&mut self) {
        match self.authoring.toggle() {
            Outcome::Selecting => {
                self.selection_anchor = Some(self.cursor.offset());
                self.set_status("Annotation mode: move to select, 'a' to highlight");
            }
            Outcome::Cancelled(reason) => self.cancelled(reason),
            _ => {}
        }
    }

    /// Selection in visible-text offsets, while annotation mode is on
    pub fn get_selection_range(&self) -> Option<(usize, usize)> {
        if self.mode() != Mode::Annotate {
            return None;
        }
        let anchor = self.selection_anchor?;
        let cursor = self.cursor.offset();
        Some((anchor.min(cursor), anchor.max(cursor)))
    }

    /// Resolve the current selection into a pending highlight
    pub fn annotate_selection(&mut self) {
        if self.mode() != Mode::Annotate {
            return;
        }
        let (Some(target), Some(mut view)) = (self.current_ref(), self.current_view()) else {
            return;
        };
        if let Some((start, end)) = self.get_selection_range() {
            view.select_text(start, end);
        }

        match self
            .authoring
            .capture(&self.sessions, target, &mut view, &self.config)
        {
            Outcome::Pending => {
                self.selection_anchor = None;
                self.input_buffer.clear();
                self.set_status("Comment (optional), Enter to save, Esc to discard");
            }
            Outcome::Cancelled(reason) => self.cancelled(reason),
            _ => {}
        }
    }

    /// Commit the pending highlight with the typed comment
    pub fn complete_annotation(&mut self) -> bool {
        let comment = Some(self.input_buffer.trim().to_string()).filter(|c| !c.is_empty());
        match self
            .authoring
            .commit(&mut self.sessions, comment, &self.config)
        {
            Outcome::Committed(_) => {
                self.input_buffer.clear();
                self.set_status("Highlight saved");
                true
            }
            Outcome::Cancelled(reason) => {
                self.cancelled(reason);
                false
            }
            _ => false,
        }
    }

    /// Drop the pending highlight or leave annotation mode
    pub fn cancel_annotation(&mut self) {
        if let Outcome::Cancelled(reason) = self.authoring.discard() {
            self.cancelled(reason);
        }
    }

    fn cancelled(&mut self, reason: CancelReason) {
        self.selection_anchor = None;
        self.input_buffer.clear();
        match reason {
            CancelReason::Unresolved(_) | CancelReason::Rejected(_) => self.clear_status(),
            other => self.set_status(&other.notice()),
        }
    }

    /// Highlights of the current message sorted by start
    pub fn highlights_sorted(&self) -> Vec<(usize, &Highlight)> {
        self.current_message()
            .map(Message::highlights_sorted)
            .unwrap_or_default()
    }

    pub fn selected_highlight(&self) -> Option<(usize, &Highlight)> {
        self.highlights_sorted().get(self.sidebar_selected).copied()
    }

    fn jump_to_selected_highlight(&mut self) {
        let offset = match (self.current_message(), self.selected_highlight()) {
            (Some(message), Some((_, h))) => markup::visible_offset(&message.content, h.starting_index),
            _ => return,
        };
        self.cursor.set_cursor_offset(offset);
    }

    pub fn next_highlight(&mut self) {
        let count = self.current_message().map_or(0, |m| m.highlights.len());
        if count > 0 {
            self.sidebar_selected = (self.sidebar_selected + 1) % count;
            self.jump_to_selected_highlight();
        }
    }

    pub fn prev_highlight(&mut self) {
        let count = self.current_message().map_or(0, |m| m.highlights.len());
        if count > 0 {
            self.sidebar_selected = if self.sidebar_selected == 0 {
                count - 1
            } else {
                self.sidebar_selected - 1
            };
            self.jump_to_selected_highlight();
        }
    }

    /// Tick or untick the current message as a prompt source
    pub fn toggle_source(&mut self) {
        let index = self.message_index;
        let Some(chat) = self.sessions.active_chat_mut() else {
            return;
        };
        match chat.toggle_source(index) {
            Some(true) => self.set_status(&format!("{} added to sources", Chat::source_label(index))),
            Some(false) => self.set_status(&format!("{} removed from sources", Chat::source_label(index))),
            None => self.set_status("Only model responses can be sources"),
        }
    }

    pub fn most_common_word(&self) -> Option<String> {
        self.current_message()
            .and_then(|m| stats::most_common_word(&m.content))
    }

    pub fn token_totals(&self) -> TokenTotals {
        stats::token_totals(self.sessions.active_chat(), self.sessions.chats())
    }

    /// Save payload for the active chat
    pub fn export_payload(&self, anonymous: bool) -> Option<SaveRequest> {
        self.sessions
            .active_chat()
            .map(|chat| SaveRequest::from_chat(chat, anonymous))
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status_message = Some(msg.to_string());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Editor => Focus::Sidebar,
            Focus::Sidebar => Focus::Editor,
        };
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Get title for display
    pub fn title(&self) -> String {
        self.sessions
            .active_chat()
            .map(|c| c.title.clone())
            .unwrap_or_else(|| "Untitled".to_string())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextRange;

    fn app_with(content: &str) -> App {
        let mut chat = Chat::new(1, "Model A");
        chat.title = "Foxes".into();
        chat.push_message(Message::user(1, "Tell me about foxes"));
        chat.push_message(Message::model(1, content, Some(12)));
        let mut app = App::default();
        app.load_chats(vec![chat]);
        app.next_message();
        app
    }

    fn select(app: &mut App, start: usize, end: usize) {
        app.cursor.set_cursor_offset(start);
        app.toggle_annotation_mode();
        app.cursor.set_cursor_offset(end);
    }

    #[test]
    fn highlight_flow_through_modes() {
        let mut app = app_with("<p>The quick <b>brown</b> fox</p>");
        assert_eq!(app.mode(), Mode::Normal);

        select(&mut app, 4, 15);
        assert_eq!(app.mode(), Mode::Annotate);
        assert_eq!(app.get_selection_range(), Some((4, 15)));

        app.annotate_selection();
        assert_eq!(app.mode(), Mode::Comment);
        app.input_buffer = "  vivid  ".into();
        assert!(app.complete_annotation());
        assert_eq!(app.mode(), Mode::Normal);

        let message = app.current_message().unwrap();
        assert_eq!(message.highlights[0].range(), TextRange::new(7, 21));
        assert_eq!(message.highlights[0].comment.as_deref(), Some("vivid"));
        assert!(app.rendered_current().unwrap().contains(r#"data-comment="vivid""#));
    }

    #[test]
    fn escape_discards_pending_highlight() {
        let mut app = app_with("abcdef");
        select(&mut app, 1, 4);
        app.annotate_selection();
        app.cancel_annotation();
        assert_eq!(app.mode(), Mode::Normal);
        assert!(app.current_message().unwrap().highlights.is_empty());
    }

    #[test]
    fn full_message_shows_notice_and_leaves_mode() {
        let mut app = app_with("abcdefghijklmnopqrstuvwxyz");
        for i in 0..10 {
            select(&mut app, 2 * i, 2 * i + 1);
            app.annotate_selection();
            assert!(app.complete_annotation());
        }

        select(&mut app, 22, 24);
        app.annotate_selection();
        assert_eq!(app.mode(), Mode::Normal);
        assert_eq!(
            app.status_message.as_deref(),
            Some("A message can hold at most 10 highlights")
        );
        assert_eq!(app.current_message().unwrap().highlights.len(), 10);
    }

    #[test]
    fn sidebar_navigation_moves_cursor_to_highlight() {
        let mut app = app_with("<p>one two three</p>");
        select(&mut app, 8, 13);
        app.annotate_selection();
        app.complete_annotation();
        select(&mut app, 0, 3);
        app.annotate_selection();
        app.complete_annotation();

        app.sidebar_selected = 1;
        app.next_highlight();
        assert_eq!(app.sidebar_selected, 0);
        assert_eq!(app.cursor.offset(), 0);
        app.next_highlight();
        assert_eq!(app.cursor.offset(), 8);
    }

    #[test]
    fn switching_to_missing_chat_reports_it() {
        let mut app = app_with("abc");
        app.switch_chat(3);
        assert_eq!(app.status_message.as_deref(), Some("no chat at index 3"));
        assert_eq!(app.title(), "Foxes");
    }

    #[test]
    fn user_messages_cannot_be_sources() {
        let mut app = app_with("abc");
        app.toggle_source();
        assert_eq!(app.status_message.as_deref(), Some("Response #1 added to sources"));
        app.prev_message();
        app.toggle_source();
        assert_eq!(
            app.status_message.as_deref(),
            Some("Only model responses can be sources")
        );
    }
}
