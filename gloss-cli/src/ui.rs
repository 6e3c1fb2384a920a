//! Terminal UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use gloss_core::markup;
use gloss_core::view::TextRun;
use gloss_core::{App, Chat, Focus, Mode, Role, TextRange};

// Catppuccin Mocha colors
const SURFACE0: Color = Color::Rgb(49, 50, 68);
const SURFACE1: Color = Color::Rgb(69, 71, 90);
const TEXT: Color = Color::Rgb(205, 214, 244);
const SUBTEXT0: Color = Color::Rgb(166, 173, 200);
const YELLOW: Color = Color::Rgb(249, 226, 175);
const GREEN: Color = Color::Rgb(166, 227, 161);
const BLUE: Color = Color::Rgb(137, 180, 250);
const MAUVE: Color = Color::Rgb(203, 166, 247);
const PEACH: Color = Color::Rgb(250, 179, 135);

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Length(1), // Chat tabs
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_title_bar(frame, app, chunks[0]);
    draw_tabs(frame, app, chunks[1]);
    draw_main_area(frame, app, chunks[2]);
    draw_status_bar(frame, app, chunks[3]);

    match app.mode() {
        Mode::Comment => draw_comment_dialog(frame, app),
        Mode::Help => draw_help(frame),
        _ => {}
    }
}

fn draw_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let count = app
        .sessions
        .active_chat()
        .map_or(0, |c| c.messages.len());
    let current = if count > 0 { app.message_index + 1 } else { 0 };

    let title_text = format!(" Gloss - {} [message {}/{}]", app.title(), current, count);
    let title_bar = Paragraph::new(title_text).style(Style::default().fg(TEXT).bg(SURFACE0));
    frame.render_widget(title_bar, area);
}

fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.sessions.active_index();
    let mut spans: Vec<Span> = app
        .sessions
        .chats()
        .iter()
        .enumerate()
        .map(|(i, chat)| {
            let style = if Some(i) == active {
                Style::default().fg(SURFACE0).bg(BLUE).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(SUBTEXT0)
            };
            let count = match chat.highlight_count() {
                0 => String::new(),
                n => format!(" ({n})"),
            };
            Span::styled(format!(" {}:{}{} ", i + 1, chat.pretty_name, count), style)
        })
        .collect();
    if app.sessions.is_full() {
        spans.push(Span::styled(" (full)", Style::default().fg(SUBTEXT0)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_main_area(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Editor
            Constraint::Length(32), // Sidebar
        ])
        .split(area);

    draw_editor(frame, app, chunks[0]);
    draw_sidebar(frame, app, chunks[1]);
}

/// Highlight index under each byte of the visible text
fn highlight_at(runs: &[TextRun], offset: usize) -> Option<usize> {
    runs.iter()
        .find(|r| TextRange::new(r.start, r.start + r.text.len()).contains(offset))
        .and_then(|r| r.highlight)
}

fn draw_editor(frame: &mut Frame, app: &App, area: Rect) {
    let editor_style = if app.focus == Focus::Editor {
        Style::default().fg(BLUE)
    } else {
        Style::default().fg(SUBTEXT0)
    };

    let mode_indicator = match app.mode() {
        Mode::Annotate => " [ANNOTATE]",
        Mode::Comment => " [COMMENT]",
        _ => "",
    };

    let heading = match (app.current_message(), app.sessions.active_chat()) {
        (Some(message), Some(chat)) => match message.role {
            Role::User => "You".to_string(),
            Role::Model => {
                let source = if chat.is_source(app.message_index) { " [source]" } else { "" };
                format!("{} - {}{}", chat.pretty_name, Chat::source_label(app.message_index), source)
            }
        },
        _ => "No message".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(editor_style)
        .title(format!("{}{}", heading, mode_indicator));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(view) = app.current_view() else {
        return;
    };
    let runs = view.runs(&app.config.wrapper_class);
    let selection = app.get_selection_range();
    let focused_highlight = app.selected_highlight().map(|(i, _)| i);
    let cursor_offset = app.cursor.offset();

    let mut lines: Vec<Line> = Vec::new();
    for row in 0..app.cursor.line_count() {
        let (Some(line_text), Some(line_start)) = (app.cursor.line(row), app.cursor.line_start(row)) else {
            continue;
        };

        let mut spans: Vec<Span> = Vec::new();
        for (col, ch) in line_text.char_indices() {
            let offset = line_start + col;
            let mut style = Style::default().fg(TEXT);

            if let Some(index) = highlight_at(&runs, offset) {
                style = style.fg(YELLOW).add_modifier(Modifier::UNDERLINED);
                if Some(index) == focused_highlight && app.focus == Focus::Sidebar {
                    style = style.fg(PEACH);
                }
            }
            if let Some((sel_start, sel_end)) = selection {
                if offset >= sel_start && offset < sel_end {
                    style = style.bg(SURFACE1).add_modifier(Modifier::BOLD);
                }
            }
            if offset == cursor_offset && app.focus == Focus::Editor {
                style = style.add_modifier(Modifier::REVERSED);
            }

            spans.push(Span::styled(ch.to_string(), style));
        }
        if line_start + line_text.len() == cursor_offset && app.focus == Focus::Editor {
            spans.push(Span::styled(" ", Style::default().add_modifier(Modifier::REVERSED)));
        }
        lines.push(Line::from(spans));
    }

    let visible_height = inner.height as usize;
    let row = app.cursor.row;
    let scroll_offset = if row >= visible_height {
        row - visible_height + 1
    } else {
        0
    };

    let paragraph = Paragraph::new(lines)
        .scroll((scroll_offset as u16, 0))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}

fn draw_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let sidebar_style = if app.focus == Focus::Sidebar {
        Style::default().fg(BLUE)
    } else {
        Style::default().fg(SUBTEXT0)
    };

    let sorted = app.highlights_sorted();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(sidebar_style)
        .title(format!(
            "Highlights ({}/{})",
            sorted.len(),
            app.config.max_highlights_per_message
        ));

    let Some(message) = app.current_message() else {
        frame.render_widget(block, area);
        return;
    };

    let items: Vec<ListItem> = sorted
        .iter()
        .enumerate()
        .map(|(i, (_, highlight))| {
            let selected = i == app.sidebar_selected;
            let marker = if selected { ">" } else { " " };

            let excerpt: String = message
                .highlighted_markup(highlight)
                .map(markup::visible_text)
                .unwrap_or_default()
                .chars()
                .take(20)
                .collect::<String>()
                .replace('\n', " ");
            let comment: String = highlight
                .comment_text()
                .unwrap_or("(no comment)")
                .chars()
                .take(26)
                .collect();

            let style = if selected {
                Style::default().fg(TEXT).bg(SURFACE1)
            } else {
                Style::default().fg(TEXT)
            };

            ListItem::new(vec![
                Line::from(Span::styled(format!("{} \"{}\"", marker, excerpt), style)),
                Line::from(Span::styled(format!("   {}", comment), style.fg(SUBTEXT0))),
            ])
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode_str = match app.mode() {
        Mode::Normal => "NORMAL",
        Mode::Annotate => "ANNOTATE",
        Mode::Comment => "COMMENT",
        Mode::Help => "HELP",
    };

    let status = app.status_message.as_deref().unwrap_or("");
    let help_hint = "v annotate | n/p message | 1-4 chat | e export | ? help";

    let totals = app.token_totals();
    let word = app.most_common_word().unwrap_or_else(|| "-".to_string());

    let status_text = format!(
        " {} | {} | tokens {}/{} | top word: {}",
        mode_str,
        if status.is_empty() { help_hint } else { status },
        totals.chat,
        totals.session,
        word,
    );

    let status_bar = Paragraph::new(status_text).style(Style::default().fg(SUBTEXT0).bg(SURFACE0));
    frame.render_widget(status_bar, area);
}

fn draw_comment_dialog(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 6, frame.area());
    frame.render_widget(Clear, area);

    let excerpt: String = app
        .authoring
        .pending()
        .map(|p| p.excerpt())
        .unwrap_or_default()
        .chars()
        .take(30)
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(GREEN))
        .title("Comment (Enter to save, Esc to discard)");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let body = vec![
        Line::from(Span::styled(format!("\"{}\"", excerpt), Style::default().fg(YELLOW))),
        Line::from(Span::styled(
            format!("{}_", app.input_buffer),
            Style::default().fg(TEXT),
        )),
    ];
    frame.render_widget(Paragraph::new(body).wrap(Wrap { trim: false }), inner);
}

fn draw_help(frame: &mut Frame) {
    let area = centered_rect(60, 22, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BLUE))
        .title("Help (press any key to close)");

    let section = |name: &'static str| {
        Line::from(Span::styled(
            name,
            Style::default().fg(MAUVE).add_modifier(Modifier::BOLD),
        ))
    };

    let help_text = vec![
        section("Navigation"),
        Line::from("  h/j/k/l  Move cursor"),
        Line::from("  w/b      Next/prev word"),
        Line::from("  n/p      Next/prev message"),
        Line::from("  1-4      Switch chat"),
        Line::from("  ]/[      Next/prev highlight"),
        Line::from("  Tab      Toggle editor/sidebar"),
        Line::from(""),
        section("Highlights"),
        Line::from("  v        Toggle annotation mode"),
        Line::from("  a        Highlight selection"),
        Line::from("  Enter    Save highlight with comment"),
        Line::from("  Esc      Discard / leave annotation mode"),
        Line::from("  s        Use response as a prompt source"),
        Line::from(""),
        section("File"),
        Line::from("  e        Export active chat as JSON"),
        Line::from("  E        Export whole session"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Style::default().fg(SUBTEXT0))),
    ];

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gloss_core::{Highlight, Message};
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn draws_tabs_message_and_highlights() {
        let mut chat = Chat::new(2, "Model B");
        chat.title = "Dreams".into();
        let mut reply = Message::model(2, "<p>I never dream at all</p>", Some(40));
        reply
            .highlights
            .push(Highlight::new(TextRange::new(5, 10), Some("really?".into())));
        chat.push_message(Message::user(2, "Do you dream?"));
        chat.push_message(reply);

        let mut app = App::default();
        app.load_chats(vec![chat]);
        app.next_message();

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let text = buffer_text(&terminal);

        assert!(text.contains("Gloss - Dreams [message 2/2]"));
        assert!(text.contains("1:Model B (1)"));
        assert!(text.contains("I never dream at all"));
        assert!(text.contains("Highlights (1/10)"));
        assert!(text.contains("really?"));
        assert!(text.contains("tokens 40/40"));
    }

    #[test]
    fn highlight_lookup_uses_run_offsets() {
        let runs = vec![
            TextRun { text: "ab".into(), start: 0, highlight: None },
            TextRun { text: "cd".into(), start: 2, highlight: Some(3) },
        ];
        assert_eq!(highlight_at(&runs, 1), None);
        assert_eq!(highlight_at(&runs, 3), Some(3));
        assert_eq!(highlight_at(&runs, 4), None);
    }
}
