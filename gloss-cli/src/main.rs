//! Gloss CLI - Terminal annotator for saved chat transcripts

mod config;
mod io;
mod logging;
mod ui;

use std::io::stdout;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing::{error, info};

use gloss_core::{App, Focus, Mode};

use crate::config::ResolvedConfig;

#[derive(Debug, Parser)]
#[command(name = "gloss")]
#[command(version)]
#[command(about = "Highlight and comment on saved chat transcripts")]
pub struct Args {
    /// Saved chat, session dump or chat history (JSON)
    pub file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory exports are written to
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Log file for tracing output
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

fn resolve_config(args: &Args) -> Result<ResolvedConfig> {
    let file = config::load_config(args.config.as_deref())?;
    let resolved = config::apply_env_overrides(config::merge_config(file));
    Ok(config::apply_cli_overrides(
        resolved,
        args.export_dir.clone(),
        args.log_file.clone(),
    ))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args).context("Failed to load configuration")?;

    if let Err(e) = logging::init(&config.log_file) {
        eprintln!("Warning: logging disabled: {}", e);
    }
    info!(version = env!("CARGO_PKG_VERSION"), "gloss starting");

    let mut app = App::new(config.engine.clone());

    if let Some(path) = &args.file {
        match io::load_file(path, config.engine.max_highlights_per_message) {
            Ok(chats) => {
                app.load_chats(chats);
                app.set_status(&format!("Loaded {}", path.display()));
            }
            Err(e) => {
                error!(error = %e, "load failed");
                app.set_status(&format!("Error: {:#}", e));
            }
        }
    } else {
        app.set_status("No chat loaded. Pass a saved chat JSON file as argument.");
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = res {
        error!(error = %e, "event loop failed");
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, config: &ResolvedConfig) -> Result<()> {
    while app.running {
        terminal.draw(|f| ui::draw(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match app.mode() {
                Mode::Normal => {
                    app.clear_status();
                    handle_normal_mode(app, key.code, config);
                }
                Mode::Annotate => handle_annotate_mode(app, key.code),
                Mode::Comment => handle_comment_mode(app, key.code),
                Mode::Help => app.toggle_help(),
            }
        }
    }
    Ok(())
}

fn handle_normal_mode(app: &mut App, code: KeyCode, config: &ResolvedConfig) {
    match code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('?') => app.toggle_help(),

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => {
            if app.focus == Focus::Editor {
                app.move_down();
            } else {
                app.next_highlight();
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if app.focus == Focus::Editor {
                app.move_up();
            } else {
                app.prev_highlight();
            }
        }
        KeyCode::Char('h') | KeyCode::Left => app.move_left(),
        KeyCode::Char('l') | KeyCode::Right => app.move_right(),
        KeyCode::Char('w') => app.move_word_forward(),
        KeyCode::Char('b') => app.move_word_back(),
        KeyCode::Char('g') => app.move_to_top(),
        KeyCode::Char('G') => app.move_to_bottom(),

        // Messages and chats
        KeyCode::Char('n') => app.next_message(),
        KeyCode::Char('p') => app.prev_message(),
        KeyCode::Char(c @ '1'..='9') => {
            if let Some(index) = c.to_digit(10) {
                app.switch_chat(index as usize - 1);
            }
        }

        // Highlight navigation
        KeyCode::Char(']') => app.next_highlight(),
        KeyCode::Char('[') => app.prev_highlight(),

        KeyCode::Char('v') => app.toggle_annotation_mode(),
        KeyCode::Char('s') => app.toggle_source(),

        KeyCode::Tab => app.toggle_focus(),

        // Export
        KeyCode::Char('e') => {
            if let Some(chat) = app.sessions.active_chat() {
                let result = io::export_chat(chat, &config.export_dir);
                match result {
                    Ok(path) => app.set_status(&format!("Exported to {}", path.display())),
                    Err(e) => app.set_status(&format!("Export failed: {:#}", e)),
                }
            }
        }
        KeyCode::Char('E') => {
            let result = io::export_session(app.sessions.chats(), &config.export_dir);
            match result {
                Ok(path) => app.set_status(&format!("Exported session to {}", path.display())),
                Err(e) => app.set_status(&format!("Export failed: {:#}", e)),
            }
        }

        _ => {}
    }
}

fn handle_annotate_mode(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc | KeyCode::Char('v') => app.toggle_annotation_mode(),
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char('h') | KeyCode::Left => app.move_left(),
        KeyCode::Char('l') | KeyCode::Right => app.move_right(),
        KeyCode::Char('w') => app.move_word_forward(),
        KeyCode::Char('b') => app.move_word_back(),
        KeyCode::Char('a') | KeyCode::Enter => app.annotate_selection(),
        _ => {}
    }
}

fn handle_comment_mode(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.cancel_annotation(),
        KeyCode::Enter => {
            app.complete_annotation();
        }
        KeyCode::Backspace => {
            app.input_buffer.pop();
        }
        KeyCode::Char(c) => app.input_buffer.push(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_accept_file_and_overrides() {
        let args = Args::try_parse_from([
            "gloss",
            "chat.json",
            "--export-dir",
            "/tmp/out",
            "--log-file",
            "/tmp/gloss.log",
        ])
        .unwrap();
        assert_eq!(args.file, Some(PathBuf::from("chat.json")));
        assert_eq!(args.export_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(args.log_file, Some(PathBuf::from("/tmp/gloss.log")));
        assert_eq!(args.config, None);
    }

    #[test]
    fn args_without_file_are_valid() {
        let args = Args::try_parse_from(["gloss"]).unwrap();
        assert!(args.file.is_none());
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Args::try_parse_from(["gloss", "--colour"]).is_err());
    }

    #[test]
    fn cli_flag_beats_config_file() {
        let dir = std::env::temp_dir().join(format!("gloss_main_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let config_path = dir.join("config.toml");
        std::fs::write(&config_path, "export_dir = \"/from/file\"\n").unwrap();

        let args = Args::try_parse_from([
            "gloss",
            "--config",
            config_path.to_str().unwrap(),
            "--log-file",
            "/tmp/cli.log",
        ])
        .unwrap();
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.log_file, PathBuf::from("/tmp/cli.log"));
        if std::env::var("GLOSS_EXPORT_DIR").is_err() {
            assert_eq!(config.export_dir, PathBuf::from("/from/file"));
        }

        let _ = std::fs::remove_dir_all(&dir);
    }
}
