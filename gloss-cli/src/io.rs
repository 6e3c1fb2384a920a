//! File I/O for native CLI

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use gloss_core::{export, slugify, Chat, SaveRequest};
use tracing::info;

/// Load a save payload, session dump or bare history from disk
pub fn load_file(path: &Path, max_highlights: usize) -> Result<Vec<Chat>> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", path.display()))?;

    let json = fs::read_to_string(&canonical)
        .with_context(|| format!("Failed to read file: {}", canonical.display()))?;

    let chats = export::load_chats(&json, max_highlights)
        .with_context(|| format!("Not a saved chat: {}", canonical.display()))?;
    info!(path = %canonical.display(), chats = chats.len(), "loaded chats");
    Ok(chats)
}

/// Create the export directory if needed
fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
}

/// Write the chat's save payload to `<dir>/<slug>.json`
pub fn export_chat(chat: &Chat, dir: &Path) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let export_path = dir.join(format!("{}.json", slugify(&chat.title)));

    let json = export::to_json(&SaveRequest::from_chat(chat, false))
        .context("Failed to serialize chat")?;

    fs::write(&export_path, json)
        .with_context(|| format!("Failed to write {}", export_path.display()))?;

    info!(path = %export_path.display(), "exported chat");
    Ok(export_path)
}

/// Write every chat of the session to `<dir>/session.json`
pub fn export_session(chats: &[Chat], dir: &Path) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let export_path = dir.join("session.json");

    let json = export::session_to_json(chats).context("Failed to serialize session")?;

    fs::write(&export_path, json)
        .with_context(|| format!("Failed to write {}", export_path.display()))?;

    info!(path = %export_path.display(), chats = chats.len(), "exported session");
    Ok(export_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gloss_core::{Highlight, Message, TextRange};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gloss_io_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn exported_chat_loads_back() {
        let dir = scratch_dir("chat");
        let mut chat = Chat::new(3, "Model C");
        chat.title = "Free Will?".into();
        let mut reply = Message::model(3, "<p>It depends.</p>", Some(20));
        reply
            .highlights
            .push(Highlight::new(TextRange::new(3, 5), Some("hedge".into())));
        chat.push_message(Message::user(3, "Do we have free will?"));
        chat.push_message(reply);

        let path = export_chat(&chat, &dir).unwrap();
        assert!(path.ends_with("free-will.json"));

        let loaded = load_file(&path, 10).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "Free Will?");
        assert_eq!(loaded[0].messages[1].highlights, chat.messages[1].highlights);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn session_export_keeps_every_chat() {
        let dir = scratch_dir("session");
        let chats = vec![Chat::new(1, "Model A"), Chat::new(2, "Model B")];
        let path = export_session(&chats, &dir).unwrap();
        assert_eq!(load_file(&path, 10).unwrap().len(), 2);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_file(Path::new("/definitely/not/here.json"), 10).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
