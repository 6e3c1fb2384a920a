//! Configuration loading with precedence handling.
//!
//! Precedence, lowest to highest: defaults, config file, environment
//! (`GLOSS_EXPORT_DIR`, `GLOSS_LOG_FILE`), command-line flags.

use std::path::{Path, PathBuf};

use gloss_core::EngineConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Invalid TOML in {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },
}

/// TOML configuration file (`~/.config/gloss/config.toml`). Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Where `e`/`E` write save payloads
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// `[engine]` table
    #[serde(default)]
    pub engine: Option<EngineConfig>,
}

/// Configuration after all sources are merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub export_dir: PathBuf,
    pub log_file: PathBuf,
    pub engine: EngineConfig,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            log_file: data_dir.join("gloss.log"),
            export_dir: data_dir,
            engine: EngineConfig::default(),
        }
    }
}

/// `~/.gloss`, or `.gloss` when there is no home directory
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".gloss"))
        .unwrap_or_else(|| PathBuf::from(".gloss"))
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gloss").join("config.toml"))
}

/// Load a config file. A missing file is not an error.
pub fn load_config_file(path: &Path) -> Result<Option<ConfigFile>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    parse_config(&contents)
        .map(Some)
        .map_err(|reason| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason,
        })
}

fn parse_config(contents: &str) -> Result<ConfigFile, String> {
    toml::from_str(contents).map_err(|e| e.to_string())
}

/// Load the explicit `--config` path if given, else the default location
pub fn load_config(explicit: Option<&Path>) -> Result<Option<ConfigFile>, ConfigError> {
    match explicit {
        Some(path) => load_config_file(path),
        None => match default_config_path() {
            Some(path) => load_config_file(&path),
            None => Ok(None),
        },
    }
}

pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        export_dir: config.export_dir.unwrap_or(defaults.export_dir),
        log_file: config.log_file.unwrap_or(defaults.log_file),
        engine: config.engine.unwrap_or(defaults.engine),
    }
}

pub fn apply_env_overrides(config: ResolvedConfig) -> ResolvedConfig {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

fn apply_overrides_from(
    mut config: ResolvedConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    if let Some(dir) = lookup("GLOSS_EXPORT_DIR") {
        config.export_dir = PathBuf::from(dir);
    }
    if let Some(file) = lookup("GLOSS_LOG_FILE") {
        config.log_file = PathBuf::from(file);
    }
    config
}

pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    export_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
) -> ResolvedConfig {
    if let Some(dir) = export_dir {
        config.export_dir = dir;
    }
    if let Some(file) = log_file {
        config.log_file = file;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_table_is_read() {
        let config = parse_config(
            r#"
            export_dir = "/tmp/gloss-out"

            [engine]
            max_highlights_per_message = 5
            "#,
        )
        .unwrap();
        let resolved = merge_config(Some(config));
        assert_eq!(resolved.export_dir, PathBuf::from("/tmp/gloss-out"));
        assert_eq!(resolved.engine.max_highlights_per_message, 5);
        assert_eq!(resolved.engine.max_chats, 4);
        assert!(resolved.log_file.ends_with("gloss.log"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("colour = \"red\"").is_err());
        assert!(parse_config("[engine]\nwrapper = \"x\"").is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("gloss-config-that-does-not-exist.toml");
        assert_eq!(load_config_file(&path), Ok(None));
        assert_eq!(merge_config(None), ResolvedConfig::default());
    }

    #[test]
    fn env_then_cli_take_precedence() {
        let file = ConfigFile {
            export_dir: Some(PathBuf::from("/from/file")),
            log_file: Some(PathBuf::from("/from/file.log")),
            engine: None,
        };
        let config = apply_overrides_from(merge_config(Some(file)), |key| {
            (key == "GLOSS_EXPORT_DIR").then(|| "/from/env".to_string())
        });
        assert_eq!(config.export_dir, PathBuf::from("/from/env"));
        assert_eq!(config.log_file, PathBuf::from("/from/file.log"));

        let config = apply_cli_overrides(config, Some(PathBuf::from("/from/cli")), None);
        assert_eq!(config.export_dir, PathBuf::from("/from/cli"));
        assert_eq!(config.log_file, PathBuf::from("/from/file.log"));
    }
}
