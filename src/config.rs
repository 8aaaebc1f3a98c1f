use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::render::RenderConfig;

pub const DEFAULT_WRONGBOOK: &str = "wrongbook.txt";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub render: RenderConfig,
    pub wrongbook: WrongbookConfig,
    pub selection: SelectionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrongbookConfig {
    /// Wrongbook file used when `--wb-file` is not given.
    pub path: Option<PathBuf>,
    /// Save after every accepted edit instead of only when the session ends.
    pub flush_after_each_edit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Shuffle full-mode output.
    pub shuffle_full: bool,
}

impl Default for WrongbookConfig {
    fn default() -> Self {
        Self {
            path: None,
            flush_after_each_edit: true,
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { shuffle_full: true }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/dictation/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e}; using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {}; using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Load an explicitly requested config file. Unlike [`AppConfig::load`],
    /// a missing or invalid file is an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&contents)?)
    }

    /// Wrongbook file: explicit path, else config value, else `wrongbook.txt`.
    pub fn wrongbook_path(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.wrongbook.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WRONGBOOK))
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("dictation").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
