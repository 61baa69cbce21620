//! Configuration loading and resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`PRIO_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default quiet period before a burst of edits flushes to the remote store
pub const DEFAULT_DEBOUNCE_MS: u64 = 1_500;
/// Default unconditional autosave period (safety net for dropped timers)
pub const DEFAULT_AUTOSAVE_SECS: u64 = 60;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Card API key
    #[serde(default)]
    pub trello_key: Option<String>,
    /// Card API token
    #[serde(default)]
    pub trello_token: Option<String>,
    /// Default board id
    #[serde(default)]
    pub board_id: Option<String>,
    /// Default destination list id for pushes and imports
    #[serde(default)]
    pub list_id: Option<String>,
    /// Base URL of the blob-storage service (`/storage/load`, `/storage/save`)
    #[serde(default)]
    pub storage_url: Option<String>,
    /// Local snapshot mirror path; defaults under the platform data dir
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    /// Debounce quiet period in milliseconds
    #[serde(default)]
    pub debounce_ms: Option<u64>,
    /// Unconditional autosave period in seconds
    #[serde(default)]
    pub autosave_secs: Option<u64>,
    /// Shared secret for the authentication gate; empty or "0" disables
    #[serde(default)]
    pub shared_secret: Option<String>,
}

impl AppConfig {
    /// Resolve configuration from an optional CLI-supplied file path
    ///
    /// Falls back to `$PRIO_CONFIG`, then the platform config dir
    /// (`<config>/prio-board/config.toml`), then compiled defaults. A missing
    /// file is not an error; an unreadable or unparsable one is.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::locate_file(cli_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a specific TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid config {}: {e}", path.display())))
    }

    fn locate_file(cli_path: Option<&Path>) -> Option<PathBuf> {
        // Priority 1: command-line argument
        if let Some(path) = cli_path {
            return Some(path.to_path_buf());
        }

        // Priority 2: environment variable
        if let Ok(path) = std::env::var("PRIO_CONFIG") {
            return Some(PathBuf::from(path));
        }

        // Priority 3: platform config dir
        let candidate = dirs::config_dir().map(|d| d.join("prio-board").join("config.toml"))?;
        candidate.exists().then_some(candidate)
    }

    /// Environment variables override file values
    fn apply_env(&mut self) {
        let over = |slot: &mut Option<String>, var: &str| {
            if let Ok(v) = std::env::var(var) {
                if !v.is_empty() {
                    *slot = Some(v);
                }
            }
        };
        over(&mut self.trello_key, "PRIO_TRELLO_KEY");
        over(&mut self.trello_token, "PRIO_TRELLO_TOKEN");
        over(&mut self.board_id, "PRIO_BOARD_ID");
        over(&mut self.list_id, "PRIO_LIST_ID");
        over(&mut self.storage_url, "PRIO_STORAGE_URL");
        over(&mut self.shared_secret, "PRIO_SHARED_SECRET");
        if let Ok(v) = std::env::var("PRIO_SNAPSHOT_PATH") {
            if !v.is_empty() {
                self.snapshot_path = Some(PathBuf::from(v));
            }
        }
    }

    /// Effective local snapshot path
    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot_path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("prio-board")
                .join("snapshot.json")
        })
    }

    /// Effective debounce quiet period
    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS))
    }

    /// Effective autosave period
    pub fn autosave(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.autosave_secs.unwrap_or(DEFAULT_AUTOSAVE_SECS))
    }

    /// Card API credentials, or a config error naming what is missing
    pub fn trello_credentials(&self) -> Result<(String, String)> {
        match (&self.trello_key, &self.trello_token) {
            (Some(k), Some(t)) if !k.is_empty() && !t.is_empty() => Ok((k.clone(), t.clone())),
            _ => Err(Error::Config(
                "missing trello_key / trello_token (set PRIO_TRELLO_KEY and PRIO_TRELLO_TOKEN)"
                    .to_string(),
            )),
        }
    }
}
