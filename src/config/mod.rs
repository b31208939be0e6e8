//! Configuration management.
//!
//! Settings persist as JSON at `~/.taskmark/config.json`. Resolution
//! follows env-priority chains: an explicit `--config` path wins, then
//! `TASKMARK_CONFIG`, then the home-directory default. The access token
//! can additionally be supplied via `TASKMARK_TOKEN` so it never has to
//! live on disk.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::{DisplayOptions, SyncedSource};

/// Default watch-mode cadence in seconds.
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;

/// Persisted settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Asana personal access token. `TASKMARK_TOKEN` overrides.
    pub token: Option<String>,
    /// Workspace the configured sources live in.
    pub workspace_gid: Option<String>,
    /// Root folder for synced documents.
    pub vault_dir: PathBuf,
    /// Configured remote-list / document pairings.
    pub sources: Vec<SyncedSource>,
    /// Display toggles applied when formatting task lines.
    pub display: DisplayOptions,
    /// Seconds between periodic passes in watch mode.
    pub sync_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: None,
            workspace_gid: None,
            vault_dir: PathBuf::from("."),
            sources: Vec::new(),
            display: DisplayOptions::default(),
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
        }
    }
}

impl Settings {
    /// Load settings from the resolved config path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConfigured`] when no config file exists and
    /// [`Error::Config`] when one exists but cannot be parsed.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(explicit_path).ok_or(Error::NotConfigured)?;
        if !path.exists() {
            return Err(Error::NotConfigured);
        }

        let text = fs::read_to_string(&path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Save settings to the resolved config path, creating parent
    /// folders as needed.
    pub fn save(&self, explicit_path: Option<&Path>) -> Result<PathBuf> {
        let path = resolve_config_path(explicit_path)
            .ok_or_else(|| Error::Config("cannot resolve a config location".to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// The access token, with `TASKMARK_TOKEN` taking priority over the
    /// persisted value.
    pub fn resolve_token(&self) -> Result<String> {
        if let Ok(token) = std::env::var("TASKMARK_TOKEN") {
            if !token.trim().is_empty() {
                return Ok(token);
            }
        }
        self.token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or(Error::MissingToken)
    }

    /// Find a configured source by display name.
    #[must_use]
    pub fn source(&self, name: &str) -> Option<&SyncedSource> {
        self.sources.iter().find(|s| s.name == name)
    }
}

/// Resolve the config file path.
///
/// Priority:
/// 1. Explicit path from the CLI flag
/// 2. `TASKMARK_CONFIG` environment variable
/// 3. `~/.taskmark/config.json`
#[must_use]
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("TASKMARK_CONFIG") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    directories::BaseDirs::new().map(|b| b.home_dir().join(".taskmark").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let mut settings = Settings::default();
        settings.workspace_gid = Some("12345".to_string());
        settings.sources.push(SyncedSource {
            list_gid: "1200".to_string(),
            name: "Launch".to_string(),
            file: PathBuf::from("launch.md"),
            personal: false,
        });
        settings.save(Some(&path)).unwrap();

        let loaded = Settings::load(Some(&path)).unwrap();
        assert_eq!(loaded.workspace_gid.as_deref(), Some("12345"));
        assert_eq!(loaded.sources.len(), 1);
        assert_eq!(loaded.sync_interval_secs, 300);
    }

    #[test]
    fn test_load_missing_file_is_not_configured() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");
        assert!(matches!(
            Settings::load(Some(&path)),
            Err(Error::NotConfigured)
        ));
    }

    #[test]
    fn test_load_invalid_json_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(Settings::load(Some(&path)), Err(Error::Config(_))));
    }

    #[test]
    fn test_source_lookup_by_name() {
        let mut settings = Settings::default();
        settings.sources.push(SyncedSource {
            list_gid: "1".to_string(),
            name: "Inbox".to_string(),
            file: PathBuf::from("inbox.md"),
            personal: true,
        });

        assert!(settings.source("Inbox").is_some());
        assert!(settings.source("Unknown").is_none());
    }
}
