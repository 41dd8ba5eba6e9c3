//! Persisted user preference: realtime notifications on or off.
//!
//! Lives in its own small TOML file next to `config.toml` so toggling it
//! from the UI never rewrites the hand-edited main config.

use std::path::{Path, PathBuf};

use herald_common::ConfigError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::toml_loader::config_dir;

const PREFERENCES_FILE: &str = "preferences.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct Preferences {
    realtime_notifications: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            realtime_notifications: true,
        }
    }
}

/// File-backed store for the realtime-notifications preference.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config_dir>/herald/preferences.toml`.
    pub fn at_default_location() -> Result<Self, ConfigError> {
        Ok(Self::new(config_dir()?.join(PREFERENCES_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the preference. A missing or unreadable file means enabled.
    pub fn load(&self) -> bool {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Preferences::default().realtime_notifications;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read preferences");
                return Preferences::default().realtime_notifications;
            }
        };

        match toml::from_str::<Preferences>(&content) {
            Ok(prefs) => prefs.realtime_notifications,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "invalid preferences file");
                Preferences::default().realtime_notifications
            }
        }
    }

    /// Persist the preference.
    pub fn save(&self, enabled: bool) -> Result<(), ConfigError> {
        let prefs = Preferences {
            realtime_notifications: enabled,
        };
        let content = toml::to_string_pretty(&prefs)
            .map_err(|e| ConfigError::WriteError(format!("failed to serialize preferences: {e}")))?;
        write_atomic(&self.path, &content)?;
        debug!(enabled, path = %self.path.display(), "realtime notification preference saved");
        Ok(())
    }

    /// Flip the stored preference and return the new value.
    pub fn toggle(&self) -> Result<bool, ConfigError> {
        let enabled = !self.load();
        self.save(enabled)?;
        Ok(enabled)
    }
}

/// Atomically replace `path` with `contents` via a `.tmp` sibling.
fn write_atomic(path: &Path, contents: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::WriteError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, contents).map_err(|e| {
        ConfigError::WriteError(format!("failed to write {}: {e}", tmp_path.display()))
    })?;

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        // Windows may refuse to rename over an open file.
        warn!("atomic rename failed ({}), falling back to direct write", e);
        std::fs::write(path, contents).map_err(|e2| {
            ConfigError::WriteError(format!("failed to write {}: {e2}", path.display()))
        })?;
        let _ = std::fs::remove_file(&tmp_path);
    }

    Ok(())
}
