//! Persisted publish settings.
//!
//! Loaded once at startup and passed by value into each publish or
//! materialize call; only dialog-driven path selection mutates and
//! re-saves it, so the delivery paths never write here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors from settings persistence.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config directory not available")]
    NoConfigDir,
}

/// User configuration for publishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishSettings {
    /// Netlify site identifier.
    pub site_id: String,
    /// Netlify personal access token.
    pub api_token: String,
    /// Local directory holding the exported site.
    pub source_dir: PathBuf,
    /// Destination chosen for the last local export, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_export_path: Option<PathBuf>,
}

impl PublishSettings {
    /// Loads settings from the platform config directory.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&settings_path()?)
    }

    /// Saves settings to the platform config directory.
    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&settings_path()?)
    }

    /// Loads settings from an explicit file path.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Saves settings to an explicit file path, creating parent
    /// directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

fn settings_path() -> Result<PathBuf, SettingsError> {
    let base = config_dir().ok_or(SettingsError::NoConfigDir)?;
    Ok(base.join("sitedrop").join("settings.json"))
}

/// Returns the platform-specific config directory.
fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".config"))
    }
}
