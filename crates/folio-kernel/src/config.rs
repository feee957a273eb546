//! Editor configuration (`~/.config/folio/config.ron`).
//!
//! Every field is optional in the file:
//!
//! ```ron
//! (
//!     autosave_delay_ms: 3000,
//!     database_path: Some("/srv/folio/documents.db"),
//! )
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::autosave::AutosaveConfig;

/// Error type for config loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period before an autosave fires.
    pub autosave_delay_ms: u64,
    /// How long the "saving" indicator lingers.
    pub saving_indicator_ms: u64,
    /// SQLite file. Defaults under the platform data dir.
    pub database_path: Option<PathBuf>,
    /// Owner stamped on documents created by this install.
    pub default_owner: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: 2000,
            saving_indicator_ms: 500,
            database_path: None,
            default_owner: None,
        }
    }
}

/// Get the config file path (~/.config/folio/config.ron).
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("folio").join("config.ron"))
}

/// Get the default database path.
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folio")
        .join("documents.db")
}

impl EditorConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&text)?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load from the platform config dir, or defaults if there is none.
    pub fn load_default() -> Result<Self, ConfigError> {
        match config_file_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(default_db_path)
    }

    pub fn autosave(&self) -> AutosaveConfig {
        AutosaveConfig {
            delay: Duration::from_millis(self.autosave_delay_ms),
            indicator: Duration::from_millis(self.saving_indicator_ms),
        }
    }
}
