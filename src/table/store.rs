//! Persistent storage of table settings
//!
//! Each table stores its settings in its own YAML file named after the
//! table's storage key.

use super::settings::{validate_page_size, validate_refresh_rate};
use super::TableSettings;
use crate::config::paths;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the default data directory
    pub fn default_location() -> Self {
        Self::new(paths::tables_dir())
    }

    /// File holding the settings of `storage_key`
    pub fn path(&self, storage_key: &str) -> PathBuf {
        let file_name: String = storage_key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.yaml", file_name))
    }

    /// Load stored settings; `None` when the table was never saved
    ///
    /// Values the settings menu would reject fall back to their defaults.
    pub fn load(&self, storage_key: &str) -> Result<Option<TableSettings>> {
        let path = self.path(storage_key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read table settings: {}", path.display()))?;
        let settings = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse table settings: {}", path.display()))?;

        Ok(Some(sanitize(settings, &path)))
    }

    pub fn save(&self, storage_key: &str, settings: &TableSettings) -> Result<()> {
        paths::ensure_dir(&self.dir)
            .with_context(|| format!("Failed to create directory: {}", self.dir.display()))?;

        let path = self.path(storage_key);
        let yaml =
            serde_yaml::to_string(settings).context("Failed to serialize table settings")?;
        std::fs::write(&path, yaml)
            .with_context(|| format!("Failed to write table settings: {}", path.display()))?;

        tracing::debug!("Saved table settings for '{}' to {}", storage_key, path.display());
        Ok(())
    }
}

/// Replace out-of-range values of a hand-edited file with defaults
fn sanitize(mut settings: TableSettings, path: &Path) -> TableSettings {
    let defaults = TableSettings::default();
    if let Err(e) = validate_page_size(settings.page_size) {
        tracing::warn!("{}: {}, using {}", path.display(), e, defaults.page_size);
        settings.page_size = defaults.page_size;
    }
    if let Err(e) = validate_refresh_rate(settings.auto_refresh_rate) {
        tracing::warn!("{}: {}, auto-refresh disabled", path.display(), e);
        settings.auto_refresh_rate = defaults.auto_refresh_rate;
    }
    settings
}
