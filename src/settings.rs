//! Importer settings persistence.
//!
//! This module handles loading and saving the import preferences that apply
//! across runs: how malformed rows are treated, the file delimiter, and the
//! vocabulary new property types are created in.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum::{AsRefStr, EnumString};

/// What to do with a row that cannot be loaded
#[derive(AsRefStr, Clone, Copy, Debug, Default, EnumString, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowPolicy {
    /// Log the row and continue; the run fails only if no row loads
    #[default]
    Skip,
    /// Fail the whole run and roll back everything it wrote
    Abort,
}

/// Settings that persist across import runs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Settings file version for migration support
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub row_policy: RowPolicy,
    /// Column delimiter of QTL files
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Vocabulary that feature and position property types belong to
    #[serde(default = "default_property_context")]
    pub property_context: String,
}

fn default_version() -> u32 {
    1
}

fn default_delimiter() -> char {
    '\t'
}

fn default_property_context() -> String {
    "MAIN".to_string()
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            row_policy: RowPolicy::default(),
            delimiter: default_delimiter(),
            property_context: default_property_context(),
        }
    }
}

impl ImportSettings {
    /// Get the config directory path for the importer
    pub fn get_config_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::data_dir().map(|p| p.join("QtlImporter"))
        }
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|p| p.join("QtlImporter"))
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            dirs::config_dir().map(|p| p.join("qtl-importer"))
        }
    }

    /// Get the path to the settings JSON file
    pub fn get_settings_path() -> Option<PathBuf> {
        Self::get_config_dir().map(|p| p.join("settings.json"))
    }

    /// Delimiter as a byte; non-ASCII delimiters fall back to tab
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            tracing::warn!(
                "Delimiter {:?} is not ASCII, using tab instead",
                self.delimiter
            );
            b'\t'
        }
    }

    /// Load settings from the config directory
    pub fn load() -> Self {
        match Self::get_settings_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::warn!("Could not determine config directory for importer settings");
                Self::default()
            }
        }
    }

    /// Load settings from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    tracing::info!("Loaded importer settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    tracing::error!("Failed to parse importer settings: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::error!("Failed to read importer settings: {}", e);
                Self::default()
            }
        }
    }

    /// Save settings to the config directory
    pub fn save(&self) -> Result<(), String> {
        let path = Self::get_settings_path()
            .ok_or_else(|| "Could not determine config directory".to_string())?;
        self.save_to(&path)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write settings file: {}", e))?;

        Ok(())
    }
}
