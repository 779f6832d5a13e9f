//! Configuration file handling for `config.ini`.
//!
//! Loads and saves cache settings. Parsing lives in [`super::parser`] and
//! serialization in [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cache::HierarchyConfig;
use crate::result::ResultCacheConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// Every setting the config file can carry.
#[derive(Debug, Clone, Default)]
pub struct CacheSettings {
    /// General-purpose artifact hierarchy
    pub hierarchy: HierarchyConfig,
    /// OCR result cache; shares the tier settings of `hierarchy`
    pub result_cache: ResultCacheConfig,
}

impl CacheSettings {
    /// Load settings from the default path.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load settings from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save settings to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }
}

/// Directory holding the config file (`<config dir>/vision-cache`).
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vision-cache")
}

/// Default config file path.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
