//! Configuration management for pixfit.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults; a missing file is not an error.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for pixfit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Processing settings
    pub processing: ProcessingConfig,

    /// Compression defaults
    pub compression: CompressionConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.pixfit.pixfit/config.toml
    /// - Linux: ~/.config/pixfit/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\pixfit\config\config.toml
    ///
    /// Falls back to ~/.pixfit/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "pixfit", "pixfit")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".pixfit").join("config.toml")
            })
    }

    /// Get the resolved default output directory, if one is configured
    /// (with ~ expansion).
    pub fn output_dir(&self) -> Option<PathBuf> {
        self.compression.output_dir.as_ref().map(|dir| {
            let expanded = shellexpand::tilde(dir);
            PathBuf::from(expanded.into_owned())
        })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.processing.concurrency, 0);
        assert_eq!(config.compression.default_target_bytes, 5_000_000);
        assert_eq!(config.limits.max_file_size_mb, 100);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[processing]"));
        assert!(toml.contains("[compression]"));
        assert!(toml.contains("[limits]"));
    }

    #[test]
    fn test_load_from_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[compression]\nproportional = true\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.compression.proportional);
        // Unmentioned sections keep their defaults
        assert_eq!(config.limits.max_image_dimension, 10_000);
    }

    #[test]
    fn test_output_dir_expands_tilde() {
        let mut config = Config::default();
        config.compression.output_dir = Some("~/shrunk".to_string());
        let dir = config.output_dir().unwrap();
        assert!(!dir.to_string_lossy().starts_with('~'));
    }
}
