//! Sub-configuration structs with defaults.

use serde::{Deserialize, Serialize};

use crate::plan::default_concurrency;

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of parallel workers; 0 means auto (90% of logical processors)
    pub concurrency: usize,

    /// Supported input formats
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            concurrency: 0,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "gif".to_string(),
                "bmp".to_string(),
                "tiff".to_string(),
            ],
        }
    }
}

impl ProcessingConfig {
    /// The worker count to actually use, resolving 0 to the auto default.
    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency == 0 {
            default_concurrency()
        } else {
            self.concurrency
        }
    }
}

/// Compression defaults applied when the caller doesn't specify them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Byte target used when none is given on the command line
    pub default_target_bytes: u64,

    /// Treat the target as a whole-batch budget split by pixel count
    pub proportional: bool,

    /// Name outputs after each plan's effective target rather than the
    /// global one
    pub suffix_from_plan_target: bool,

    /// Default output directory; unset writes next to each source
    pub output_dir: Option<String>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            default_target_bytes: 5_000_000,
            proportional: false,
            suffix_from_plan_target: false,
            output_dir: None,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10_000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
