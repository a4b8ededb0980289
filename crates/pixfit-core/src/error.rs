//! Error types for the pixfit compression engine.
//!
//! Errors are split by blast radius: `JobError` stays local to one image's
//! job, `PlanError` stops a batch before it starts, and `ConfigError` covers
//! the configuration file. All carry relevant context (paths, limits, byte
//! targets).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for pixfit operations.
#[derive(Error, Debug)]
pub enum PixfitError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Batch planning errors
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// Per-job processing errors
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors local to a single image's job.
///
/// None of these aborts sibling jobs; each is reported once against the
/// image that produced it.
#[derive(Error, Debug)]
pub enum JobError {
    /// File does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Path exists but is not a regular file
    #[error("Not a file: {0}")]
    NotAFile(PathBuf),

    /// File exceeds the configured size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed the configured limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// A directory walk could not read an entry
    #[error("Cannot read {path}: {message}")]
    Discovery { path: PathBuf, message: String },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// The detected format has no quality-parameterized encoder
    #[error("No lossy encoder for {path} (format: {format})")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// No quality level in range produces output within the byte target
    #[error("No acceptable quality found for {path} (target: {target_bytes} bytes)")]
    QualityNotFound { path: PathBuf, target_bytes: u64 },

    /// Encoding failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Writing the output file failed
    #[error("Write error for {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// The worker task running the job died (panic or runtime shutdown)
    #[error("Worker failure for {path}: {message}")]
    Worker { path: PathBuf, message: String },
}

/// Batch planning errors. Surfaced once; the batch does not start.
#[derive(Error, Debug)]
pub enum PlanError {
    /// No valid images were left after ingestion
    #[error("no valid images to plan")]
    NoTasks,

    /// The global byte target is zero
    #[error("target size must be greater than 0 bytes")]
    InvalidTarget,

    /// Worker count of zero
    #[error("concurrency must be at least 1")]
    InvalidConcurrency,

    /// Proportional split rounded every per-image target down to zero
    #[error("every per-image target rounded down to 0 bytes")]
    DegenerateTargets,
}

/// Convenience type alias for pixfit results.
pub type Result<T> = std::result::Result<T, PixfitError>;
