//! Input ingestion: turning caller-supplied paths into validated tasks.
//!
//! Directories are expanded by extension allow-list; every candidate then
//! passes the same validation. Unreadable or undecodable paths are rejected
//! here, one error per path, without failing the rest of the batch.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::codec;
use crate::config::{Config, LimitsConfig};
use crate::error::JobError;
use crate::types::ImageTask;

/// Validate a path and build an [`ImageTask`] from it.
///
/// Checks existence, that it is a regular file, the configured size and
/// dimension limits, and that the header decodes to image dimensions.
pub fn create_task(path: &Path, limits: &LimitsConfig) -> Result<ImageTask, JobError> {
    if !path.exists() {
        return Err(JobError::FileNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(JobError::NotAFile(path.to_path_buf()));
    }

    let metadata = std::fs::metadata(path).map_err(|e| JobError::Decode {
        path: path.to_path_buf(),
        message: format!("cannot read metadata: {e}"),
    })?;

    let max_bytes = limits.max_file_size_mb * 1024 * 1024;
    if metadata.len() > max_bytes {
        return Err(JobError::FileTooLarge {
            path: path.to_path_buf(),
            size_mb: metadata.len() / (1024 * 1024),
            max_mb: limits.max_file_size_mb,
        });
    }

    let (width, height) = codec::probe_dimensions(path)?;
    if width > limits.max_image_dimension || height > limits.max_image_dimension {
        return Err(JobError::ImageTooLarge {
            path: path.to_path_buf(),
            width,
            height,
            max_dim: limits.max_image_dimension,
        });
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(ImageTask {
        path: path.to_path_buf(),
        file_name,
        width,
        height,
        source_size: metadata.len(),
    })
}

/// Build tasks for all paths, collecting per-path errors instead of failing.
pub fn gather_tasks(
    paths: &[PathBuf],
    limits: &LimitsConfig,
) -> (Vec<ImageTask>, Vec<(PathBuf, JobError)>) {
    let mut tasks = Vec::with_capacity(paths.len());
    let mut errors = Vec::new();

    for path in paths {
        match create_task(path, limits) {
            Ok(task) => tasks.push(task),
            Err(e) => errors.push((path.clone(), e)),
        }
    }

    (tasks, errors)
}

/// Expand inputs into validated tasks in one pass.
///
/// Directory inputs are walked recursively; entries are filtered by the
/// configured extension list so a stray `notes.txt` is not an error, and
/// within each directory candidates are sorted for deterministic order.
/// Walk failures and files given directly are never dropped silently: each
/// either becomes a task or a per-path error.
pub fn ingest_inputs(
    inputs: &[PathBuf],
    config: &Config,
) -> (Vec<ImageTask>, Vec<(PathBuf, JobError)>) {
    let mut candidates = Vec::new();
    let mut errors = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(input).follow_links(true) {
                match entry {
                    Ok(entry) => {
                        let path = entry.path();
                        if path.is_file()
                            && is_supported(path, &config.processing.supported_formats)
                        {
                            found.push(entry.into_path());
                        }
                    }
                    Err(e) => {
                        let path = e
                            .path()
                            .map(Path::to_path_buf)
                            .unwrap_or_else(|| input.clone());
                        errors.push((
                            path.clone(),
                            JobError::Discovery {
                                path,
                                message: e.to_string(),
                            },
                        ));
                    }
                }
            }
            found.sort();
            candidates.extend(found);
        } else {
            // A path given directly is always a candidate; validation decides
            candidates.push(input.clone());
        }
    }

    let (tasks, mut task_errors) = gather_tasks(&candidates, &config.limits);
    errors.append(&mut task_errors);
    (tasks, errors)
}

/// Whether a file's extension is on the configured allow-list.
fn is_supported(path: &Path, formats: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            formats.iter().any(|fmt| fmt.to_lowercase() == ext)
        })
        .unwrap_or(false)
}
