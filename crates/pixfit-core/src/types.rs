//! Core data types for the pixfit compression engine.
//!
//! These types flow through the engine in one direction: validated paths
//! become `ImageTask`s, the planner turns tasks into `JobPlan`s, and the
//! scheduler turns plans into `JobResult`s.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::codec::EncodeQuality;
use crate::error::JobError;

/// A validated input image, immutable once created.
///
/// Construction goes through [`crate::ingest::create_task`], which rejects
/// missing, unreadable, and undecodable paths up front.
#[derive(Debug, Clone, Serialize)]
pub struct ImageTask {
    /// Path to the source file
    pub path: PathBuf,

    /// Just the filename portion
    pub file_name: String,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// On-disk size of the source file in bytes
    pub source_size: u64,
}

impl ImageTask {
    /// Total pixel count, the weight used for proportional budget splits.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// One unit of scheduled work: an image plus its byte budget and destination.
#[derive(Debug, Clone, Serialize)]
pub struct JobPlan {
    /// The image to compress
    pub task: ImageTask,

    /// Maximum acceptable encoded size for this image
    pub target_bytes: u64,

    /// Where the compressed output will be written
    pub output_path: PathBuf,
}

/// What happened to one job.
#[derive(Debug)]
pub enum JobOutcome {
    /// The output file was written within budget
    Success {
        /// Path the output was written to
        output_path: PathBuf,
        /// Quality the final write used (`Keep` means the fast path re-emitted
        /// the original bytes without re-encoding)
        quality: EncodeQuality,
        /// Size of the written file in bytes
        output_size: u64,
    },

    /// The job ran and failed; siblings are unaffected
    Failed(JobError),

    /// The batch was stopped before this job started
    Skipped,
}

/// The result of one submitted plan. Every plan yields exactly one of these,
/// even when the batch is stopped early.
#[derive(Debug)]
pub struct JobResult {
    pub plan: JobPlan,
    pub outcome: JobOutcome,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, JobOutcome::Success { .. })
    }
}

/// Aggregate statistics for one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Number of plans submitted
    pub total: usize,

    /// Jobs that produced an output file
    pub succeeded: usize,

    /// Jobs that ran and failed
    pub failed: usize,

    /// Jobs never started because the batch was stopped
    pub skipped: usize,

    /// Source bytes across successful jobs
    pub bytes_in: u64,

    /// Written bytes across successful jobs
    pub bytes_out: u64,

    /// Wall-clock duration of the batch
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Bytes saved by successful jobs. Negative values are possible when a
    /// re-encode grows a file that was already near its target.
    pub fn bytes_saved(&self) -> i64 {
        self.bytes_in as i64 - self.bytes_out as i64
    }
}
