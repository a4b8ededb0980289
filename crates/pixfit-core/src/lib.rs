//! Pixfit Core - Size-targeting batch image compression.
//!
//! Pixfit takes images plus a byte budget and produces compressed copies
//! that fit the budget, searching encoder quality per image instead of
//! asking the user to guess one.
//!
//! # Architecture
//!
//! ```text
//! Paths → Ingest → Plan (flat or proportional) → Batch → Search → Encode
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use pixfit_core::{batch::BatchScheduler, ingest, plan, BatchOptions};
//!
//! let (tasks, _errors) = ingest::gather_tasks(&paths, &limits);
//! let plans = plan::plan(tasks, &BatchOptions::new(5_000_000))?;
//!
//! let scheduler = BatchScheduler::new(plans, 4);
//! let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
//! let summary = scheduler.run(tx).await;
//! ```

// Module declarations
pub mod batch;
pub mod codec;
pub mod config;
pub mod error;
pub mod ingest;
pub mod plan;
pub mod search;
pub mod types;

// Re-exports for convenient access
pub use batch::{BatchScheduler, ProgressEvent, StopHandle};
pub use codec::EncodeQuality;
pub use config::Config;
pub use error::{ConfigError, JobError, PixfitError, PlanError, Result};
pub use plan::{default_concurrency, BatchOptions};
pub use types::{BatchSummary, ImageTask, JobOutcome, JobPlan, JobResult};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
