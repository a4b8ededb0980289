//! Batch scheduling: fan jobs out across a bounded worker pool with live
//! progress and cooperative stop.
//!
//! One [`BatchRun`] exists per invocation and is the only shared mutable
//! state: an atomic `finished` counter and a `stopped` flag, passed to every
//! worker behind an `Arc`. Everything else (plans, decoded buffers) is owned
//! by exactly one worker at a time.
//!
//! Cancellation is non-preemptive: [`StopHandle::stop`] prevents jobs that
//! haven't started from starting, and never interrupts a job mid-search or
//! mid-write. Stopped-but-unstarted jobs still report a `Skipped` result, so
//! every submitted plan yields exactly one result.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::codec;
use crate::error::JobError;
use crate::search;
use crate::types::{BatchSummary, JobOutcome, JobPlan, JobResult};

/// Shared state for one batch execution.
pub struct BatchRun {
    stopped: AtomicBool,
    finished: AtomicUsize,
    total: usize,
}

impl BatchRun {
    fn new(total: usize) -> Self {
        Self {
            stopped: AtomicBool::new(false),
            finished: AtomicUsize::new(0),
            total,
        }
    }

    /// Number of jobs that have reported a result so far.
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    /// Number of plans submitted to this batch.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Cancellation token for a running batch.
///
/// `stop` is idempotent and never blocks; in-flight jobs run to completion.
#[derive(Clone)]
pub struct StopHandle {
    run: Arc<BatchRun>,
}

impl StopHandle {
    /// Request that no further jobs start.
    pub fn stop(&self) {
        self.run.stopped.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.run.is_stopped()
    }
}

/// Progress updates delivered to the caller's sink, one per finished job.
#[derive(Debug)]
pub enum ProgressEvent {
    /// A job reported its result (success, failure, or skipped)
    JobFinished {
        result: JobResult,
        /// Jobs finished so far, including this one
        finished: usize,
        /// Total jobs in the batch
        total: usize,
        /// `finished / total`, in `[0, 1]`; reaches exactly 1.0 when the
        /// last job reports
        fraction: f64,
    },
}

/// Running totals, updated under the same lock that orders progress sends.
#[derive(Default)]
struct Tally {
    succeeded: usize,
    failed: usize,
    skipped: usize,
    bytes_in: u64,
    bytes_out: u64,
}

/// Schedules one batch of plans over a fixed-size worker pool.
pub struct BatchScheduler {
    plans: Vec<JobPlan>,
    concurrency: usize,
    run: Arc<BatchRun>,
}

impl BatchScheduler {
    /// Create a scheduler for the given plans. The pool size is fixed for
    /// the batch's duration.
    pub fn new(plans: Vec<JobPlan>, concurrency: usize) -> Self {
        let run = Arc::new(BatchRun::new(plans.len()));
        Self {
            plans,
            concurrency: concurrency.max(1),
            run,
        }
    }

    /// A handle for requesting cooperative cancellation.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            run: Arc::clone(&self.run),
        }
    }

    /// Shared run state, for callers that want to poll progress directly.
    pub fn run_state(&self) -> Arc<BatchRun> {
        Arc::clone(&self.run)
    }

    /// Execute the batch, sending one [`ProgressEvent`] per job to `sink`.
    ///
    /// Returns when every submitted plan has yielded a result. Per-job
    /// failures are reported through the sink and never abort siblings.
    pub async fn run(self, sink: mpsc::UnboundedSender<ProgressEvent>) -> BatchSummary {
        let started = Instant::now();
        let total = self.plans.len();
        if total == 0 {
            return BatchSummary {
                elapsed: started.elapsed(),
                ..Default::default()
            };
        }

        tracing::info!(total, concurrency = self.concurrency, "starting batch");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let tally = Arc::new(Mutex::new(Tally::default()));
        let mut workers = JoinSet::new();

        for plan in self.plans {
            let semaphore = Arc::clone(&semaphore);
            let run = Arc::clone(&self.run);
            let tally = Arc::clone(&tally);
            let sink = sink.clone();

            workers.spawn(async move {
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        // Pool closed underneath us; still report a result
                        let error = JobError::Worker {
                            path: plan.task.path.clone(),
                            message: format!("worker pool closed: {e}"),
                        };
                        report(&run, &tally, &sink, plan, JobOutcome::Failed(error));
                        return;
                    }
                };

                // Stop check happens once, before the job starts; a job that
                // gets past this line always runs to completion.
                let outcome = if run.is_stopped() {
                    JobOutcome::Skipped
                } else {
                    let job = plan.clone();
                    match tokio::task::spawn_blocking(move || execute_plan(&job)).await {
                        Ok(outcome) => outcome,
                        Err(e) => JobOutcome::Failed(JobError::Worker {
                            path: plan.task.path.clone(),
                            message: e.to_string(),
                        }),
                    }
                };

                drop(permit);
                report(&run, &tally, &sink, plan, outcome);
            });
        }

        while workers.join_next().await.is_some() {}

        let tally = tally.lock().unwrap_or_else(PoisonError::into_inner);
        let summary = BatchSummary {
            total,
            succeeded: tally.succeeded,
            failed: tally.failed,
            skipped: tally.skipped,
            bytes_in: tally.bytes_in,
            bytes_out: tally.bytes_out,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "batch complete"
        );
        summary
    }
}

/// Record a finished job and emit its progress event.
///
/// The tally lock also serializes counter increment and send, so observers
/// see a non-decreasing fraction sequence.
fn report(
    run: &BatchRun,
    tally: &Mutex<Tally>,
    sink: &mpsc::UnboundedSender<ProgressEvent>,
    plan: JobPlan,
    outcome: JobOutcome,
) {
    let mut tally = tally.lock().unwrap_or_else(PoisonError::into_inner);
    match &outcome {
        JobOutcome::Success { output_size, .. } => {
            tally.succeeded += 1;
            tally.bytes_in += plan.task.source_size;
            tally.bytes_out += *output_size;
        }
        JobOutcome::Failed(error) => {
            tracing::warn!(path = %plan.task.path.display(), %error, "job failed");
            tally.failed += 1;
        }
        JobOutcome::Skipped => tally.skipped += 1,
    }

    let finished = run.finished.fetch_add(1, Ordering::SeqCst) + 1;
    let fraction = finished as f64 / run.total as f64;
    // A closed sink means the caller stopped listening; the batch still runs
    // to completion.
    let _ = sink.send(ProgressEvent::JobFinished {
        result: JobResult { plan, outcome },
        finished,
        total: run.total,
        fraction,
    });
}

/// Run one job to completion: decode, fit to target, write.
///
/// Pure with respect to scheduler state; takes a plan and produces an
/// outcome, nothing else.
pub fn execute_plan(plan: &JobPlan) -> JobOutcome {
    let decoded = match codec::decode(&plan.task.path) {
        Ok(decoded) => decoded,
        Err(e) => return JobOutcome::Failed(e),
    };

    match search::save_with_target(&decoded, &plan.output_path, plan.target_bytes) {
        Ok((quality, output_size)) => JobOutcome::Success {
            output_path: plan.output_path.clone(),
            quality,
            output_size,
        },
        Err(e) => JobOutcome::Failed(e),
    }
}
