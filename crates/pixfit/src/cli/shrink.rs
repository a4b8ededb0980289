//! The `pixfit shrink` command: compress a batch of images to a size target.

use std::path::PathBuf;

use clap::Args;
use tokio::sync::mpsc;

use pixfit_core::{
    ingest, plan, BatchOptions, BatchScheduler, BatchSummary, Config, EncodeQuality, JobOutcome,
    ProgressEvent,
};

/// Arguments for the `shrink` command.
#[derive(Args, Debug)]
pub struct ShrinkArgs {
    /// Image files or directories to compress
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Size target, e.g. `2MB`, `800KB`, or a plain byte count
    /// (defaults to the configured target)
    #[arg(short, long)]
    pub target_size: Option<String>,

    /// Treat the target as a whole-batch budget, split across images by
    /// pixel count
    #[arg(long)]
    pub combined: bool,

    /// Write outputs here instead of next to each source
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of parallel workers (defaults to 90% of logical processors)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Name each output after its own effective target instead of the
    /// global one (only differs under --combined)
    #[arg(long)]
    pub exact_suffix: bool,
}

/// Execute the shrink command.
pub async fn execute(args: ShrinkArgs, config: Config) -> anyhow::Result<()> {
    let target_bytes = match &args.target_size {
        Some(s) => super::parse_size(s)?,
        None => config.compression.default_target_bytes,
    };

    let options = BatchOptions {
        target_bytes,
        proportional: args.combined || config.compression.proportional,
        output_dir: args.output_dir.clone().or_else(|| config.output_dir()),
        concurrency: args
            .jobs
            .unwrap_or_else(|| config.processing.effective_concurrency()),
        suffix_from_plan_target: args.exact_suffix || config.compression.suffix_from_plan_target,
    };

    let (tasks, rejected) = ingest::ingest_inputs(&args.inputs, &config);
    for (path, error) in &rejected {
        tracing::error!(path = %path.display(), %error, "rejected input");
    }

    let plans = plan::plan(tasks, &options)?;
    if plans.is_empty() {
        tracing::warn!("nothing to do");
        return Ok(());
    }

    if let Some(dir) = &options.output_dir {
        std::fs::create_dir_all(dir)?;
    }

    tracing::info!(
        images = plans.len(),
        target_bytes,
        combined = options.proportional,
        workers = options.concurrency,
        "shrinking"
    );

    let scheduler = BatchScheduler::new(plans, options.concurrency);

    // Ctrl-C stops cooperatively: running jobs finish, queued jobs are skipped
    let stop = scheduler.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("stop requested; letting running jobs finish");
            stop.stop();
        }
    });

    let (tx, rx) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(drive_progress(rx));
    let summary = scheduler.run(tx).await;
    reporter.await?;

    print_summary(&summary);

    if summary.failed > 0 {
        anyhow::bail!("{} of {} jobs failed", summary.failed, summary.total);
    }
    Ok(())
}

/// Consume progress events, updating the bar and logging each result.
async fn drive_progress(mut rx: mpsc::UnboundedReceiver<ProgressEvent>) {
    let mut progress: Option<indicatif::ProgressBar> = None;

    while let Some(ProgressEvent::JobFinished {
        result,
        finished,
        total,
        ..
    }) = rx.recv().await
    {
        let bar = progress.get_or_insert_with(|| create_progress_bar(total as u64));

        match &result.outcome {
            JobOutcome::Success {
                output_path,
                quality,
                output_size,
            } => {
                let detail = match quality {
                    EncodeQuality::Keep => "kept as-is".to_string(),
                    EncodeQuality::At(q) => format!("quality {q}"),
                };
                tracing::debug!(
                    source = %result.plan.task.path.display(),
                    output = %output_path.display(),
                    output_size,
                    "{detail}"
                );
                bar.set_message(format!("{} ({detail})", result.plan.task.file_name));
            }
            JobOutcome::Failed(error) => {
                tracing::error!(path = %result.plan.task.path.display(), %error, "failed");
            }
            JobOutcome::Skipped => {
                tracing::debug!(path = %result.plan.task.path.display(), "skipped");
            }
        }

        bar.set_position(finished as u64);
    }

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
}

/// Create a progress bar for batch compression.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after a batch run.
fn print_summary(summary: &BatchSummary) {
    let mb_in = summary.bytes_in as f64 / 1_000_000.0;
    let mb_out = summary.bytes_out as f64 / 1_000_000.0;
    let saved_pct = if summary.bytes_in > 0 {
        100.0 * summary.bytes_saved() as f64 / summary.bytes_in as f64
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", summary.succeeded);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    if summary.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", summary.skipped);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", summary.total);
    eprintln!("    Duration:     {:>7.1}s", summary.elapsed.as_secs_f64());
    eprintln!("    In:           {:>7.1} MB", mb_in);
    eprintln!(
        "    Out:          {:>7.1} MB ({:.0}% saved)",
        mb_out, saved_pct
    );
    eprintln!("  ====================================");
}
