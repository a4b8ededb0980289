//! The `pixfit plan` command: preview a shrink run without writing files.

use std::path::PathBuf;

use clap::Args;
use pixfit_core::{ingest, plan, BatchOptions, Config};

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Image files or directories to plan for
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

    /// Output directory the plan would write into
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Name each output after its own effective target instead of the
    /// global one (only differs under --combined)
    #[arg(long)]
    pub exact_suffix: bool,

    /// Print the plan as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Execute the plan command.
pub async fn execute(args: PlanArgs, config: Config) -> anyhow::Result<()> {
    let target_bytes = match &args.target_size {
        Some(s) => super::parse_size(s)?,
        None => config.compression.default_target_bytes,
    };

    let options = BatchOptions {
        target_bytes,
        proportional: args.combined || config.compression.proportional,
        output_dir: args.output_dir.clone().or_else(|| config.output_dir()),
        suffix_from_plan_target: args.exact_suffix || config.compression.suffix_from_plan_target,
        ..BatchOptions::new(target_bytes)
    };

    let (tasks, rejected) = ingest::ingest_inputs(&args.inputs, &config);
    for (path, error) in &rejected {
        tracing::error!(path = %path.display(), %error, "rejected input");
    }

    let plans = plan::plan(tasks, &options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }

    for p in &plans {
        let fits = p.task.source_size <= p.target_bytes;
        println!(
            "{}  {}x{}  {} -> {} bytes{}  => {}",
            p.task.path.display(),
            p.task.width,
            p.task.height,
            p.task.source_size,
            p.target_bytes,
            if fits { " (already fits)" } else { "" },
            p.output_path.display(),
        );
    }

    let budget: u64 = plans.iter().map(|p| p.target_bytes).sum();
    eprintln!();
    eprintln!("  {} images, {} bytes of target budget", plans.len(), budget);
    Ok(())
}
