//! Pixfit CLI - Compress image batches down to a byte target.
//!
//! Pixfit takes images plus a size target and writes compressed copies that
//! fit the target, searching JPEG quality per image so you never have to
//! guess one.
//!
//! # Usage
//!
//! ```bash
//! # Fit every image under 2 MB
//! pixfit shrink ./photos/ --target-size 2MB
//!
//! # Split a whole-batch budget across images by pixel count
//! pixfit shrink a.jpg b.jpg --target-size 10MB --combined
//!
//! # Preview the plan without writing anything
//! pixfit plan ./photos/ --target-size 2MB
//!
//! # View configuration
//! pixfit config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Pixfit - Compress image batches down to a byte target.
#[derive(Parser, Debug)]
#[command(name = "pixfit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compress images to fit a size target
    Shrink(cli::shrink::ShrinkArgs),

    /// Show what a shrink run would do, without writing files
    Plan(cli::plan::PlanArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match pixfit_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `pixfit config path`."
            );
            pixfit_core::Config::default()
        }
    };
    logging::init(&config.logging, cli.verbose, cli.json_logs);

    tracing::debug!("Pixfit v{}", pixfit_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Shrink(args) => cli::shrink::execute(args, config).await,
        Commands::Plan(args) => cli::plan::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
