//! CLI entry point for pdfgrab.

use std::time::Instant;

use anyhow::{Result, bail};
use clap::Parser;
use pdfgrab_core::{ConfigError, run};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let started = Instant::now();

    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let Some(config) = args.run_config() else {
        bail!(ConfigError::MissingPageUrl);
    };

    let report = run(&config).await?;

    info!(
        dispatched = report.dispatched,
        workers = report.workers_completed,
        output_dir = %config.output_dir.display(),
        elapsed = ?started.elapsed(),
        "Finished"
    );

    Ok(())
}
