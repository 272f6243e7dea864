//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use pdfgrab_core::RunConfig;
use pdfgrab_core::download::{
    CONNECT_TIMEOUT_SECS, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS, READ_TIMEOUT_SECS,
};

/// Download every PDF linked from a web page.
///
/// pdfgrab fetches one HTML page, finds the anchors whose href ends in
/// `.pdf`, and downloads them concurrently into a local directory.
#[derive(Parser, Debug)]
#[command(name = "pdfgrab")]
#[command(author, version, about)]
pub struct Args {
    /// Page to scan for PDF links (scheme defaults to http)
    pub url: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Number of concurrent download workers (1-64)
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub workers: u8,

    /// Maximum number of links waiting for a worker (1-10000)
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY as u16, value_parser = clap::value_parser!(u16).range(1..=10000))]
    pub queue_capacity: u16,

    /// Directory to write PDFs into
    #[arg(short = 'o', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// HTTP connect timeout in seconds (1-3600)
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: u64,

    /// Seconds to wait for the next chunk of data before giving up (1-3600)
    #[arg(long, default_value_t = READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: u64,
}

impl Args {
    /// Builds the run configuration. `None` when no URL was given.
    pub fn run_config(&self) -> Option<RunConfig> {
        let url = self.url.as_deref()?;
        Some(
            RunConfig::new(url)
                .with_workers(usize::from(self.workers))
                .with_queue_capacity(usize::from(self.queue_capacity))
                .with_output_dir(&self.output_dir)
                .with_timeouts(self.connect_timeout, self.read_timeout),
        )
    }
}
