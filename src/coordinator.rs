//! Run coordination: start the workers, scan the page, feed the queue, wait.
//!
//! The coordinator is the only producer. It launches the worker pool before
//! fetching the page, pushes every PDF link into the bounded queue, closes the
//! queue, and then waits for one completion signal per worker.

use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ConfigError, RunConfig};
use crate::download::{DownloadError, HttpClient, Worker, WorkerId, WorkerStats};
use crate::resolver::{PageSource, ResolveError};
use crate::scanner::{ScanEnd, pdf_links, read_page};
use crate::work_queue::{QueueError, WorkSender, work_queue};

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The page URL could not be parsed.
    #[error(transparent)]
    InvalidPageUrl(#[from] ResolveError),

    /// The HTTP client could not be built.
    #[error("could not initialise HTTP client: {0}")]
    Client(#[source] DownloadError),

    /// The output directory could not be created.
    #[error("could not create output directory {path}: {source}")]
    OutputDir {
        /// Directory that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The page could not be fetched or answered with a non-success status.
    #[error("could not fetch page {url}: {source}")]
    PageFetch {
        /// The page URL.
        url: String,
        /// The underlying download error.
        #[source]
        source: DownloadError,
    },

    /// Every worker went away while items were still being pushed.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The completion channel closed before every worker signalled.
    #[error("only {completed} of {expected} workers signalled completion")]
    WorkerLost {
        /// Workers started.
        expected: usize,
        /// Completion signals received.
        completed: usize,
    },
}

impl CoordinatorError {
    fn page_fetch(url: impl Into<String>, source: DownloadError) -> Self {
        Self::PageFetch {
            url: url.into(),
            source,
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Work items pushed into the queue.
    pub dispatched: usize,
    /// Completion signals received.
    pub workers_completed: usize,
}

/// Scans `config.page_url` and downloads every PDF it links to.
///
/// Per-item failures are logged by the workers and do not fail the run.
///
/// # Errors
///
/// Returns [`CoordinatorError`] for an invalid configuration, an unparseable
/// page URL, an unreachable page, or a worker that stopped without
/// signalling. Workers already started are always drained first.
#[instrument(skip_all, fields(page = %config.page_url, workers = config.workers))]
pub async fn run(config: &RunConfig) -> Result<RunReport, CoordinatorError> {
    config.validate()?;
    let page = PageSource::parse(&config.page_url)?;
    let client = HttpClient::with_timeouts(config.connect_timeout_secs, config.read_timeout_secs)
        .map_err(CoordinatorError::Client)?;
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|source| CoordinatorError::OutputDir {
            path: config.output_dir.clone(),
            source,
        })?;

    let (sender, queue) = work_queue(config.queue_capacity);
    let (done_tx, done_rx) = mpsc::channel(config.workers);
    let handles: Vec<JoinHandle<WorkerStats>> = (0..config.workers)
        .map(|index| {
            Worker::new(
                WorkerId::new(index),
                client.clone(),
                queue.clone(),
                &config.output_dir,
            )
            .spawn(done_tx.clone())
        })
        .collect();
    drop(done_tx);
    drop(queue);
    debug!(workers = config.workers, "worker pool started");

    let scanned = scan_page(&client, &page, sender).await;
    let waited = wait_for_workers(done_rx, config.workers).await;

    let dispatched = scanned?;
    let workers_completed = waited?;
    log_totals(handles).await;

    Ok(RunReport {
        dispatched,
        workers_completed,
    })
}

/// Fetches the page and pushes its PDF links. The queue closes when this returns.
async fn scan_page(
    client: &HttpClient,
    page: &PageSource,
    sender: WorkSender,
) -> Result<usize, CoordinatorError> {
    info!(url = %page.url(), "Scanning");
    let response = client
        .get(page.url().as_str())
        .await
        .map_err(|e| CoordinatorError::page_fetch(page.url().as_str(), e))?;

    let body = read_page(response).await;
    match &body.end {
        ScanEnd::EndOfStream => info!(
            bytes = body.bytes,
            encoding = body.encoding.name(),
            "page read to end"
        ),
        ScanEnd::Interrupted(e) => {
            error!(bytes = body.bytes, error = %e, "page body interrupted, scanning what arrived");
        }
        ScanEnd::SizeLimit { limit } => {
            warn!(limit, "page exceeds size limit, scanning the first bytes only");
        }
    }

    let mut dispatched = 0;
    for item in pdf_links(&body.html, page) {
        let url = item.to_string();
        sender.send(item).await?;
        dispatched += 1;
        info!(url = %url, "Sent");
        debug!(
            depth = sender.depth(),
            capacity = sender.capacity(),
            "queue depth"
        );
    }

    info!(dispatched, "Done parsing");
    sender.close();
    Ok(dispatched)
}

/// Waits for exactly `expected` completion signals.
async fn wait_for_workers(
    mut done: mpsc::Receiver<WorkerId>,
    expected: usize,
) -> Result<usize, CoordinatorError> {
    let mut completed = 0;
    while completed < expected {
        let Some(worker) = done.recv().await else {
            error!(completed, expected, "completion channel closed early");
            return Err(CoordinatorError::WorkerLost {
                expected,
                completed,
            });
        };
        completed += 1;
        debug!(worker = %worker, completed, expected, "worker finished");
    }
    Ok(completed)
}

async fn log_totals(handles: Vec<JoinHandle<WorkerStats>>) {
    let mut totals = WorkerStats::default();
    for handle in handles {
        match handle.await {
            Ok(stats) => {
                totals.downloaded += stats.downloaded;
                totals.skipped += stats.skipped;
                totals.failed += stats.failed;
            }
            Err(e) => warn!(error = %e, "worker task ended abnormally"),
        }
    }
    info!(
        downloaded = totals.downloaded,
        skipped = totals.skipped,
        failed = totals.failed,
        "Done downloading"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_for_workers_counts_every_signal() {
        let (tx, rx) = mpsc::channel(3);
        for index in 0..3 {
            tx.send(WorkerId::new(index)).await.unwrap();
        }
        assert_eq!(wait_for_workers(rx, 3).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_wait_for_workers_closed_channel_is_worker_lost() {
        let (tx, rx) = mpsc::channel(2);
        tx.send(WorkerId::new(0)).await.unwrap();
        drop(tx);

        let result = wait_for_workers(rx, 2).await;
        assert!(matches!(
            result,
            Err(CoordinatorError::WorkerLost {
                expected: 2,
                completed: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_config_before_network() {
        let config = RunConfig::new("example.com").with_workers(0);
        let result = run(&config).await;
        assert!(matches!(result, Err(CoordinatorError::Config(_))));
    }

    #[tokio::test]
    async fn test_run_missing_url_is_config_error() {
        let result = run(&RunConfig::new("")).await;
        assert!(matches!(
            result,
            Err(CoordinatorError::Config(ConfigError::MissingPageUrl))
        ));
    }

    #[test]
    fn test_page_fetch_error_display_names_page() {
        let err = CoordinatorError::page_fetch(
            "http://example.com/talks/",
            DownloadError::http_status("http://example.com/talks/", 503),
        );
        let msg = err.to_string();
        assert!(msg.contains("http://example.com/talks/"), "{msg}");
        assert!(msg.contains("503"), "{msg}");
    }
}
