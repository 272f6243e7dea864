//! Download workers.
//!
//! Each worker pulls [`WorkItem`]s from the shared [`WorkQueue`] until it is
//! closed and drained, then reports its [`WorkerId`] on the completion
//! channel. Per-item failures are logged and never leave the worker.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures_util::{Stream, StreamExt};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::client::HttpClient;
use super::error::DownloadError;
use super::filename::file_name_from_url;
use crate::scanner::WorkItem;
use crate::work_queue::WorkQueue;

/// Identifies one worker in logs and completion signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(usize);

impl WorkerId {
    /// Wraps a worker index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// Why an item was skipped without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The target file is already on disk.
    AlreadyExists(PathBuf),
}

/// Result of processing one work item.
#[derive(Debug)]
pub enum ItemOutcome {
    /// The body was written in full.
    Downloaded {
        /// Where the file was written.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// Nothing was fetched.
    Skipped(SkipReason),
    /// The item failed; any file it created has been removed.
    Failed(DownloadError),
}

/// Per-worker tallies, logged when the worker drains.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    /// Items written in full.
    pub downloaded: usize,
    /// Items skipped because the file existed.
    pub skipped: usize,
    /// Items that failed.
    pub failed: usize,
}

impl WorkerStats {
    fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Downloaded { .. } => self.downloaded += 1,
            ItemOutcome::Skipped(_) => self.skipped += 1,
            ItemOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// A worker bound to the shared queue and output directory.
#[derive(Debug)]
pub struct Worker {
    id: WorkerId,
    client: HttpClient,
    queue: WorkQueue,
    output_dir: PathBuf,
}

impl Worker {
    /// Creates a worker. Nothing runs until [`Worker::spawn`] or [`Worker::run`].
    #[must_use]
    pub fn new(
        id: WorkerId,
        client: HttpClient,
        queue: WorkQueue,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id,
            client,
            queue,
            output_dir: output_dir.into(),
        }
    }

    /// Spawns the worker on the current runtime.
    pub fn spawn(self, done: mpsc::Sender<WorkerId>) -> JoinHandle<WorkerStats> {
        tokio::spawn(self.run(done))
    }

    /// Processes items until the queue is closed and drained, then signals `done`.
    pub async fn run(self, done: mpsc::Sender<WorkerId>) -> WorkerStats {
        let mut stats = WorkerStats::default();
        debug!(worker = %self.id, "worker started");

        while let Some(item) = self.queue.next().await {
            let outcome = download_item(&self.client, &item, &self.output_dir).await;
            stats.record(&outcome);
        }

        debug!(
            worker = %self.id,
            downloaded = stats.downloaded,
            skipped = stats.skipped,
            failed = stats.failed,
            "queue drained"
        );
        if done.send(self.id).await.is_err() {
            warn!(worker = %self.id, "completion channel closed before signal");
        }
        stats
    }
}

/// Fetches one item into `output_dir`.
///
/// Never fails outright: every error is logged and reported as
/// [`ItemOutcome::Failed`], and a file created for the item is removed again.
#[instrument(skip_all, fields(url = %item))]
pub async fn download_item(client: &HttpClient, item: &WorkItem, output_dir: &Path) -> ItemOutcome {
    let url = item.url().as_str();

    let Some(name) = file_name_from_url(item.url()) else {
        warn!("no file name in URL, skipping");
        return ItemOutcome::Failed(DownloadError::no_file_name(url));
    };
    let path = output_dir.join(name);

    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        info!(path = %path.display(), "already exists");
        return ItemOutcome::Skipped(SkipReason::AlreadyExists(path));
    }

    let file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            info!(path = %path.display(), "already exists");
            return ItemOutcome::Skipped(SkipReason::AlreadyExists(path));
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "could not create file");
            return ItemOutcome::Failed(DownloadError::io(path, e));
        }
    };

    let response = match client.get(url).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "fetch failed");
            drop(file);
            discard_partial(&path).await;
            return ItemOutcome::Failed(e);
        }
    };

    match write_stream(file, response.bytes_stream(), url, &path).await {
        Ok(bytes) => {
            info!(path = %path.display(), bytes, "downloaded");
            ItemOutcome::Downloaded { path, bytes }
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "copy failed");
            discard_partial(&path).await;
            ItemOutcome::Failed(e)
        }
    }
}

/// Streams body chunks into `file` through a buffer, returning bytes written.
///
/// The file handle is closed before this returns, on every path.
pub async fn write_stream<S, B, E>(
    file: File,
    stream: S,
    url: &str,
    path: &Path,
) -> Result<u64, DownloadError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut stream = std::pin::pin!(stream);
    let mut writer = BufWriter::new(file);
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::body(url, e))?;
        let chunk = chunk.as_ref();
        writer
            .write_all(chunk)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(path, e))?;

    Ok(bytes_written)
}

/// Removes a file left behind by a failed item. Failure to remove is logged only.
async fn discard_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed partial file"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => error!(path = %path.display(), error = %e, "could not remove partial file"),
    }
}
