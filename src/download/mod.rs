//! HTTP downloads streamed straight to disk.
//!
//! This module provides the shared [`HttpClient`] and the [`Worker`]s that
//! drain the work queue, one file per PDF link.
//!
//! # Features
//!
//! - Streaming writes through a buffered file handle
//! - File names taken from the URL's final path segment
//! - Existing files are never refetched or overwritten
//! - Partial files are removed when a transfer fails
//! - Configurable timeouts (30s connect, 5min read by default)
//!
//! # Example
//!
//! ```no_run
//! use pdfgrab_core::download::{HttpClient, ItemOutcome, download_item};
//! use pdfgrab_core::scanner::WorkItem;
//! use std::path::Path;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let item = WorkItem::new(Url::parse("https://example.com/paper.pdf")?);
//! if let ItemOutcome::Downloaded { path, .. } =
//!     download_item(&client, &item, Path::new("./downloads")).await
//! {
//!     println!("Downloaded: {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod filename;
mod worker;

pub use client::HttpClient;
pub use constants::{CONNECT_TIMEOUT_SECS, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS, READ_TIMEOUT_SECS};
pub use error::DownloadError;
pub use filename::file_name_from_url;
pub use worker::{
    ItemOutcome, SkipReason, Worker, WorkerId, WorkerStats, download_item, write_stream,
};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
