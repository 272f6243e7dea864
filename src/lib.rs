//! pdfgrab Core Library
//!
//! Scans one HTML page for links to PDF documents and downloads every one of
//! them concurrently into a local directory.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`resolver`] - Page URL normalization and href resolution
//! - [`scanner`] - HTML tokenizing and PDF link extraction
//! - [`work_queue`] - Bounded handoff between the scanner and the workers
//! - [`download`] - HTTP client and download workers
//! - [`coordinator`] - Runs one scan-and-download pass
//! - [`config`] - Run configuration and validation

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod coordinator;
pub mod download;
pub mod resolver;
pub mod scanner;
mod user_agent;
pub mod work_queue;

// Re-export commonly used types
pub use config::{ConfigError, RunConfig};
pub use coordinator::{CoordinatorError, RunReport, run};
pub use download::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS, DownloadError, HttpClient, ItemOutcome, WorkerId,
};
pub use resolver::{PageSource, ResolveError};
pub use scanner::{WorkItem, pdf_links};
pub use work_queue::{QueueError, WorkQueue, WorkSender, work_queue};
