//! Error types for the download module.
//!
//! Every variant carries the URL or path it concerns so a single log line is
//! enough to tell which item failed and why.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching a URL or writing it to disk.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body failed part way through.
    #[error("body of {url} interrupted: {source}")]
    Body {
        /// The URL whose body failed.
        url: String,
        /// The underlying stream error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// File system error (create, write, flush, remove).
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The URL has no final path segment usable as a file name.
    #[error("no file name in URL {url}")]
    NoFileName {
        /// The offending URL.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a body interruption error.
    pub fn body<E>(url: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Body {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a missing-file-name error.
    pub fn no_file_name(url: impl Into<String>) -> Self {
        Self::NoFileName { url: url.into() }
    }
}
