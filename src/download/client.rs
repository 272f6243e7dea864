//! HTTP client wrapper shared by the coordinator and the workers.
//!
//! One [`HttpClient`] is built per run and cloned into every worker; clones
//! share the underlying connection pool.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// HTTP client for fetching the scanned page and the PDFs it links to.
///
/// Redirects and TLS verification follow reqwest's defaults.
///
/// # Example
///
/// ```no_run
/// use pdfgrab_core::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let response = client.get("https://example.com/talks/").await?;
/// println!("status: {}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the default timeouts
    /// (30 s connect, 5 min without receiving any data).
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Network`] if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a client with explicit timeout values.
    ///
    /// The read timeout is an idle timeout: it fires when no data arrives for
    /// that long and resets after every successful read. A stalled server
    /// cannot hold a worker forever, while a slow but steady transfer of any
    /// size runs to completion.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Network`] if the client cannot be built.
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|e| DownloadError::from_reqwest("<client builder>", e))?;
        Ok(Self { client })
    }

    /// Sends a GET request and returns the response once headers arrive.
    ///
    /// The body is left unread so callers can stream it.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::Timeout`] / [`DownloadError::Network`] on transport failure
    /// - [`DownloadError::HttpStatus`] for any non-2xx status
    pub async fn get(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        debug!(url, "sending GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        debug!(url, status = status.as_u16(), "response headers received");
        Ok(response)
    }

}
