//! Run configuration for one scan-and-download pass.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use thiserror::Error;

use crate::download::{
    CONNECT_TIMEOUT_SECS, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS, READ_TIMEOUT_SECS,
};

/// Accepted worker counts.
pub const WORKERS_RANGE: RangeInclusive<usize> = 1..=64;

/// Accepted work queue capacities.
pub const QUEUE_CAPACITY_RANGE: RangeInclusive<usize> = 1..=10_000;

/// Accepted timeout values in seconds.
pub const TIMEOUT_SECS_RANGE: RangeInclusive<u64> = 1..=3_600;

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No page URL was given.
    #[error("Provide a page to scan for PDF links")]
    MissingPageUrl,

    /// A numeric setting is outside its accepted range.
    #[error("Invalid value for `{field}`: {value}. Expected range: {min}..={max}")]
    OutOfRange {
        /// Setting name.
        field: &'static str,
        /// Rejected value.
        value: u64,
        /// Lowest accepted value.
        min: u64,
        /// Highest accepted value.
        max: u64,
    },
}

impl ConfigError {
    fn out_of_range<T>(field: &'static str, value: T, range: &RangeInclusive<T>) -> Self
    where
        T: Copy + TryInto<u64>,
    {
        let widen = |v: T| v.try_into().unwrap_or(u64::MAX);
        Self::OutOfRange {
            field,
            value: widen(value),
            min: widen(*range.start()),
            max: widen(*range.end()),
        }
    }
}

/// Everything a run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Page to scan, as typed by the user. The scheme defaults to `http`.
    pub page_url: String,
    /// Number of download workers.
    pub workers: usize,
    /// Maximum number of undispatched work items.
    pub queue_capacity: usize,
    /// Directory receiving the PDFs.
    pub output_dir: PathBuf,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP read timeout in seconds; resets after every chunk received.
    pub read_timeout_secs: u64,
}

impl RunConfig {
    /// Creates a config for `page_url` with every other setting at its default.
    #[must_use]
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            output_dir: PathBuf::from("."),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }

    /// Sets the worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the work queue capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Sets both HTTP timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        self.connect_timeout_secs = connect_timeout_secs;
        self.read_timeout_secs = read_timeout_secs;
        self
    }

    /// Checks every setting against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_url.trim().is_empty() {
            return Err(ConfigError::MissingPageUrl);
        }
        check_range("workers", self.workers, &WORKERS_RANGE)?;
        check_range("queue_capacity", self.queue_capacity, &QUEUE_CAPACITY_RANGE)?;
        check_range(
            "connect_timeout_secs",
            self.connect_timeout_secs,
            &TIMEOUT_SECS_RANGE,
        )?;
        check_range(
            "read_timeout_secs",
            self.read_timeout_secs,
            &TIMEOUT_SECS_RANGE,
        )?;
        Ok(())
    }
}

fn check_range<T>(field: &'static str, value: T, range: &RangeInclusive<T>) -> Result<(), ConfigError>
where
    T: Copy + PartialOrd + TryInto<u64>,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::out_of_range(field, value, range))
    }
}
