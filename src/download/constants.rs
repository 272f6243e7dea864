//! Constants for the download module (timeouts, pool sizing).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout: longest wait for the next chunk of data (5 minutes).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default number of download workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default capacity of the work queue between the scanner and the workers.
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;
