//! Configuration constants.
//!
//! This module defines the defaults used when a policy is enabled without
//! explicit parameters, plus the fixed names of the on-disk cache layout.

use std::time::Duration;

// Dispatch spacing
/// Default minimum interval between two dispatches when the delay policy is enabled
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1500);
/// Relative spread of the random jitter applied to delays (0.1 = ±10%)
pub const JITTER_SPREAD: f64 = 0.1;

// Retry strategy
/// Number of retries (on top of the initial attempt) for retry policies
pub const RETRY_ATTEMPTS: u32 = 3;
/// Pause between two attempts of a retry policy, before jitter
pub const RETRY_DELAY: Duration = Duration::from_secs(5);
/// HTTP status codes that the generic retry policy never retries
/// 403 Forbidden and 404 Not Found will not change on a second attempt
pub const RETRY_EXCLUDED_STATUS: &[u16] = &[403, 404];

// Network
/// Default per-request timeout set by the timeout policy
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Local HTTP proxy used when proxying is requested without an explicit address
pub const DEFAULT_PROXY: &str = "http://127.0.0.1:8118";
/// Maximum number of redirect hops the transport follows
pub const MAX_REDIRECT_HOPS: usize = 10;
/// Accept header sent with every request built by the client
pub const DEFAULT_ACCEPT: &str = "*/*";
/// Plain-text service answering with the caller's public IP address
pub const IP_ECHO_URL: &str = "https://api.ipify.org";

// History
/// Default number of (request, response) pairs kept for back/forward navigation
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

// Disk cache
/// Default folder where cached pages are stored (created if missing)
pub const DEFAULT_CACHE_DIR: &str = ".webcache";
/// Name of the small JSON state file kept inside the cache folder
pub const CACHE_STATE_FILE: &str = ".state.json";
/// Extension of files holding page content
pub const CACHE_CONTENT_EXT: &str = "html";
/// Extension of redirect marker files (content is the target URL)
pub const CACHE_REDIRECT_EXT: &str = "redirect";
/// Default freshness window in days
pub const CACHE_REFRESH_DAYS: f64 = 1.0;
/// Default retention window in days
pub const CACHE_RETAIN_DAYS: f64 = 30.0;
/// Sweeps run at most this often, whatever the refresh window
pub const CACHE_MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// Fraction of the refresh window between two sweeps
pub const CACHE_SWEEP_FRACTION: f64 = 0.1;
/// Upper bound on files inspected by one sampling sweep
pub const CACHE_SWEEP_SAMPLE: usize = 10_000;
/// Escaped URL part of a cache filename is cut to this many bytes
/// Keeps names under the 255-byte limit of common filesystems
pub const CACHE_MAX_NAME_LEN: usize = 200;

/// Seconds in one day, for converting the day-based cache windows
pub const SECS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;
