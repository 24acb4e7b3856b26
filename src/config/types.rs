//! Configuration types.
//!
//! This module defines the structs and enums the client facade is built from.
//! Everything here can be constructed programmatically; the CLI binary maps its
//! flags onto the same types.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{
    CACHE_REFRESH_DAYS, CACHE_RETAIN_DAYS, DEFAULT_ACCEPT, DEFAULT_CACHE_DIR,
    DEFAULT_HISTORY_LIMIT, RETRY_DELAY,
};
use crate::handler::Handler;
use crate::handlers::RetryPredicate;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// How the `User-Agent` header is chosen.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Identity {
    /// No identity policy; the transport's own default applies.
    Off,
    /// Always send this exact string.
    Fixed(String),
    /// Pick one browser identity at random and keep it.
    #[default]
    Random,
    /// Pick at random and re-pick after this much time has elapsed.
    Rotating(Duration),
}

/// Capacity of the navigation log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryLimit {
    /// Keep every visited page.
    Unbounded,
    /// Keep at most this many pages; values below 1 are raised to 1.
    Limit(usize),
}

impl HistoryLimit {
    /// Returns the effective maximum length, `None` meaning unbounded.
    pub fn max_len(self) -> Option<usize> {
        match self {
            HistoryLimit::Unbounded => None,
            HistoryLimit::Limit(n) => Some(n.max(1)),
        }
    }
}

impl Default for HistoryLimit {
    fn default() -> Self {
        HistoryLimit::Limit(DEFAULT_HISTORY_LIMIT)
    }
}

/// Disk cache settings.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheConfig {
    /// Cache root folder
    pub path: PathBuf,
    /// Entries younger than this many days are served from disk
    pub refresh_days: f64,
    /// Entries older than this many days are removed by the sweep;
    /// raised to `refresh_days` if smaller
    pub retain_days: f64,
}

impl CacheConfig {
    /// Cache in `path` with the default refresh and retain windows.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CACHE_DIR),
            refresh_days: CACHE_REFRESH_DAYS,
            retain_days: CACHE_RETAIN_DAYS,
        }
    }
}

/// Client configuration.
///
/// Each field switches one policy of the handler chain on or off. The chain is
/// rebuilt from this struct whenever the client is reconfigured.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use webchain::{CacheConfig, ClientConfig, Identity};
///
/// let config = ClientConfig {
///     timeout: Some(Duration::from_secs(30)),
///     identity: Identity::Rotating(Duration::from_secs(600)),
///     cache: Some(CacheConfig::new(".webcache")),
///     delay: Some(Duration::from_secs(2)),
///     retry_on_timeout: Some(2),
///     ..Default::default()
/// };
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Per-request network deadline
    pub timeout: Option<Duration>,

    /// User-Agent policy
    pub identity: Identity,

    /// Infer the `Referer` header from the previously visited page
    pub referer: bool,

    /// Disk cache, disabled when `None`
    pub cache: Option<CacheConfig>,

    /// Minimum spacing between two dispatches
    pub delay: Option<Duration>,

    /// Retries on response timeout
    pub retry_on_timeout: Option<u32>,

    /// Retries on any failure except timeouts and excluded status codes
    pub retry_on_error: Option<u32>,

    /// Pause between attempts of the timeout and error retry policies
    pub retry_delay: Duration,

    /// Caller-supplied retry decision
    pub retry_custom: Option<RetryPredicate>,

    /// Navigation log capacity
    pub history: HistoryLimit,

    /// Proxy URL the transport routes through
    pub proxy: Option<String>,

    /// Extra handlers placed right before the transport, in order
    pub extra_handlers: Vec<Arc<dyn Handler>>,

    /// `Accept` header sent with each request
    pub accept: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            identity: Identity::Random,
            referer: true,
            cache: None,
            delay: None,
            retry_on_timeout: None,
            retry_on_error: None,
            retry_delay: RETRY_DELAY,
            retry_custom: None,
            history: HistoryLimit::default(),
            proxy: None,
            extra_handlers: Vec::new(),
            accept: DEFAULT_ACCEPT.to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("timeout", &self.timeout)
            .field("identity", &self.identity)
            .field("referer", &self.referer)
            .field("cache", &self.cache)
            .field("delay", &self.delay)
            .field("retry_on_timeout", &self.retry_on_timeout)
            .field("retry_on_error", &self.retry_on_error)
            .field("retry_delay", &self.retry_delay)
            .field("retry_custom", &self.retry_custom.is_some())
            .field("history", &self.history)
            .field("proxy", &self.proxy)
            .field(
                "extra_handlers",
                &self
                    .extra_handlers
                    .iter()
                    .map(|h| h.name())
                    .collect::<Vec<_>>(),
            )
            .field("accept", &self.accept)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_history_limit_never_below_one() {
        assert_eq!(HistoryLimit::Limit(0).max_len(), Some(1));
        assert_eq!(HistoryLimit::Limit(3).max_len(), Some(3));
        assert_eq!(HistoryLimit::Unbounded.max_len(), None);
    }

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, None);
        assert_eq!(config.identity, Identity::Random);
        assert!(config.referer);
        assert!(config.cache.is_none());
        assert_eq!(config.history, HistoryLimit::Limit(DEFAULT_HISTORY_LIMIT));
        assert_eq!(config.retry_delay, RETRY_DELAY);
        assert_eq!(config.accept, "*/*");
    }

    #[test]
    fn test_cache_config_new_uses_default_windows() {
        let cache = CacheConfig::new("/tmp/pages");
        assert_eq!(cache.path, PathBuf::from("/tmp/pages"));
        assert_eq!(cache.refresh_days, CACHE_REFRESH_DAYS);
        assert_eq!(cache.retain_days, CACHE_RETAIN_DAYS);
    }

    #[test]
    fn test_config_debug_hides_predicate() {
        let config = ClientConfig::default();
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("retry_custom: false"));
    }
}
