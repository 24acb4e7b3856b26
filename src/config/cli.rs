//! Command-line options of the `webchain` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use super::constants::{CACHE_REFRESH_DAYS, CACHE_RETAIN_DAYS, DEFAULT_PROXY};
use super::types::{CacheConfig, ClientConfig, Identity, LogFormat, LogLevel};

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Print a page
/// webchain example.com
///
/// # Cache pages for a week, retry flaky servers, go through the local proxy
/// webchain example.com --cache .webcache --refresh 7 --retries 3 --proxy
///
/// # Save to a file with a rotating identity
/// webchain example.com/page --output page.html --rotate-agent 10
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "webchain",
    about = "Fetches a web page through a configurable chain of handlers."
)]
pub struct Cli {
    /// URL to fetch (`http://` is assumed when no scheme is given)
    pub url: String,

    /// Write the page to this file instead of standard output
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Cache folder (enables the disk cache)
    #[arg(long, value_parser)]
    pub cache: Option<PathBuf>,

    /// Days a cached page is served without downloading it again
    #[arg(long, default_value_t = CACHE_REFRESH_DAYS)]
    pub refresh: f64,

    /// Days a cached page is kept on disk
    #[arg(long, default_value_t = CACHE_RETAIN_DAYS)]
    pub retain: f64,

    /// Minimum seconds between two requests
    #[arg(long, value_parser = parse_seconds)]
    pub delay: Option<Duration>,

    /// Per-request timeout in seconds
    #[arg(long, value_parser = parse_seconds)]
    pub timeout: Option<Duration>,

    /// Retries on failures other than timeouts, 403 and 404
    #[arg(long)]
    pub retries: Option<u32>,

    /// Retries on response timeouts
    #[arg(long)]
    pub retry_timeouts: Option<u32>,

    /// Fixed User-Agent string
    #[arg(long, conflicts_with_all = ["rotate_agent", "no_agent"])]
    pub user_agent: Option<String>,

    /// Pick a new random User-Agent every this many minutes
    #[arg(long, value_parser = parse_minutes, conflicts_with = "no_agent")]
    pub rotate_agent: Option<Duration>,

    /// Send no User-Agent header of our own
    #[arg(long)]
    pub no_agent: bool,

    /// Do not infer the Referer header
    #[arg(long)]
    pub no_referer: bool,

    /// Route requests through a proxy (the local default when no address is given)
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_PROXY)]
    pub proxy: Option<String>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Client configuration matching these options.
    pub fn client_config(&self) -> ClientConfig {
        let identity = if self.no_agent {
            Identity::Off
        } else if let Some(agent) = &self.user_agent {
            Identity::Fixed(agent.clone())
        } else if let Some(every) = self.rotate_agent {
            Identity::Rotating(every)
        } else {
            Identity::Random
        };

        ClientConfig {
            timeout: self.timeout,
            identity,
            referer: !self.no_referer,
            cache: self.cache.as_ref().map(|path| CacheConfig {
                path: path.clone(),
                refresh_days: self.refresh,
                retain_days: self.retain,
            }),
            delay: self.delay,
            retry_on_timeout: self.retry_timeouts,
            retry_on_error: self.retries,
            proxy: self.proxy.clone(),
            ..Default::default()
        }
    }
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value.parse().map_err(|e| format!("{e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("{e}"))
}

fn parse_minutes(value: &str) -> Result<Duration, String> {
    let minutes: f64 = value.parse().map_err(|e| format!("{e}"))?;
    Duration::try_from_secs_f64(minutes * 60.0).map_err(|e| format!("{e}"))
}
