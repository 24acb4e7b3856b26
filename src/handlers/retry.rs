//! Retry policies.
//!
//! Three stages share one shape: run the rest of the chain on a fresh copy of
//! the request, and on a qualifying failure sleep (with jitter) and try again,
//! until the attempt budget is spent. The last failure is returned unchanged.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;

use crate::config::{JITTER_SPREAD, RETRY_ATTEMPTS, RETRY_DELAY, RETRY_EXCLUDED_STATUS};
use crate::error_handling::{ErrorKind, FetchError};
use crate::fetch::{Request, Response};
use crate::handler::{Handler, Next};
use crate::utils::jitter;

/// Caller-supplied retry decision.
///
/// Called with the failure and the number of attempts made so far (starting at
/// 1). Returns the pause before the next attempt, or `None` (or a zero
/// duration) to give up and surface the failure.
pub type RetryPredicate = Arc<dyn Fn(&FetchError, u32) -> Option<Duration> + Send + Sync>;

/// A failure the generic retry policy gives up on immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// Every error of this category
    Kind(ErrorKind),
    /// HTTP error status with this code
    Status(u16),
}

impl Exclusion {
    fn matches(&self, error: &FetchError) -> bool {
        match self {
            Exclusion::Kind(kind) => error.kind() == *kind,
            Exclusion::Status(code) => error.status() == Some(*code),
        }
    }
}

/// Default exclusions of the generic policy: timeouts, 403 and 404.
pub fn default_exclusions() -> Vec<Exclusion> {
    std::iter::once(Exclusion::Kind(ErrorKind::Timeout))
        .chain(RETRY_EXCLUDED_STATUS.iter().map(|&code| Exclusion::Status(code)))
        .collect()
}

/// Retries on failures of the qualifying categories, except excluded ones.
pub struct RetryOnError {
    name: &'static str,
    attempts: u32,
    delay: Duration,
    kinds: Option<Vec<ErrorKind>>,
    exclude: Vec<Exclusion>,
}

impl RetryOnError {
    /// Retries any failure up to `attempts` times, `delay` apart, except
    /// timeouts and HTTP 403/404.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            name: "retry-on-error",
            attempts,
            delay,
            kinds: None,
            exclude: default_exclusions(),
        }
    }

    /// Restricts the qualifying failures to these categories.
    pub fn only(mut self, kinds: Vec<ErrorKind>) -> Self {
        self.kinds = Some(kinds);
        self
    }

    /// Replaces the exclusion list.
    pub fn exclude(mut self, exclude: Vec<Exclusion>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Maximum number of retries after the first attempt.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn qualifies(&self, error: &FetchError) -> bool {
        if self.exclude.iter().any(|x| x.matches(error)) {
            return false;
        }
        match &self.kinds {
            Some(kinds) => kinds.contains(&error.kind()),
            None => true,
        }
    }
}

impl Default for RetryOnError {
    /// `RETRY_ATTEMPTS` retries, `RETRY_DELAY` apart.
    fn default() -> Self {
        Self::new(RETRY_ATTEMPTS, RETRY_DELAY)
    }
}

#[async_trait]
impl Handler for RetryOnError {
    fn name(&self) -> &str {
        self.name
    }

    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response, FetchError> {
        let strategy = FixedInterval::new(self.delay)
            .map(|d| jitter(d, JITTER_SPREAD))
            .take(self.attempts as usize);

        let mut failures = 0u32;
        RetryIf::spawn(
            strategy,
            || next.run(request.clone()),
            |error: &FetchError| {
                failures += 1;
                if !self.qualifies(error) {
                    debug!("{}, not retrying {}: {}", self.name, request.url, error);
                    return false;
                }
                warn!(
                    "{}, attempt #{} for {} failed: {}",
                    self.name, failures, request.url, error
                );
                true
            },
        )
        .await
    }
}

/// Retries on response timeouts only.
///
/// Connection failures are a different category and are not retried, even
/// when the connection attempt itself timed out.
pub struct RetryOnTimeout(RetryOnError);

impl RetryOnTimeout {
    /// Retries response timeouts only, up to `attempts` times.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        let mut inner = RetryOnError::new(attempts, delay)
            .only(vec![ErrorKind::Timeout])
            .exclude(Vec::new());
        inner.name = "retry-on-timeout";
        Self(inner)
    }

    /// Maximum number of retries after the first attempt.
    pub fn attempts(&self) -> u32 {
        self.0.attempts
    }
}

impl Default for RetryOnTimeout {
    fn default() -> Self {
        Self::new(RETRY_ATTEMPTS, RETRY_DELAY)
    }
}

#[async_trait]
impl Handler for RetryOnTimeout {
    fn name(&self) -> &str {
        self.0.name
    }

    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response, FetchError> {
        self.0.handle(request, next).await
    }
}

/// Retries as long as a caller-supplied predicate asks for it.
pub struct RetryCustom {
    test: RetryPredicate,
}

impl RetryCustom {
    /// Retries whenever `test` returns a non-zero pause.
    pub fn new(test: RetryPredicate) -> Self {
        Self { test }
    }
}

#[async_trait]
impl Handler for RetryCustom {
    fn name(&self) -> &str {
        "retry-custom"
    }

    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response, FetchError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let error = match next.run(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };
            let delay = match (self.test)(&error, attempt) {
                Some(delay) if !delay.is_zero() => jitter(delay, JITTER_SPREAD),
                _ => return Err(error),
            };
            warn!(
                "retry-custom, attempt #{} for {} failed, trying again after {:.1}s: {}",
                attempt,
                request.url,
                delay.as_secs_f64(),
                error
            );
            tokio::time::sleep(delay).await;
        }
    }
}
