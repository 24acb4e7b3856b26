//! Request shaping stages: timeout injection and URL fix-up.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::DEFAULT_TIMEOUT;
use crate::error_handling::FetchError;
use crate::fetch::{Request, Response};
use crate::handler::{Handler, Next};
use crate::utils::fix_url;

/// Sets the same network timeout on every request.
pub struct Timeout {
    timeout: Duration,
}

impl Timeout {
    /// Applies `timeout` to every request.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl Handler for Timeout {
    fn name(&self) -> &str {
        "timeout"
    }

    async fn handle(&self, mut request: Request, next: Next<'_>) -> Result<Response, FetchError> {
        request.timeout = Some(self.timeout);
        next.run(request).await
    }
}

/// Prefixes scheme-less URLs with `http://`.
pub struct FixUrl;

#[async_trait]
impl Handler for FixUrl {
    fn name(&self) -> &str {
        "fix-url"
    }

    async fn handle(&self, mut request: Request, next: Next<'_>) -> Result<Response, FetchError> {
        request.url = fix_url(&request.url);
        next.run(request).await
    }
}
