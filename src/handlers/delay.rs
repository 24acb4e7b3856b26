//! Dispatch spacing.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::{DEFAULT_DELAY, JITTER_SPREAD};
use crate::error_handling::FetchError;
use crate::fetch::{Request, Response};
use crate::handler::{Handler, Next};
use crate::utils::jitter;

/// Keeps consecutive dispatches at least `interval` apart (±10% jitter).
///
/// The dispatch instant is recorded right before forwarding, not when the
/// response comes back, so attempts replayed by a retry stage placed above
/// are spaced like any other request.
pub struct Delay {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Delay {
    /// Keeps dispatches at least `interval` apart, give or take the jitter.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Configured minimum spacing, before jitter.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn remaining_wait(&self) -> Duration {
        let interval = jitter(self.interval, JITTER_SPREAD);
        let last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        last.map(|t| interval.saturating_sub(t.elapsed()))
            .unwrap_or_default()
    }
}

impl Default for Delay {
    /// Spacing of `DEFAULT_DELAY` (1.5 s).
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

#[async_trait]
impl Handler for Delay {
    fn name(&self) -> &str {
        "delay"
    }

    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response, FetchError> {
        let wait = self.remaining_wait();
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        next.run(request).await
    }
}
