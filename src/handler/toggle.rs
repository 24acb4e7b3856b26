//! Switchable handler wrapper.

use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::{Handler, Next};
use crate::error_handling::FetchError;
use crate::fetch::{Request, Response};

/// Wraps a handler so its policy can be switched off and on at runtime.
///
/// A disabled handler keeps its place in the chain but forwards every request
/// unmodified; its own state (e.g. cache contents on disk) is left untouched.
pub struct Toggle<H> {
    inner: H,
    enabled: AtomicBool,
}

impl<H> Toggle<H> {
    /// Wraps `inner`, enabled.
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            enabled: AtomicBool::new(true),
        }
    }

    /// Restores the wrapped policy.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    /// Bypasses the wrapped policy.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    /// Whether the wrapped policy is applied.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

impl<H> Deref for Toggle<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<H: Handler> Handler for Toggle<H> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response, FetchError> {
        if self.is_enabled() {
            self.inner.handle(request, next).await
        } else {
            next.run(request).await
        }
    }
}
