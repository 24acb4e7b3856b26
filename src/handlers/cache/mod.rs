//! Disk cache.
//!
//! Pages are stored on disk under their final URL. A redirect leaves a marker
//! under the requested URL pointing at the final one, so a later request for
//! the original URL is answered from the target's copy without a network call.
//!
//! Entries younger than the refresh window are served. Older ones are kept
//! until the retention window passes, then removed by a background sweep.

mod store;
mod sweep;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};

use store::Store;
use sweep::Sweeper;

use crate::config::{
    CacheConfig, CACHE_CONTENT_EXT, CACHE_MIN_SWEEP_INTERVAL, CACHE_REDIRECT_EXT,
    CACHE_REFRESH_DAYS, CACHE_SWEEP_FRACTION, SECS_PER_DAY,
};
use crate::error_handling::{FetchError, InitializationError};
use crate::fetch::{Request, Response};
use crate::handler::{Handler, Next};

fn days(days: f64) -> Duration {
    Duration::try_from_secs_f64(days * SECS_PER_DAY).unwrap_or(Duration::ZERO)
}

/// Serves pages from disk while fresh and stores what the rest of the chain
/// downloads.
pub struct Cache {
    store: Store,
    refresh: Duration,
    retain: Duration,
    sweeper: Sweeper,
}

impl Cache {
    /// Opens (creating if needed) the cache folder described by `config`.
    ///
    /// A refresh window of zero or less falls back to the default of one day;
    /// the retain window is raised to the refresh window if smaller.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::CacheError` if the folder cannot be created.
    pub fn new(config: &CacheConfig) -> Result<Self, InitializationError> {
        std::fs::create_dir_all(&config.path).map_err(|source| InitializationError::CacheError {
            path: config.path.clone(),
            source,
        })?;

        let mut refresh = days(config.refresh_days);
        if refresh.is_zero() {
            refresh = days(CACHE_REFRESH_DAYS);
        }
        let retain = days(config.retain_days).max(refresh);
        let interval = refresh
            .mul_f64(CACHE_SWEEP_FRACTION)
            .max(CACHE_MIN_SWEEP_INTERVAL);

        Ok(Self {
            store: Store::new(&config.path),
            refresh,
            retain,
            sweeper: Sweeper::new(config.path.clone(), retain, interval),
        })
    }

    /// Cache root folder.
    pub fn path(&self) -> &Path {
        self.store.dir()
    }

    /// Freshness window.
    pub fn refresh(&self) -> Duration {
        self.refresh
    }

    /// Retention window, never shorter than the freshness window.
    pub fn retain(&self) -> Duration {
        self.retain
    }

    /// Minimum time between two sweeps.
    pub fn sweep_interval(&self) -> Duration {
        self.sweeper.interval()
    }

    /// Cancels a running background sweep. Stored pages are kept.
    pub fn shutdown(&self) {
        self.sweeper.cancel();
    }

    /// Looks `url` up, following a redirect marker if one is fresh.
    async fn lookup(&self, url: &str) -> Result<Option<Response>, FetchError> {
        let marker = self
            .store
            .read_fresh(url, CACHE_REDIRECT_EXT, self.refresh)
            .await?;
        let target = match &marker {
            Some(marker) => String::from_utf8_lossy(&marker.content).trim().to_string(),
            None => url.to_string(),
        };
        let Some(content) = self
            .store
            .read_fresh(&target, CACHE_CONTENT_EXT, self.refresh)
            .await?
        else {
            return Ok(None);
        };

        let stored_at = match &marker {
            Some(marker) => marker.stored_at.min(content.stored_at),
            None => content.stored_at,
        };
        if target == url {
            info!("Loaded from cache: {}", url);
        } else {
            info!("Loaded from cache: {} -> {}", url, target);
        }
        Ok(Some(
            Response::from_body(url, target, 200, content.content)
                .with_fetched_at(DateTime::<Utc>::from(stored_at))
                .with_from_cache(true),
        ))
    }

    /// Saves the body under the final URL, plus a marker if a redirect happened.
    async fn save(&self, response: &Response) -> Result<(), FetchError> {
        let body = response.bytes().await?;
        self.store
            .write(response.final_url(), CACHE_CONTENT_EXT, body)
            .await?;
        if let Some(target) = response.redirect() {
            self.store
                .write(response.requested_url(), CACHE_REDIRECT_EXT, target.as_bytes())
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Handler for Cache {
    fn name(&self) -> &str {
        "cache"
    }

    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response, FetchError> {
        match self.lookup(&request.url).await {
            Ok(Some(response)) => return Ok(response),
            Ok(None) => {}
            Err(e) => warn!("Cache lookup failed, fetching instead: {}", e),
        }

        let response = next.run(request).await?;
        match self.save(&response).await {
            Ok(()) => match response.redirect() {
                Some(target) => info!(
                    "Downloaded from web: {} -> {}",
                    response.requested_url(),
                    target
                ),
                None => info!("Downloaded from web: {}", response.requested_url()),
            },
            // Body read failures are the caller's to see; storage failures are not
            Err(e @ FetchError::Io { .. }) => warn!("Failed to store page in cache: {}", e),
            Err(e) => return Err(e),
        }

        self.sweeper.maybe_sweep().await;
        Ok(response)
    }
}
