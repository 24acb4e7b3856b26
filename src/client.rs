//! Client facade.
//!
//! [`WebClient`] turns a [`ClientConfig`] into a handler chain and offers a
//! browser-like API on top of it: open pages, read them, save them, and move
//! back and forward through what was visited.

use std::path::Path;
use std::sync::Arc;

use log::{info, LevelFilter};
use reqwest::header::ACCEPT;

use crate::config::{CacheConfig, ClientConfig, IP_ECHO_URL};
use crate::error_handling::{FetchError, InitializationError};
use crate::fetch::{Request, Response};
use crate::handler::{ChainItem, Handler, Pipeline, Toggle};
use crate::handlers::{
    Cache, Delay, History, Referer, RetryCustom, RetryOnError, RetryOnTimeout, Timeout, Transport,
    UserAgent,
};
use crate::initialization::{init_client, set_log_level};
use crate::utils::fix_url;

/// A configurable web client.
///
/// Requests pass through the stages below, in this order, each present only
/// when configured:
///
/// history, cache, user-agent, referer, timeout, retry-custom,
/// retry-on-error, retry-on-timeout, delay, extra handlers, transport.
///
/// History is always present, so the last response stays available for
/// [`WebClient::response`] with no URL and for referer inference.
///
/// # Examples
///
/// ```no_run
/// use webchain::{CacheConfig, ClientConfig, WebClient};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = WebClient::new(ClientConfig {
///     cache: Some(CacheConfig::new(".webcache")),
///     retry_on_error: Some(2),
///     ..Default::default()
/// })?;
///
/// let page = client.get(Some("example.com")).await?;
/// println!("{} bytes, final URL {:?}", page.len(), client.final_url());
/// # Ok(())
/// # }
/// ```
pub struct WebClient {
    config: ClientConfig,
    history: Arc<History>,
    cache: Option<Arc<Toggle<Cache>>>,
    agent: Option<Arc<UserAgent>>,
    delay: Option<Arc<Delay>>,
    transport: Arc<dyn Handler>,
    pipeline: Pipeline,
}

impl WebClient {
    /// Builds a client that talks to the network.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the HTTP client (or its
    /// proxy) cannot be set up, or `InitializationError::CacheError` if the
    /// cache folder cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, InitializationError> {
        let http = init_client(config.proxy.as_deref())?;
        Self::with_transport(config, Arc::new(Transport::new(http)))
    }

    /// Builds a client whose terminal stage is `transport` instead of the
    /// network. `config.proxy` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::CacheError` if the cache folder cannot be
    /// created.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Handler>,
    ) -> Result<Self, InitializationError> {
        let cache = open_cache(config.cache.as_ref())?;
        let history = Arc::new(History::new(config.history));
        let agent = UserAgent::from_identity(&config.identity).map(Arc::new);
        let delay = config.delay.map(|d| Arc::new(Delay::new(d)));
        let mut client = Self {
            config,
            history,
            cache,
            agent,
            delay,
            transport,
            pipeline: Pipeline::default(),
        };
        client.rebuild();
        Ok(client)
    }

    /// Swaps in a chain built from the current configuration.
    ///
    /// Stages that carry state between requests (history, identity, dispatch
    /// spacing) are reused, so the identity and the last dispatch instant
    /// survive a reconfiguration.
    fn rebuild(&mut self) {
        self.pipeline = build_pipeline(self);
    }

    /// With a URL, opens it like [`WebClient::open`]. Without one, returns the
    /// current page of the history (moved by `back`/`forward`).
    ///
    /// # Errors
    ///
    /// Returns `FetchError::NoResponse` if no URL is given and nothing has been
    /// visited, otherwise whatever [`WebClient::open`] returns.
    pub async fn response(&self, url: Option<&str>) -> Result<Response, FetchError> {
        match url {
            Some(url) => self.open(url).await,
            None => self
                .history
                .last()
                .map(|entry| entry.response)
                .ok_or(FetchError::NoResponse),
        }
    }

    /// Requests `url` through the chain.
    ///
    /// `http://` is prepended when the URL has no scheme. The page is recorded
    /// in the history on success.
    ///
    /// # Errors
    ///
    /// Returns the `FetchError` surfaced by the chain once retries, if any, are
    /// exhausted.
    pub async fn open(&self, url: &str) -> Result<Response, FetchError> {
        let mut request = Request::new(fix_url(url));
        request.set_header(ACCEPT, &self.config.accept)?;
        self.pipeline.handle(request).await
    }

    /// Returns the body of `url`, or of the current page if `url` is `None`.
    ///
    /// # Errors
    ///
    /// Same as [`WebClient::response`], plus failures while reading the body.
    pub async fn get(&self, url: Option<&str>) -> Result<String, FetchError> {
        self.response(url).await?.text().await
    }

    /// Saves the body of `url` (or of the current page) to `path`, replacing
    /// the file if it exists.
    ///
    /// # Errors
    ///
    /// Same as [`WebClient::get`], plus `FetchError::Io` if the file cannot be
    /// written.
    pub async fn download(&self, path: impl AsRef<Path>, url: Option<&str>) -> Result<(), FetchError> {
        let path = path.as_ref();
        let response = self.response(url).await?;
        let body = response.bytes().await?;
        tokio::fs::write(path, body)
            .await
            .map_err(|e| FetchError::io(path, e))?;
        info!("Saved {} to {}", response.final_url(), path.display());
        Ok(())
    }

    /// Final URL of the current page if it was reached through a redirect.
    pub fn redirect(&self) -> Option<String> {
        self.history
            .last()
            .and_then(|entry| entry.response.redirect().map(str::to_string))
    }

    /// Final URL of the current page.
    pub fn final_url(&self) -> Option<String> {
        self.history
            .last()
            .map(|entry| entry.response.final_url().to_string())
    }

    /// Moves one page back; `None` at the oldest page.
    pub fn back(&self) -> Option<Response> {
        self.history.back().map(|entry| entry.response)
    }

    /// Moves one page forward; `None` at the newest page.
    pub fn forward(&self) -> Option<Response> {
        self.history.forward().map(|entry| entry.response)
    }

    /// Clears the history.
    pub fn reset(&self) {
        self.history.reset();
    }

    /// The navigation log.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Configuration the current chain was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The active chain.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The disk cache, if configured.
    pub fn cache(&self) -> Option<&Cache> {
        self.cache.as_deref().map(|toggle| &**toggle)
    }

    /// Replaces the cache configuration and rebuilds the chain. `None` removes
    /// the cache stage; files on disk are kept either way.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::CacheError` if the new folder cannot be
    /// created; the client is left unchanged in that case.
    pub fn set_cache(&mut self, cache: Option<CacheConfig>) -> Result<(), InitializationError> {
        let opened = open_cache(cache.as_ref())?;
        self.config.cache = cache;
        self.cache = opened;
        self.rebuild();
        Ok(())
    }

    /// Resumes serving and storing pages in the cache.
    pub fn enable_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.enable();
        }
    }

    /// Bypasses the cache without removing it from the chain.
    pub fn disable_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.disable();
        }
    }

    /// Whether requests currently go through the cache.
    pub fn cache_enabled(&self) -> bool {
        self.cache.as_ref().is_some_and(|cache| cache.is_enabled())
    }

    /// Changes the level of log records emitted by the client.
    pub fn set_log_level(&self, level: LevelFilter) {
        set_log_level(level);
    }

    /// Asks a plain-text echo service (by default [`IP_ECHO_URL`]) which IP
    /// address the client's requests come from, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Same as [`WebClient::get`].
    pub async fn check_ip(&self, url: Option<&str>) -> Result<String, FetchError> {
        let was_enabled = self.cache_enabled();
        self.disable_cache();
        let result = self.get(Some(url.unwrap_or(IP_ECHO_URL))).await;
        if was_enabled {
            self.enable_cache();
        }
        Ok(result?.trim().to_string())
    }
}

fn open_cache(config: Option<&CacheConfig>) -> Result<Option<Arc<Toggle<Cache>>>, InitializationError> {
    config
        .map(|config| Cache::new(config).map(|cache| Arc::new(Toggle::new(cache))))
        .transpose()
}

fn stage<H: Handler + 'static>(handler: H) -> Arc<dyn Handler> {
    Arc::new(handler)
}

fn build_pipeline(client: &WebClient) -> Pipeline {
    let config = &client.config;
    let history = &client.history;
    let items: Vec<ChainItem> = vec![
        ChainItem::from(history.clone() as Arc<dyn Handler>),
        client.cache.clone().map(|cache| cache as Arc<dyn Handler>).into(),
        client.agent.clone().map(|agent| agent as Arc<dyn Handler>).into(),
        config
            .referer
            .then(|| stage(Referer::new(history.clone())))
            .into(),
        config.timeout.map(|t| stage(Timeout::new(t))).into(),
        config
            .retry_custom
            .clone()
            .map(|test| stage(RetryCustom::new(test)))
            .into(),
        config
            .retry_on_error
            .map(|n| stage(RetryOnError::new(n, config.retry_delay)))
            .into(),
        config
            .retry_on_timeout
            .map(|n| stage(RetryOnTimeout::new(n, config.retry_delay)))
            .into(),
        client.delay.clone().map(|delay| delay as Arc<dyn Handler>).into(),
        config.extra_handlers.clone().into(),
        ChainItem::from(client.transport.clone()),
    ];
    Pipeline::chain(items)
}
