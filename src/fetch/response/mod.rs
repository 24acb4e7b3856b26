//! Response model.

mod body;

use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;

use body::Body;

use crate::error_handling::FetchError;

/// A response travelling back up the handler chain.
///
/// Metadata is available immediately; the body is read from the network on
/// first access and cached for every clone of the response.
#[derive(Clone)]
pub struct Response {
    requested_url: String,
    final_url: String,
    status: u16,
    headers: HeaderMap,
    fetched_at: DateTime<Utc>,
    from_cache: bool,
    body: Body,
}

impl Response {
    /// Wraps a network response whose body has not been read yet.
    ///
    /// `requested_url` is kept verbatim. The final URL reported by the
    /// transport replaces it only when it designates a different resource, so
    /// that reqwest's normalization (a trailing `/` on a bare host) is not
    /// mistaken for a redirect.
    pub(crate) fn from_network(requested_url: &str, response: reqwest::Response) -> Self {
        let final_url = match url::Url::parse(requested_url) {
            Ok(parsed) if &parsed == response.url() => requested_url.to_string(),
            _ => response.url().to_string(),
        };
        Self {
            requested_url: requested_url.to_string(),
            final_url,
            status: response.status().as_u16(),
            headers: response.headers().clone(),
            fetched_at: Utc::now(),
            from_cache: false,
            body: Body::streaming(response),
        }
    }

    /// Builds a response whose body is already in memory.
    ///
    /// Used for cache hits and by handlers that synthesize responses.
    pub fn from_body(
        requested_url: impl Into<String>,
        final_url: impl Into<String>,
        status: u16,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            requested_url: requested_url.into(),
            final_url: final_url.into(),
            status,
            headers: HeaderMap::new(),
            fetched_at: Utc::now(),
            from_cache: false,
            body: Body::ready(body.into()),
        }
    }

    /// Replaces the response headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Overrides the retrieval timestamp (e.g. with the date a cached copy was stored).
    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }

    /// Marks whether the response was served from the disk cache.
    pub fn with_from_cache(mut self, from_cache: bool) -> Self {
        self.from_cache = from_cache;
        self
    }

    /// URL of the request, before any redirect.
    pub fn requested_url(&self) -> &str {
        &self.requested_url
    }

    /// URL of the content, after all redirects.
    pub fn final_url(&self) -> &str {
        &self.final_url
    }

    /// Final URL if a redirect happened, `None` otherwise.
    pub fn redirect(&self) -> Option<&str> {
        (self.final_url != self.requested_url).then_some(self.final_url.as_str())
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers, with case-insensitive names.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// When the content was retrieved from the network.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Whether the response was served from the disk cache.
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    /// Body bytes if they have already been read, without touching the network.
    pub fn loaded_body(&self) -> Option<&[u8]> {
        self.body.loaded()
    }

    /// Reads the body, from the network on first call and from memory afterwards.
    ///
    /// # Errors
    ///
    /// Returns a `FetchError` categorized like any transport failure if
    /// reading the stream fails (a body timeout is a `FetchError::Timeout`).
    pub async fn bytes(&self) -> Result<&[u8], FetchError> {
        self.body.read(&self.requested_url).await
    }

    /// Reads the body as text, replacing invalid UTF-8 sequences.
    pub async fn text(&self) -> Result<String, FetchError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("requested_url", &self.requested_url)
            .field("final_url", &self.final_url)
            .field("status", &self.status)
            .field("fetched_at", &self.fetched_at)
            .field("from_cache", &self.from_cache)
            .field("body_len", &self.body.loaded().map(<[u8]>::len))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_only_when_urls_differ() {
        let direct = Response::from_body("http://a.com/x", "http://a.com/x", 200, "");
        assert_eq!(direct.redirect(), None);

        let moved = Response::from_body("http://a.com/x", "http://b.com/y", 200, "");
        assert_eq!(moved.redirect(), Some("http://b.com/y"));
        assert_eq!(moved.final_url(), "http://b.com/y");
        assert_eq!(moved.requested_url(), "http://a.com/x");
    }

    #[tokio::test]
    async fn test_text_is_repeatable() {
        let resp = Response::from_body("http://a.com", "http://a.com", 200, "<p>hi</p>");
        assert_eq!(resp.text().await.unwrap(), "<p>hi</p>");
        assert_eq!(resp.text().await.unwrap(), "<p>hi</p>");
        assert_eq!(resp.loaded_body(), Some(&b"<p>hi</p>"[..]));
    }

    #[test]
    fn test_builder_setters() {
        let when = DateTime::from_timestamp(1_000_000, 0).unwrap();
        let resp = Response::from_body("http://a.com", "http://a.com", 200, "")
            .with_fetched_at(when)
            .with_from_cache(true);
        assert!(resp.from_cache());
        assert_eq!(resp.fetched_at(), when);
    }

    #[test]
    fn test_debug_omits_body() {
        let resp = Response::from_body("http://a.com", "http://a.com", 200, "secret");
        let rendered = format!("{:?}", resp);
        assert!(rendered.contains("body_len: Some(6)"));
        assert!(!rendered.contains("secret"));
    }
}
