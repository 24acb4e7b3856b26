//! Request model.

use std::time::Duration;

use reqwest::header::{AsHeaderName, HeaderMap, HeaderName, HeaderValue};

use crate::error_handling::FetchError;

/// A request travelling down the handler chain.
///
/// Handlers add headers and a timeout on the way down. `Clone` is the explicit
/// value copy taken by retry policies before each attempt and by the history
/// log, so mutations made during one attempt never leak into the next.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// URL to fetch
    pub url: String,
    /// Request headers; names are case-insensitive
    pub headers: HeaderMap,
    /// Network deadline for this request
    pub timeout: Option<Duration>,
}

impl Request {
    /// Creates a request for `url` with no headers and no timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HeaderMap::new(),
            timeout: None,
        }
    }

    /// Sets a header, replacing any previous value under the same name.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidHeader` if `value` contains characters
    /// not allowed in a header value.
    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<(), FetchError> {
        let value = HeaderValue::from_str(value).map_err(|_| FetchError::InvalidHeader {
            name: name.to_string(),
        })?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Returns a header value as text, if present and valid UTF-8.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
