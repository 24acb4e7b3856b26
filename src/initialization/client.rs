//! HTTP client initialization.
//!
//! This module builds the reqwest client used by the transport stage.

use reqwest::{ClientBuilder, Proxy};

use crate::config::MAX_REDIRECT_HOPS;

/// Initializes the HTTP client behind the transport stage.
///
/// Creates a `reqwest::Client` configured with:
/// - Redirect following (up to `MAX_REDIRECT_HOPS` hops)
/// - All traffic routed through `proxy` when given
///
/// Timeouts and headers are set per request by the handler chain, so none are
/// configured here.
///
/// # Errors
///
/// Returns a `reqwest::Error` if the proxy URL is invalid or client creation fails.
pub fn init_client(proxy: Option<&str>) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder =
        ClientBuilder::new().redirect(reqwest::redirect::Policy::limited(MAX_REDIRECT_HOPS));
    if let Some(proxy) = proxy {
        builder = builder.proxy(Proxy::all(proxy)?);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_client_without_proxy() {
        assert!(init_client(None).is_ok());
    }

    #[test]
    fn test_init_client_with_proxy() {
        assert!(init_client(Some(crate::config::DEFAULT_PROXY)).is_ok());
    }
}
