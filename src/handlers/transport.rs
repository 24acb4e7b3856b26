//! Terminal network stage.

use async_trait::async_trait;
use log::info;

use crate::error_handling::{categorize_reqwest_error, FetchError};
use crate::fetch::{Request, Response};
use crate::handler::{Handler, Next};

/// Performs the network call with reqwest; always the last stage of a chain.
///
/// Redirects are followed by the underlying client; the returned response
/// keeps the requested URL and exposes the final one. Error statuses (4xx and
/// 5xx) are surfaced as `FetchError::Status` so retry policies can inspect
/// the code.
///
/// The body is read before returning, so a stalled or broken body is a failed
/// attempt for the retry stages above.
pub struct Transport {
    client: reqwest::Client,
}

impl Transport {
    /// Sends requests with `client`.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Handler for Transport {
    fn name(&self) -> &str {
        "transport"
    }

    async fn handle(&self, request: Request, _next: Next<'_>) -> Result<Response, FetchError> {
        let url = url::Url::parse(&request.url).map_err(|_| FetchError::InvalidUrl {
            url: request.url.clone(),
        })?;
        info!("Downloading {}", request.url);

        let mut builder = self.client.get(url).headers(request.headers.clone());
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(&request.url, e))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Status {
                url: request.url,
                status: status.as_u16(),
            });
        }
        let response = Response::from_network(&request.url, response);
        response.bytes().await?;
        Ok(response)
    }
}
