//! Error categorization.
//!
//! Maps transport failures onto the [`FetchError`] taxonomy so that retry
//! policies can tell connection failures, response timeouts and HTTP error
//! statuses apart after the error left the transport.

use super::types::FetchError;

/// Categorizes a `reqwest::Error` raised while fetching `url`.
///
/// Connection failures are checked before timeouts: a connect timeout reports
/// both flags in reqwest, but it belongs to the connection-establishment
/// category, which the timeout retry policy must not retry.
pub fn categorize_reqwest_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_connect() {
        return FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        };
    }
    if error.is_timeout() {
        return FetchError::Timeout {
            url: url.to_string(),
        };
    }
    if let Some(status) = error.status() {
        return FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        };
    }
    if error.is_builder() {
        return FetchError::InvalidUrl {
            url: url.to_string(),
        };
    }
    FetchError::Other {
        url: url.to_string(),
        message: error.to_string(),
    }
}
