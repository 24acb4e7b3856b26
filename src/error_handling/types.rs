//! Error type definitions.
//!
//! This module defines the failure categories surfaced by the handler chain and
//! the errors raised while setting the client up.

use std::path::PathBuf;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error preparing the cache folder or its state file.
    #[error("Cache initialization error at {path}: {source}")]
    CacheError {
        /// Folder or file that could not be prepared
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },
}

/// Failure surfaced by a handler chain.
///
/// Every network-level variant carries the URL that was requested, so callers
/// can report the offending page after retries gave up.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The connection could not be established (DNS failure, refused, unreachable).
    #[error("failed to connect to {url}: {message}")]
    Connect {
        /// Requested URL
        url: String,
        /// Transport description of the failure
        message: String,
    },

    /// The server did not answer within the request timeout.
    #[error("timed out waiting for response from {url}")]
    Timeout {
        /// Requested URL
        url: String,
    },

    /// The server answered with a client or server error status.
    #[error("HTTP {status} for {url}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Any other transport failure (body read, decoding, protocol errors).
    #[error("request to {url} failed: {message}")]
    Other {
        /// Requested URL
        url: String,
        /// Transport description of the failure
        message: String,
    },

    /// The URL could not be parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// Offending URL
        url: String,
    },

    /// A header name or value was rejected.
    #[error("invalid header {name}")]
    InvalidHeader {
        /// Header name
        name: String,
    },

    /// Reading or writing a local file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// A stage forwarded past the end of the chain (no terminal handler).
    #[error("request reached the end of the handler chain without a transport")]
    EndOfChain,

    /// No response is available (nothing visited yet).
    #[error("no response available: no page has been visited")]
    NoResponse,
}

/// Category of a [`FetchError`], used by retry policies to decide what qualifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorKind {
    /// Connection-establishment failure
    Connect,
    /// Response timeout
    Timeout,
    /// HTTP error status
    Status,
    /// Unclassified transport failure
    Other,
    /// Malformed URL
    InvalidUrl,
    /// Malformed header
    InvalidHeader,
    /// Local file error
    Io,
    /// Chain misconfiguration
    EndOfChain,
    /// Nothing visited yet
    NoResponse,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorKind {
    /// Human-readable name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Connect => "HTTP connect error",
            ErrorKind::Timeout => "HTTP timeout error",
            ErrorKind::Status => "HTTP status error",
            ErrorKind::Other => "HTTP request error",
            ErrorKind::InvalidUrl => "Invalid URL",
            ErrorKind::InvalidHeader => "Invalid header",
            ErrorKind::Io => "I/O error",
            ErrorKind::EndOfChain => "End of handler chain",
            ErrorKind::NoResponse => "No response",
        }
    }
}

impl FetchError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Connect { .. } => ErrorKind::Connect,
            FetchError::Timeout { .. } => ErrorKind::Timeout,
            FetchError::Status { .. } => ErrorKind::Status,
            FetchError::Other { .. } => ErrorKind::Other,
            FetchError::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            FetchError::InvalidHeader { .. } => ErrorKind::InvalidHeader,
            FetchError::Io { .. } => ErrorKind::Io,
            FetchError::EndOfChain => ErrorKind::EndOfChain,
            FetchError::NoResponse => ErrorKind::NoResponse,
        }
    }

    /// HTTP status code, for [`FetchError::Status`] only.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// URL the failing request was made for, when known.
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Connect { url, .. }
            | FetchError::Timeout { url }
            | FetchError::Status { url, .. }
            | FetchError::Other { url, .. }
            | FetchError::InvalidUrl { url } => Some(url),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_error_kind_as_str() {
        assert_eq!(ErrorKind::Timeout.as_str(), "HTTP timeout error");
        assert_eq!(ErrorKind::Connect.as_str(), "HTTP connect error");
        assert_eq!(ErrorKind::Status.to_string(), "HTTP status error");
    }

    #[test]
    fn test_all_error_kinds_have_string_representation() {
        for kind in ErrorKind::iter() {
            assert!(!kind.as_str().is_empty(), "{:?} should have a name", kind);
        }
    }

    #[test]
    fn test_kind_and_status() {
        let err = FetchError::Status {
            url: "http://example.com/missing".into(),
            status: 404,
        };
        assert_eq!(err.kind(), ErrorKind::Status);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.url(), Some("http://example.com/missing"));
        assert_eq!(err.to_string(), "HTTP 404 for http://example.com/missing");

        let err = FetchError::Timeout {
            url: "http://example.com".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_connect_and_timeout_are_distinct() {
        let connect = FetchError::Connect {
            url: "http://unreachable.invalid".into(),
            message: "dns error".into(),
        };
        assert_ne!(connect.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_chain_errors_have_no_url() {
        assert_eq!(FetchError::EndOfChain.url(), None);
        assert_eq!(FetchError::NoResponse.kind(), ErrorKind::NoResponse);
    }
}
