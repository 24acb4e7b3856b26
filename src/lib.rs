//! webchain library: a configurable HTTP client built as a chain of handlers
//!
//! Each concern of web access lives in its own stage: disk caching, retries,
//! request spacing, user-agent rotation, referer inference and browsing
//! history. [`WebClient`] assembles the stages from a [`ClientConfig`];
//! custom chains can be built directly with [`Pipeline::chain`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use webchain::{CacheConfig, ClientConfig, Identity, WebClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = WebClient::new(ClientConfig {
//!     timeout: Some(Duration::from_secs(30)),
//!     identity: Identity::Rotating(Duration::from_secs(600)),
//!     cache: Some(CacheConfig::new(".webcache")),
//!     delay: Some(Duration::from_secs(2)),
//!     retry_on_timeout: Some(2),
//!     ..Default::default()
//! })?;
//!
//! let page = client.get(Some("https://www.rust-lang.org")).await?;
//! println!("{} bytes, redirected to {:?}", page.len(), client.redirect());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

mod client;
pub mod config;
mod error_handling;
mod fetch;
pub mod handler;
pub mod handlers;
pub mod initialization;
mod utils;

// Re-export public API
pub use client::WebClient;
pub use config::{CacheConfig, ClientConfig, HistoryLimit, Identity, LogFormat, LogLevel};
pub use error_handling::{categorize_reqwest_error, ErrorKind, FetchError, InitializationError};
pub use fetch::{Request, Response};
pub use handler::{ChainItem, Handler, Next, Pipeline, Toggle};
pub use utils::{fix_url, jitter};
