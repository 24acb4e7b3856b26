//! Utility functions shared by handlers.
//!
//! This module provides:
//! - Random jitter for delays and back-off sleeps
//! - URL fix-up and prefix comparison

mod timing;
mod url;

pub use timing::jitter;
pub use url::{common_prefix_len, fix_url};
