//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources a client
//! needs before its handler chain is built:
//! - HTTP client (redirect policy, optional proxy)
//! - Logger (plain or JSON, runtime level changes)
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

// Re-export public API
pub use client::init_client;
pub use logger::{init_logger_with, set_log_level};
