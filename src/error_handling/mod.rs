//! Error handling.
//!
//! This module provides:
//! - The [`FetchError`] taxonomy surfaced by handler chains
//! - [`ErrorKind`] categories used by retry policies
//! - Categorization of transport errors
//!
//! Failures are categorized into:
//! - **Connect**: the connection could not be established
//! - **Timeout**: the server did not answer in time
//! - **Status**: the server answered with an error status
//! - **Other**: everything else the transport reports

mod categorization;
mod types;

// Re-export public API
pub use categorization::categorize_reqwest_error;
pub use types::{ErrorKind, FetchError, InitializationError};
