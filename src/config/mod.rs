//! Configuration: client settings, command-line options and defaults.

mod cli;
mod constants;
mod types;

pub use cli::Cli;
pub use constants::*;
pub use types::{CacheConfig, ClientConfig, HistoryLimit, Identity, LogFormat, LogLevel};
