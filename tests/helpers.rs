// Shared test helpers for client setup against a mock server.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::time::Duration;

use webchain::{ClientConfig, Identity};

/// User-Agent sent by test clients, so mocks can match on it.
pub const TEST_AGENT: &str = "webchain-test/1.0";

/// A client configuration with a fixed identity, no referer inference and no
/// pause between retries.
pub fn test_config() -> ClientConfig {
    ClientConfig {
        identity: Identity::Fixed(TEST_AGENT.to_string()),
        referer: false,
        timeout: Some(Duration::from_secs(5)),
        retry_delay: Duration::ZERO,
        ..Default::default()
    }
}
