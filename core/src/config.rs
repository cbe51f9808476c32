//! Tunables for the executor and the ureq transport.

use std::time::Duration;

use serde::Deserialize;

/// Retry policy of a `RequestExecutor`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl ExecutorConfig {
    /// Attempt budget, never below one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 100,
        }
    }
}

/// Socket behavior of `UreqTransport`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub connect_timeout_ms: u64,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            timeout_ms: 10_000,
            user_agent: concat!("device-http/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
