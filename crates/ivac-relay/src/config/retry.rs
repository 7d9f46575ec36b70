//! Retry policy for upstream attempts.

use std::time::Duration;

/// Policy the forwarder applies to transport-level failures. HTTP statuses
/// are never retried; only failed attempts (connect error, DNS failure,
/// per-attempt timeout) consume the budget.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// First backoff delay; each further delay doubles.
    pub base_delay_ms: u64,
    /// Upper bound on a single send, so a hung upstream cannot pin the
    /// request forever.
    pub attempt_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            attempt_timeout_secs: default_attempt_timeout(),
        }
    }
}

impl RetryConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_attempt_timeout() -> u64 {
    30
}
