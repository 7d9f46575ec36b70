//! Configuration types for the relay.
//!
//! There are no config files, CLI flags, or environment lookups here: the
//! listening port and the upstream origin are deploy-time constants, so the
//! `Default` impls carry the deployed values and `main` runs straight off
//! them. Tests build the structs directly to point at local fixtures.

mod listen;
mod protocol;
mod retry;
mod upstream;

pub use listen::{ListenConfig, MetricsConfig};
pub use protocol::Protocol;
pub use retry::RetryConfig;
pub use upstream::{ConnectionPoolConfig, UpstreamConfig, UpstreamTarget};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub listen: ListenConfig,
    pub metrics: MetricsConfig,
    pub upstream: UpstreamConfig,
    pub retry: RetryConfig,
    pub connection_pool: ConnectionPoolConfig,
}

impl Config {
    /// Validate configuration before the server starts.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.upstream.host.is_empty() {
            anyhow::bail!("upstream host must not be empty");
        }
        if self.upstream.host.contains('/') {
            anyhow::bail!(
                "upstream host '{}' must be a bare authority, not a URL",
                self.upstream.host
            );
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if self.retry.attempt_timeout_secs == 0 {
            anyhow::bail!("retry.attempt_timeout_secs must be at least 1");
        }
        Ok(())
    }
}
