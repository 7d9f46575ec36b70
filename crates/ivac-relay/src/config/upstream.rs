//! Upstream origin and connection pool configuration.

use super::protocol::Protocol;
use hyper::header::{HeaderValue, InvalidHeaderValue};

/// The single fixed origin all requests are forwarded to.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: "payment.ivacbd.com".to_string(),
            port: 443,
            protocol: Protocol::Https,
        }
    }
}

impl UpstreamConfig {
    /// Authority as it appears in a `Host` header: the port is spelled out
    /// only when it differs from the scheme default.
    pub fn authority(&self) -> String {
        if self.port == self.protocol.default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Origin URL (scheme + authority), the base every target URL starts from.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol.as_str(), self.authority())
    }

    /// Precompute the identity substituted into every outbound request.
    pub fn target(&self) -> Result<UpstreamTarget, InvalidHeaderValue> {
        Ok(UpstreamTarget {
            base: self.base_url(),
            host: HeaderValue::from_str(&self.authority())?,
            origin: HeaderValue::from_str(&self.base_url())?,
        })
    }
}

/// Resolved upstream identity: the URL base plus the ready-made header
/// values stamped onto outbound requests.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    pub base: String,
    pub host: HeaderValue,
    pub origin: HeaderValue,
}

#[derive(Debug, Clone)]
pub struct ConnectionPoolConfig {
    pub max_idle_per_host: usize,
    pub idle_timeout_secs: u64,
    pub keepalive_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: default_pool_max_idle_per_host(),
            idle_timeout_secs: default_pool_idle_timeout(),
            keepalive_timeout_secs: default_keepalive_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_pool_max_idle_per_host() -> usize {
    100
}

fn default_pool_idle_timeout() -> u64 {
    90
}

fn default_keepalive_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    5
}
