//! Shared HTTP client used for forwarding.

use crate::config::Config;
use anyhow::Context;
use bytes::Bytes;
use http_body_util::Full;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tracing::debug;

/// Type alias for the relay's upstream client.
pub type HttpClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Create the shared client with connection pooling.
///
/// HTTPS with the platform's root store, HTTP/1.1 only. Plain HTTP is also
/// allowed so tests can point the relay at a local fixture. Redirects are
/// never followed; hyper's client has no redirect handling, which is
/// exactly the manual-redirect semantics the forwarder needs.
pub fn create_http_client(config: &Config) -> Result<HttpClient, anyhow::Error> {
    let mut http_connector = HttpConnector::new();
    http_connector.set_keepalive(Some(Duration::from_secs(
        config.connection_pool.keepalive_timeout_secs,
    )));
    http_connector.set_connect_timeout(Some(Duration::from_secs(
        config.connection_pool.connect_timeout_secs,
    )));
    http_connector.enforce_http(false);

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()
        .context("failed to load native root certificates")?
        .https_or_http()
        .enable_http1()
        .wrap_connector(http_connector);

    let client = Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(config.connection_pool.idle_timeout_secs))
        .pool_max_idle_per_host(config.connection_pool.max_idle_per_host)
        .build(https_connector);

    debug!(
        max_idle = config.connection_pool.max_idle_per_host,
        idle_timeout_secs = config.connection_pool.idle_timeout_secs,
        keepalive_secs = config.connection_pool.keepalive_timeout_secs,
        connect_timeout_secs = config.connection_pool.connect_timeout_secs,
        "connection pool configured"
    );

    Ok(client)
}
