//! RelayServer struct and accept loop.

use crate::config::{Config, UpstreamTarget};
use crate::metrics;
use crate::proxy::client::{create_http_client, HttpClient};
use crate::proxy::handler::{handle_request, RelayContext};
use anyhow::Context;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// The relay server: validated config, resolved upstream identity, and the
/// shared client. Everything here is read-only once built; concurrent
/// requests need no coordination.
pub struct RelayServer {
    config: Arc<Config>,
    target: UpstreamTarget,
    http_client: HttpClient,
}

impl RelayServer {
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        config.validate()?;
        let target = config
            .upstream
            .target()
            .context("upstream host is not a valid header value")?;
        let http_client = create_http_client(&config)?;

        Ok(Self {
            config: Arc::new(config),
            target,
            http_client,
        })
    }

    /// Bind the configured port and serve until the process dies.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.listen.port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        if self.config.metrics.enabled {
            let metrics_port = self.config.metrics.port;
            tokio::spawn(async move {
                if let Err(err) = metrics::serve(metrics_port).await {
                    error!(error = %err, "metrics listener failed");
                }
            });
        }

        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener. Split out from
    /// `run` so tests can bind an ephemeral port.
    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        let addr = listener.local_addr()?;
        info!("Listening on http://{}", addr);
        info!("Relaying to {}", self.target.base);

        let server = Arc::new(self);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let server = Arc::clone(&server);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let server = Arc::clone(&server);
                    async move { server.handle_request_internal(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }

    /// Internal handler that builds the per-request context and delegates.
    async fn handle_request_internal(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, Infallible> {
        let ctx = RelayContext {
            http_client: &self.http_client,
            target: &self.target,
            retry: &self.config.retry,
        };
        handle_request(&ctx, req).await
    }
}
