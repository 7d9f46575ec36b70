//! Prometheus metrics for the relay.
//!
//! Tracks relayed requests, upstream attempt outcomes, and end-to-end
//! request duration. Exposed in text format on a dedicated listener.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, info};

lazy_static! {
    /// Total number of requests handled by the relay
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "relay_requests_total",
        "Total number of requests handled by the relay",
        &["method", "status"]
    )
    .unwrap();

    /// Upstream send attempts by outcome
    pub static ref UPSTREAM_ATTEMPTS_TOTAL: CounterVec = register_counter_vec!(
        "relay_upstream_attempts_total",
        "Upstream send attempts by outcome",
        &["outcome"]  // outcome: success|redirect|passthrough|transport-error
    )
    .unwrap();

    /// End-to-end request duration
    pub static ref REQUEST_DURATION_MS: HistogramVec = register_histogram_vec!(
        "relay_request_duration_ms",
        "Total request duration including retries and shaping",
        &["method"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Helper to record a handled request
pub fn record_request(method: &str, status: u16, started: Instant) {
    REQUESTS_TOTAL
        .with_label_values(&[method, &status.to_string()])
        .inc();
    REQUEST_DURATION_MS
        .with_label_values(&[method])
        .observe(started.elapsed().as_secs_f64() * 1000.0);
}

/// Helper to record one upstream attempt outcome
pub fn record_attempt(outcome: &str) {
    UPSTREAM_ATTEMPTS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Serve `GET /metrics` on a dedicated port.
pub async fn serve(port: u16) -> Result<(), anyhow::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Metrics listening on http://{}/metrics", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(|req: Request<Incoming>| async move {
                let response = match (req.method(), req.uri().path()) {
                    (&Method::GET, "/metrics") => {
                        Response::new(Full::new(Bytes::from(collect_metrics())))
                    }
                    _ => {
                        let mut not_found = Response::new(Full::new(Bytes::new()));
                        *not_found.status_mut() = StatusCode::NOT_FOUND;
                        not_found
                    }
                };
                Ok::<_, Infallible>(response)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                debug!(error = %err, "error serving metrics connection");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_requests_show_up_in_exposition() {
        record_request("GET", 200, Instant::now());
        record_attempt("success");

        let exposition = collect_metrics();
        assert!(exposition.contains("relay_requests_total"));
        assert!(exposition.contains("relay_upstream_attempts_total"));
    }
}
