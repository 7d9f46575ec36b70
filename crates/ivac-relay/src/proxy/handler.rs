//! Per-request orchestration.
//!
//! Two requests never reach the upstream: `/favicon.ico` gets an empty 204,
//! and `OPTIONS` gets the fixed preflight answer. Everything else runs the
//! pipeline: buffer the body, build the outbound descriptor, forward with
//! retry, shape the upstream response. Errors are fatal to this one request
//! only and come back as a 500 JSON body.

use crate::config::{RetryConfig, UpstreamTarget};
use crate::error::RelayError;
use crate::metrics;
use crate::proxy::client::HttpClient;
use crate::proxy::forwarding::forward;
use crate::proxy::headers::CorsHeadersExt;
use crate::proxy::request::transform;
use crate::proxy::response::shape;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{self, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::time::Instant;
use tracing::{error, info};

/// Borrowed state a single request needs, handed down from the server.
pub struct RelayContext<'a> {
    pub http_client: &'a HttpClient,
    pub target: &'a UpstreamTarget,
    pub retry: &'a RetryConfig,
}

/// Handle one inbound request end to end.
pub async fn handle_request(
    ctx: &RelayContext<'_>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();

    if req.uri().path() == "/favicon.ico" {
        let response = no_content();
        metrics::record_request(method.as_str(), response.status().as_u16(), started);
        return Ok(response);
    }

    if req.method() == Method::OPTIONS {
        let response = preflight_response();
        metrics::record_request(method.as_str(), response.status().as_u16(), started);
        return Ok(response);
    }

    let response = match relay(ctx, req).await {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, "request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), started);
    Ok(response)
}

async fn relay(
    ctx: &RelayContext<'_>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, RelayError> {
    let (parts, body) = req.into_parts();

    // GET/HEAD never carry a body upstream; skip draining the stream.
    let body = if parts.method == Method::GET || parts.method == Method::HEAD {
        None
    } else {
        Some(body.collect().await?.to_bytes())
    };

    let descriptor = transform(&parts, body, ctx.target)?;
    info!(method = %descriptor.method, url = %descriptor.target, "forwarding request");

    let upstream = forward(ctx.http_client, &descriptor, ctx.retry).await?;
    let (upstream_parts, upstream_body) = upstream.into_parts();
    let upstream_body = upstream_body.collect().await?.to_bytes();

    shape(
        &parts.method,
        parts.uri.path(),
        upstream_parts.status,
        &upstream_parts.headers,
        upstream_body,
    )
}

fn no_content() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}

fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = no_content();
    response.headers_mut().apply_preflight_cors();
    response
}

/// JSON error body for a request the relay could not complete.
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": message }).to_string();
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
