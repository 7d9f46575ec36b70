//! Response shaping.
//!
//! Every relayed response carries the permissive CORS set on top of the
//! upstream headers. The body is shaped by exactly one of three branches,
//! checked in order: the root page is relayed as text with a forced 200, a
//! 302 is relayed body-less with its `Location` intact, and everything else
//! is treated as JSON and re-serialized under the upstream's own status.
//! The JSON branch trusts the path, not the `Content-Type` header; a
//! non-JSON body there is a hard failure for the request.

use crate::error::RelayError;
use crate::proxy::headers::{CorsHeadersExt, FRAMING_HEADERS};
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::HeaderMap;
use hyper::{Method, Response, StatusCode};
use std::borrow::Cow;

/// Shape the collected upstream response for the caller.
pub fn shape(
    inbound_method: &Method,
    inbound_path: &str,
    status: StatusCode,
    upstream_headers: &HeaderMap,
    body: Bytes,
) -> Result<Response<Full<Bytes>>, RelayError> {
    let mut headers = upstream_headers.clone();
    for name in FRAMING_HEADERS.iter() {
        headers.remove(name);
    }
    headers.apply_relay_cors();

    let (status, body) = if *inbound_method == Method::GET && inbound_path == "/" {
        // Root page: relay as text, always 200 no matter what upstream said.
        // Valid UTF-8 passes through untouched; invalid sequences are
        // replaced.
        let text = match String::from_utf8_lossy(&body) {
            Cow::Borrowed(_) => body.clone(),
            Cow::Owned(replaced) => Bytes::from(replaced),
        };
        (StatusCode::OK, text)
    } else if status == StatusCode::FOUND {
        // Location is part of the copied upstream headers.
        (StatusCode::FOUND, Bytes::new())
    } else {
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        (status, Bytes::from(serde_json::to_vec(&value)?))
    };

    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
