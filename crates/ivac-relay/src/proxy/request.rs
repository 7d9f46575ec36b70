//! Outbound request construction.
//!
//! `transform` turns an inbound request into the descriptor the forwarder
//! sends: same method, target URL rebased onto the fixed origin, headers
//! copied minus the browser identity, and the identity headers replaced with
//! the upstream's own values. The descriptor owns a buffered body so every
//! retry attempt can rebuild an identical request.

use crate::config::UpstreamTarget;
use crate::error::RelayError;
use crate::proxy::headers::{BROWSER_IDENTITY_HEADERS, FRAMING_HEADERS};
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{self, HeaderMap};
use hyper::http::request::Parts;
use hyper::{Method, Request, Uri};

/// Everything needed to (re)send one upstream request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub target: Uri,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl OutboundRequest {
    /// Build a fresh `hyper` request for one attempt. Cloning the buffered
    /// body is cheap (`Bytes` is reference-counted).
    pub fn to_http_request(&self) -> Request<Full<Bytes>> {
        let body = self.body.clone().unwrap_or_else(Bytes::new);
        let mut request = Request::new(Full::new(body));
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.target.clone();
        *request.headers_mut() = self.headers.clone();
        request
    }
}

/// Derive the outbound descriptor from the inbound request head and its
/// (already buffered) body.
pub fn transform(
    parts: &Parts,
    body: Option<Bytes>,
    target: &UpstreamTarget,
) -> Result<OutboundRequest, RelayError> {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target_uri: Uri = format!("{}{}", target.base, path_and_query).parse()?;

    let mut headers = HeaderMap::with_capacity(parts.headers.len() + 3);
    for (name, value) in parts.headers.iter() {
        if BROWSER_IDENTITY_HEADERS.contains(name) || FRAMING_HEADERS.contains(name) {
            continue;
        }
        // The shaping branches re-read the body, so the upstream must answer
        // with an identity encoding.
        if *name == header::ACCEPT_ENCODING {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers.insert(header::HOST, target.host.clone());
    headers.insert(header::REFERER, target.origin.clone());
    headers.insert(header::ORIGIN, target.origin.clone());

    let body = if parts.method == Method::GET || parts.method == Method::HEAD {
        None
    } else {
        body
    };

    Ok(OutboundRequest {
        method: parts.method.clone(),
        target: target_uri,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Protocol, UpstreamConfig};

    fn test_target() -> UpstreamTarget {
        UpstreamConfig {
            host: "upstream.test".to_string(),
            port: 443,
            protocol: Protocol::Https,
        }
        .target()
        .unwrap()
    }

    fn inbound(method: Method, uri: &str) -> Parts {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("user-agent", "relay-tests/1.0")
            .header("origin", "http://client.example")
            .header("referer", "http://client.example/page")
            .header("host", "localhost:5000")
            .header("x-custom", "kept")
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[test]
    fn test_target_url_appends_path_and_query() {
        let parts = inbound(Method::GET, "/application/payment?step=2&id=7");
        let outbound = transform(&parts, None, &test_target()).unwrap();
        assert_eq!(
            outbound.target.to_string(),
            "https://upstream.test/application/payment?step=2&id=7"
        );
    }

    #[test]
    fn test_identity_headers_are_replaced() {
        let parts = inbound(Method::POST, "/api/submit");
        let outbound = transform(&parts, Some(Bytes::from("payload")), &test_target()).unwrap();

        assert_eq!(outbound.headers[header::HOST.as_str()], "upstream.test");
        assert_eq!(
            outbound.headers[header::ORIGIN.as_str()],
            "https://upstream.test"
        );
        assert_eq!(
            outbound.headers[header::REFERER.as_str()],
            "https://upstream.test"
        );
        assert!(!outbound.headers.contains_key(header::USER_AGENT));
        assert_eq!(outbound.headers["x-custom"], "kept");
    }

    #[test]
    fn test_get_and_head_carry_no_body() {
        for method in [Method::GET, Method::HEAD] {
            let parts = inbound(method, "/");
            let outbound = transform(&parts, Some(Bytes::from("ignored")), &test_target()).unwrap();
            assert!(outbound.body.is_none());
        }
    }

    #[test]
    fn test_post_body_is_forwarded() {
        let parts = inbound(Method::POST, "/api/submit");
        let outbound = transform(&parts, Some(Bytes::from("payload")), &test_target()).unwrap();
        assert_eq!(outbound.body.as_deref(), Some(b"payload".as_slice()));
    }

    #[test]
    fn test_framing_headers_are_not_copied() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/submit")
            .header("content-length", "7")
            .header("transfer-encoding", "chunked")
            .header("connection", "keep-alive")
            .header("accept-encoding", "gzip, br")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        let outbound = transform(&parts, Some(Bytes::from("payload")), &test_target()).unwrap();

        assert!(!outbound.headers.contains_key(header::CONTENT_LENGTH));
        assert!(!outbound.headers.contains_key(header::TRANSFER_ENCODING));
        assert!(!outbound.headers.contains_key(header::CONNECTION));
        assert!(!outbound.headers.contains_key(header::ACCEPT_ENCODING));
    }

    #[test]
    fn test_rebuilt_request_matches_descriptor() {
        let parts = inbound(Method::POST, "/api/submit");
        let outbound = transform(&parts, Some(Bytes::from("payload")), &test_target()).unwrap();
        let request = outbound.to_http_request();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(
            request.uri().to_string(),
            "https://upstream.test/api/submit"
        );
        assert_eq!(request.headers()["x-custom"], "kept");
    }
}
