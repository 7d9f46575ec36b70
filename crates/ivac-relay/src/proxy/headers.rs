//! Fixed header sets used across the relay.
//!
//! Header values that never change are declared once as statics,
//! eliminating runtime `.parse().unwrap()` calls at the insertion sites.
//! The extension trait methods clone internally; the clones are cheap for
//! `from_static` values.

use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Inbound headers that are never copied upstream: the relay replaces the
/// browser identity with the upstream's own.
pub static BROWSER_IDENTITY_HEADERS: [HeaderName; 4] = [
    header::HOST,
    header::ORIGIN,
    header::REFERER,
    header::USER_AGENT,
];

/// Message-framing headers. Both directions re-frame the (buffered) body, so
/// carrying these over would describe a frame that no longer exists.
pub static FRAMING_HEADERS: [HeaderName; 3] = [
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
];

// Relayed-response CORS set
pub static VALUE_ALLOW_ANY_ORIGIN: HeaderValue = HeaderValue::from_static("*");
pub static VALUE_ALLOW_CREDENTIALS: HeaderValue = HeaderValue::from_static("true");
pub static VALUE_RELAY_METHODS: HeaderValue = HeaderValue::from_static("GET, POST, PUT, DELETE");
pub static VALUE_RELAY_HEADERS: HeaderValue =
    HeaderValue::from_static("Content-Type, Authorization, X-Requested-With, X-CSRF-Token");
pub static VALUE_MAX_AGE: HeaderValue = HeaderValue::from_static("86400");

// Preflight (OPTIONS) CORS set
pub static VALUE_PREFLIGHT_METHODS: HeaderValue = HeaderValue::from_static("GET, POST, OPTIONS");
pub static VALUE_PREFLIGHT_HEADERS: HeaderValue =
    HeaderValue::from_static("Content-Type, Authorization");

/// Extension trait for stamping the fixed CORS sets onto a header map.
pub trait CorsHeadersExt {
    /// The permissive set every relayed response carries.
    fn apply_relay_cors(&mut self);

    /// The fixed set answering a CORS preflight, no upstream involved.
    fn apply_preflight_cors(&mut self);
}

impl CorsHeadersExt for HeaderMap {
    fn apply_relay_cors(&mut self) {
        self.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            VALUE_ALLOW_ANY_ORIGIN.clone(),
        );
        self.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            VALUE_ALLOW_CREDENTIALS.clone(),
        );
        self.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            VALUE_RELAY_METHODS.clone(),
        );
        self.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            VALUE_RELAY_HEADERS.clone(),
        );
        self.insert(header::ACCESS_CONTROL_MAX_AGE, VALUE_MAX_AGE.clone());
    }

    fn apply_preflight_cors(&mut self) {
        self.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            VALUE_ALLOW_ANY_ORIGIN.clone(),
        );
        self.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            VALUE_PREFLIGHT_METHODS.clone(),
        );
        self.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            VALUE_PREFLIGHT_HEADERS.clone(),
        );
        self.insert(header::ACCESS_CONTROL_MAX_AGE, VALUE_MAX_AGE.clone());
    }
}
