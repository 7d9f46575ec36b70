//! Browser-impersonating forwarding relay for the IVAC payment origin.
//!
//! Every inbound request is rebased onto one fixed HTTPS upstream, sent with
//! the upstream's own `Host`/`Referer`/`Origin` identity, retried on
//! transport failure with exponential backoff, and relayed back with
//! permissive CORS headers. No routing, no caching, no state across
//! requests.

pub mod config;
pub mod error;
pub mod metrics;
pub mod proxy;
