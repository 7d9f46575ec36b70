//! Forwarding relay pipeline.
//!
//! One inbound port, one fixed upstream origin. Per request:
//!
//! - `handler` — short-circuits (`/favicon.ico`, `OPTIONS`) and pipeline
//!   orchestration
//! - `request` — outbound descriptor construction (target URL, identity
//!   header rewrite, buffered body)
//! - `forwarding` — send with retry/backoff, manual redirect semantics
//! - `response` — CORS stamping and body shaping
//! - `client` — shared HTTPS client with pooling
//! - `headers` — fixed header sets
//! - `server` — accept loop and per-connection serving

mod client;
mod forwarding;
mod handler;
mod headers;
mod request;
mod response;
mod server;

pub use client::{create_http_client, HttpClient};
pub use forwarding::{backoff_delay, forward, forward_with, UpstreamOutcome};
pub use handler::{error_response, handle_request, RelayContext};
pub use headers::CorsHeadersExt;
pub use request::{transform, OutboundRequest};
pub use response::shape;
pub use server::RelayServer;
