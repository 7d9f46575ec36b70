//! Error taxonomy for the relay.
//!
//! Transport faults stay inside the forwarder and drive the retry policy;
//! everything that escapes to the handler is a `RelayError` and is fatal for
//! the one request being handled (mapped to a 500 JSON response). Non-2xx
//! upstream statuses are not errors.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("upstream request failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("upstream body is not valid JSON: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("failed to read request or response body: {0}")]
    Body(#[from] hyper::Error),

    #[error("invalid forwarding target: {0}")]
    InvalidTarget(#[from] hyper::http::uri::InvalidUri),
}

/// A single failed send. Never leaves the forwarder; either a later attempt
/// succeeds or the last one is folded into `RelayError::RetriesExhausted`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_names_the_attempt_count() {
        let err = RelayError::RetriesExhausted {
            attempts: 3,
            last_error: "connection refused".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("after 3 attempts"));
        assert!(message.contains("connection refused"));
    }

    #[test]
    fn test_timeout_message_carries_the_deadline() {
        let err = TransportError::Timeout(Duration::from_secs(30));
        assert!(err.to_string().contains("30s"));
    }
}
