//! Resilient upstream forwarding.
//!
//! The relay sends with manual redirect semantics (the raw client never
//! chases 3xx), classifies each upstream response into a closed set of
//! outcomes, and retries only transport-level failures: every HTTP status is
//! returned to the caller as-is, 2xx and 302 logged as wins, everything else
//! as a passthrough. Failed attempts back off exponentially (base, 2×base,
//! 4×base, …) until the attempt budget is spent.

use crate::config::RetryConfig;
use crate::error::{RelayError, TransportError};
use crate::metrics;
use crate::proxy::client::HttpClient;
use crate::proxy::request::OutboundRequest;
use hyper::body::Incoming;
use hyper::{Response, StatusCode};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// What one upstream attempt produced. A closed set so the retry/no-retry
/// decision stays explicit: none of these variants retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamOutcome {
    /// 2xx.
    Success,
    /// Exactly 302, relayed without following.
    Redirect,
    /// Any other status, relayed unchanged.
    Passthrough,
}

impl UpstreamOutcome {
    pub fn classify(status: StatusCode) -> Self {
        if status.is_success() {
            UpstreamOutcome::Success
        } else if status == StatusCode::FOUND {
            UpstreamOutcome::Redirect
        } else {
            UpstreamOutcome::Passthrough
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamOutcome::Success => "success",
            UpstreamOutcome::Redirect => "redirect",
            UpstreamOutcome::Passthrough => "passthrough",
        }
    }
}

/// Delay before the next attempt: `base * 2^(attempt-1)`.
pub fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let exponent = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(base_ms.saturating_mul(exponent))
}

/// Send the descriptor through the shared client, retrying per `retry`.
pub async fn forward(
    client: &HttpClient,
    descriptor: &OutboundRequest,
    retry: &RetryConfig,
) -> Result<Response<Incoming>, RelayError> {
    let attempt_timeout = retry.attempt_timeout();
    forward_with(descriptor, retry, || {
        let pending = client.request(descriptor.to_http_request());
        async move {
            match tokio::time::timeout(attempt_timeout, pending).await {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(err)) => Err(TransportError::Connect(err)),
                Err(_) => Err(TransportError::Timeout(attempt_timeout)),
            }
        }
    })
    .await
}

/// Retry loop, generic over the send operation so the policy is testable
/// without a socket. Any `Ok` response returns immediately; only `Err`
/// (a transport fault) consumes an attempt.
pub async fn forward_with<S, F, B, E>(
    descriptor: &OutboundRequest,
    retry: &RetryConfig,
    mut send: S,
) -> Result<Response<B>, RelayError>
where
    S: FnMut() -> F,
    F: Future<Output = Result<Response<B>, E>>,
    E: Display,
{
    let mut attempt = 0u32;
    loop {
        match send().await {
            Ok(response) => {
                let outcome = UpstreamOutcome::classify(response.status());
                debug!(
                    url = %descriptor.target,
                    status = %response.status(),
                    outcome = outcome.as_str(),
                    "upstream responded"
                );
                metrics::record_attempt(outcome.as_str());
                return Ok(response);
            }
            Err(err) => {
                attempt += 1;
                metrics::record_attempt("transport-error");
                if attempt >= retry.max_attempts {
                    warn!(
                        url = %descriptor.target,
                        attempts = attempt,
                        error = %err,
                        "giving up on upstream"
                    );
                    return Err(RelayError::RetriesExhausted {
                        attempts: attempt,
                        last_error: err.to_string(),
                    });
                }
                let delay = backoff_delay(attempt, retry.base_delay_ms);
                warn!(
                    url = %descriptor.target,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transport failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;
    use hyper::header::HeaderMap;
    use hyper::Method;
    use std::io;
    use std::time::Instant;

    fn descriptor() -> OutboundRequest {
        OutboundRequest {
            method: Method::GET,
            target: "https://upstream.test/api/status".parse().unwrap(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    fn policy(base_delay_ms: u64) -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay_ms,
            attempt_timeout_secs: 5,
        }
    }

    fn refused() -> io::Error {
        io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused")
    }

    fn response(status: StatusCode) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(Bytes::from("body")));
        *response.status_mut() = status;
        response
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(
            UpstreamOutcome::classify(StatusCode::OK),
            UpstreamOutcome::Success
        );
        assert_eq!(
            UpstreamOutcome::classify(StatusCode::NO_CONTENT),
            UpstreamOutcome::Success
        );
        assert_eq!(
            UpstreamOutcome::classify(StatusCode::FOUND),
            UpstreamOutcome::Redirect
        );
        assert_eq!(
            UpstreamOutcome::classify(StatusCode::MOVED_PERMANENTLY),
            UpstreamOutcome::Passthrough
        );
        assert_eq!(
            UpstreamOutcome::classify(StatusCode::NOT_FOUND),
            UpstreamOutcome::Passthrough
        );
        assert_eq!(
            UpstreamOutcome::classify(StatusCode::BAD_GATEWAY),
            UpstreamOutcome::Passthrough
        );
    }

    #[test]
    fn test_backoff_doubles_from_base() {
        assert_eq!(backoff_delay(1, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_delay(2, 1000), Duration::from_millis(2000));
        assert_eq!(backoff_delay(3, 1000), Duration::from_millis(4000));
        assert_eq!(backoff_delay(1, 50), Duration::from_millis(50));
        assert_eq!(backoff_delay(2, 50), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_third_attempt_wins_after_backoff() {
        let descriptor = descriptor();
        let retry = policy(20);
        let mut calls = 0u32;
        let started = Instant::now();

        let response = forward_with(&descriptor, &retry, || {
            calls += 1;
            let this_call = calls;
            async move {
                if this_call < 3 {
                    Err(refused())
                } else {
                    Ok(response(StatusCode::OK))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(calls, 3);
        assert_eq!(response.status(), StatusCode::OK);
        // two backoff sleeps: 20ms then 40ms
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_statuses_are_never_retried() {
        for status in [
            StatusCode::MOVED_PERMANENTLY,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            let descriptor = descriptor();
            let retry = policy(20);
            let mut calls = 0u32;

            let relayed = forward_with(&descriptor, &retry, || {
                calls += 1;
                async move { Ok::<_, io::Error>(response(status)) }
            })
            .await
            .unwrap();

            assert_eq!(calls, 1);
            assert_eq!(relayed.status(), status);
        }
    }

    #[tokio::test]
    async fn test_redirect_returns_immediately() {
        let descriptor = descriptor();
        let retry = policy(20);
        let mut calls = 0u32;

        let relayed = forward_with(&descriptor, &retry, || {
            calls += 1;
            async move { Ok::<_, io::Error>(response(StatusCode::FOUND)) }
        })
        .await
        .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(relayed.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempt_count() {
        let descriptor = descriptor();
        let retry = policy(10);
        let mut calls = 0u32;
        let started = Instant::now();

        let err = forward_with(&descriptor, &retry, || {
            calls += 1;
            async move { Err::<Response<Full<Bytes>>, _>(refused()) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls, 3);
        // backoff between attempts 1→2 and 2→3: 10ms + 20ms
        assert!(started.elapsed() >= Duration::from_millis(30));
        match err {
            RelayError::RetriesExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("connection refused"));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }
}
