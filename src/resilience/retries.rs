//! Retry logic for a throttling upstream.
//!
//! # Responsibilities
//! - Replay the same request while the upstream answers 429
//! - Double the delay between attempts, bounded per delay and in total
//! - Hand every other outcome straight back to the caller
//!
//! # Design Decisions
//! - Only 429 is retried; 4xx/5xx and network faults are not transient in a
//!   way that retrying helps
//! - The wait is a `tokio::time::sleep`, so only the calling task is parked
//! - Nothing here touches the cache, so no cache guard is held while waiting

use std::time::Duration;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;
use crate::upstream::client::{Exchange, HttpExchange, RawResponse, UpstreamRequest};
use crate::upstream::types::TransportError;

/// Sends upstream requests, absorbing rate limiting with exponential backoff.
#[derive(Debug, Clone)]
pub struct ResilientTransport<E = HttpExchange> {
    exchange: E,
    config: RetryConfig,
}

impl<E: Exchange> ResilientTransport<E> {
    pub fn new(exchange: E, config: RetryConfig) -> Self {
        Self { exchange, config }
    }

    /// Send `request`, retrying on 429 up to `max_attempts` attempts in total.
    ///
    /// Any non-429 response is returned untouched; interpreting its status is
    /// the caller's job. Network failures are returned on the first
    /// occurrence. When the attempt budget or the total wait bound is spent
    /// while still throttled, fails with [`TransportError::RetriesExhausted`].
    pub async fn send(&self, request: &UpstreamRequest) -> Result<RawResponse, TransportError> {
        let max_attempts = self.config.max_attempts.max(1);
        let max_total_wait = Duration::from_millis(self.config.max_total_wait_ms);
        let mut waited = Duration::ZERO;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let response = self.exchange.exchange(request).await?;

            if !response.is_throttled() {
                if attempt > 1 {
                    tracing::info!(
                        method = %request.method,
                        url = %request.url,
                        attempt,
                        status = %response.status,
                        "Upstream accepted request after throttling"
                    );
                }
                return Ok(response);
            }

            if attempt >= max_attempts {
                return Err(self.exhausted(request, attempt, response));
            }

            let delay = calculate_backoff(
                attempt,
                self.config.initial_backoff_ms,
                self.config.max_delay_ms,
                self.config.jitter_ratio,
            );
            if waited + delay > max_total_wait {
                tracing::warn!(
                    url = %request.url,
                    waited_ms = waited.as_millis() as u64,
                    next_delay_ms = delay.as_millis() as u64,
                    "Retry wait bound reached"
                );
                return Err(self.exhausted(request, attempt, response));
            }

            tracing::warn!(
                method = %request.method,
                url = %request.url,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Too many requests, retrying after backoff"
            );
            metrics::record_retry();
            tokio::time::sleep(delay).await;
            waited += delay;
        }
    }

    fn exhausted(&self, request: &UpstreamRequest, attempts: u32, last: RawResponse) -> TransportError {
        tracing::error!(
            method = %request.method,
            url = %request.url,
            attempts,
            status = %last.status,
            "Upstream still throttling, giving up"
        );
        metrics::record_upstream_failure("retries_exhausted");
        TransportError::RetriesExhausted {
            attempts,
            status: last.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::scripted::ScriptedExchange;
    use reqwest::StatusCode;
    use tokio::time::Instant;
    use url::Url;

    fn config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_backoff_ms: 30_000,
            max_delay_ms: 1_000_000,
            max_total_wait_ms: 10_000_000,
            jitter_ratio: 0.0,
        }
    }

    fn request() -> UpstreamRequest {
        UpstreamRequest::get(Url::parse("http://upstream.test/api/v1/employee").unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_throttled_then_succeeds() {
        let exchange = ScriptedExchange::new();
        exchange
            .respond(StatusCode::TOO_MANY_REQUESTS, "")
            .respond(StatusCode::TOO_MANY_REQUESTS, "")
            .respond(StatusCode::OK, "{\"data\":[]}");
        let transport = ResilientTransport::new(exchange.clone(), config(3));

        let start = Instant::now();
        let response = transport.send(&request()).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(exchange.calls(), 3);
        // 30s after the first 429, 60s after the second.
        assert_eq!(start.elapsed(), Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_delay_doubles() {
        let exchange = ScriptedExchange::new();
        for _ in 0..4 {
            exchange.respond(StatusCode::TOO_MANY_REQUESTS, "");
        }
        exchange.respond(StatusCode::OK, "");
        let transport = ResilientTransport::new(exchange.clone(), config(5));

        let start = Instant::now();
        transport.send(&request()).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(30 + 60 + 120 + 240));
        assert_eq!(exchange.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_max_attempts() {
        let exchange = ScriptedExchange::new();
        for _ in 0..10 {
            exchange.respond(StatusCode::TOO_MANY_REQUESTS, "");
        }
        let transport = ResilientTransport::new(exchange.clone(), config(3));

        let err = transport.send(&request()).await.unwrap_err();

        match err {
            TransportError::RetriesExhausted { attempts, status } => {
                assert_eq!(attempts, 3);
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(exchange.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_returned_without_retry() {
        for status in [StatusCode::BAD_REQUEST, StatusCode::NOT_FOUND, StatusCode::INTERNAL_SERVER_ERROR] {
            let exchange = ScriptedExchange::new();
            exchange.respond(status, "nope");
            let transport = ResilientTransport::new(exchange.clone(), config(3));

            let start = Instant::now();
            let response = transport.send(&request()).await.unwrap();

            assert_eq!(response, RawResponse::new(status, "nope"));
            assert_eq!(exchange.calls(), 1);
            assert_eq!(start.elapsed(), Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_failure_not_retried() {
        let exchange = ScriptedExchange::new();
        exchange
            .respond(StatusCode::TOO_MANY_REQUESTS, "")
            .push(Err(TransportError::Network("connection reset".into())))
            .respond(StatusCode::OK, "");
        let transport = ResilientTransport::new(exchange.clone(), config(5));

        let err = transport.send(&request()).await.unwrap_err();

        assert!(matches!(err, TransportError::Network(_)));
        assert_eq!(exchange.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_wait_bound_stops_early() {
        let exchange = ScriptedExchange::new();
        for _ in 0..10 {
            exchange.respond(StatusCode::TOO_MANY_REQUESTS, "");
        }
        let mut cfg = config(10);
        cfg.max_total_wait_ms = 100_000;
        let transport = ResilientTransport::new(exchange.clone(), cfg);

        let start = Instant::now();
        let err = transport.send(&request()).await.unwrap_err();

        // 30s + 60s fit; the next 120s would cross the bound.
        assert!(matches!(err, TransportError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(start.elapsed(), Duration::from_secs(90));
        assert_eq!(exchange.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replays_identical_request() {
        let exchange = ScriptedExchange::new();
        exchange
            .respond(StatusCode::TOO_MANY_REQUESTS, "")
            .respond(StatusCode::OK, "");
        let transport = ResilientTransport::new(exchange.clone(), config(3));
        let original = request()
            .with_json(&serde_json::json!({"name": "Bob"}))
            .unwrap();

        transport.send(&original).await.unwrap();

        let seen = exchange.requests();
        assert_eq!(seen.len(), 2);
        for sent in seen {
            assert_eq!(sent.url, original.url);
            assert_eq!(sent.body, original.body);
        }
    }
}
