//! Single HTTP exchange with the upstream directory.
//!
//! # Responsibilities
//! - Describe one request (method, URL, headers, JSON body)
//! - Perform exactly one round-trip with per-attempt timeouts
//! - Map reqwest failures into [`TransportError`]
//!
//! Retrying lives one level up, in `resilience::retries`.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, StatusCode};
use url::Url;

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::upstream::types::TransportError;

/// A fully formed upstream request. Cloneable so it can be replayed.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl UpstreamRequest {
    pub fn new(method: Method, url: Url) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            method,
            url,
            headers,
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Attach a JSON body.
    pub fn with_json<T: serde::Serialize>(mut self, body: &T) -> Result<Self, TransportError> {
        let value = serde_json::to_value(body)
            .map_err(|e| TransportError::InvalidRequest(format!("body serialization failed: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Status and body of one upstream response, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for the upstream's throttling response.
    pub fn is_throttled(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
    }
}

/// One request/response round-trip.
pub trait Exchange: Send + Sync + 'static {
    fn exchange(
        &self,
        request: &UpstreamRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// [`Exchange`] backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct HttpExchange {
    client: Client,
    request_timeout: Duration,
}

impl HttpExchange {
    /// Build a client honoring the configured per-attempt timeouts.
    pub fn new(config: &UpstreamConfig) -> Result<Self, TransportError> {
        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(request_timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("client setup failed: {e}")))?;

        Ok(Self {
            client,
            request_timeout,
        })
    }

    fn map_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.request_timeout)
        } else if error.is_builder() {
            TransportError::InvalidRequest(error.to_string())
        } else {
            TransportError::Network(error.to_string())
        }
    }
}

impl Exchange for HttpExchange {
    async fn exchange(&self, request: &UpstreamRequest) -> Result<RawResponse, TransportError> {
        let start = Instant::now();
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let result = async {
            let response = builder.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(RawResponse { status, body })
        }
        .await;

        match result {
            Ok(response) => {
                metrics::record_upstream_response(request.method.as_str(), response.status.as_u16(), start);
                tracing::debug!(
                    method = %request.method,
                    url = %request.url,
                    status = %response.status,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Upstream responded"
                );
                Ok(response)
            }
            Err(e) => {
                let error = self.map_error(e);
                metrics::record_upstream_failure(error.kind());
                tracing::error!(
                    method = %request.method,
                    url = %request.url,
                    error = %error,
                    "Upstream exchange failed"
                );
                Err(error)
            }
        }
    }
}
