//! Configuration validation.
//!
//! Serde handles the syntactic side; this module checks value ranges and
//! cross-field constraints. All failures are collected, not just the first.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::DirectoryConfig;

/// A single failed semantic check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &DirectoryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be positive"));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if url.cannot_be_a_base() => errors.push(ValidationError::new(
            "upstream.base_url",
            "must be a hierarchical http(s) URL",
        )),
        Ok(url) if !matches!(url.scheme(), "http" | "https") => errors.push(ValidationError::new(
            "upstream.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("upstream.base_url", e.to_string())),
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.connect_timeout_secs", "must be positive"));
    }
    if config.upstream.request_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.request_timeout_secs", "must be positive"));
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }
    if retries.initial_backoff_ms == 0 {
        errors.push(ValidationError::new("retries.initial_backoff_ms", "must be positive"));
    }
    if retries.max_delay_ms < retries.initial_backoff_ms {
        errors.push(ValidationError::new(
            "retries.max_delay_ms",
            "must not be smaller than retries.initial_backoff_ms",
        ));
    }
    if retries.max_attempts > 1 && retries.max_total_wait_ms < retries.initial_backoff_ms {
        errors.push(ValidationError::new(
            "retries.max_total_wait_ms",
            "must not be smaller than retries.initial_backoff_ms or no retry can happen",
        ));
    }
    if !(0.0..=1.0).contains(&retries.jitter_ratio) {
        errors.push(ValidationError::new("retries.jitter_ratio", "must be within 0.0..=1.0"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be positive"));
    } else {
        // Every attempt may run up to the upstream timeout on top of the backoff.
        let attempts_ms = u64::from(retries.max_attempts)
            .saturating_mul(config.upstream.request_timeout_secs.saturating_mul(1000));
        let worst_case_ms = retries.max_total_wait_ms.saturating_add(attempts_ms);
        if config.timeouts.request_secs.saturating_mul(1000) <= worst_case_ms {
            errors.push(ValidationError::new(
                "timeouts.request_secs",
                format!("must exceed the worst-case upstream time of {worst_case_ms} ms"),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
