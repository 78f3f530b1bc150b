//! Upstream wire types and transport errors.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An employee as the upstream directory returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Opaque id assigned upstream.
    pub id: String,
    #[serde(rename = "employee_name")]
    pub name: String,
    /// Upstream may emit salaries as floating point.
    #[serde(rename = "employee_salary")]
    pub salary: f64,
    #[serde(rename = "employee_age")]
    pub age: u32,
    #[serde(rename = "employee_title")]
    pub title: String,
    #[serde(rename = "employee_email")]
    pub email: String,
}

/// Input for creating an employee. Upstream assigns `id` and `email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub name: String,
    pub salary: u64,
    pub age: u32,
    pub title: String,
}

/// Body of the upstream DELETE call.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteRequest<'a> {
    pub name: &'a str,
}

/// Upstream response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub status: Option<String>,
}

/// Errors surfaced by the upstream transport.
///
/// A 429 is never an error on its own; it only becomes
/// [`TransportError::RetriesExhausted`] once the attempt budget is spent.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection refused, reset, or the body could not be read.
    #[error("network error: {0}")]
    Network(String),

    /// A single attempt exceeded its deadline.
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    /// The request could not be built (bad URL, unserializable body).
    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),

    /// Still throttled after the last allowed attempt.
    #[error("upstream still returned {status} after {attempts} attempts")]
    RetriesExhausted { attempts: u32, status: StatusCode },
}

impl TransportError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Network(_) => "network",
            TransportError::Timeout(_) => "timeout",
            TransportError::InvalidRequest(_) => "invalid_request",
            TransportError::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_uses_upstream_field_names() {
        let json = r#"{
            "id": "4a3a170b-22cd-4ac2-aad1-9bb5b34a1507",
            "employee_name": "Alice",
            "employee_salary": 50000.0,
            "employee_age": 30,
            "employee_title": "Engineer",
            "employee_email": "alice@company.com"
        }"#;
        let record: EmployeeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "Alice");
        assert_eq!(record.salary, 50000.0);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["employee_title"], "Engineer");
    }

    #[test]
    fn test_create_request_uses_short_names() {
        let request = CreateRequest {
            name: "Carol".into(),
            salary: 65000,
            age: 41,
            title: "Director".into(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "Carol", "salary": 65000, "age": 41, "title": "Director"})
        );
    }

    #[test]
    fn test_envelope_status_is_optional() {
        let envelope: Envelope<Vec<EmployeeRecord>> = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(envelope.data.is_empty());
        assert!(envelope.status.is_none());
    }

    #[test]
    fn test_error_display() {
        let err = TransportError::RetriesExhausted {
            attempts: 3,
            status: StatusCode::TOO_MANY_REQUESTS,
        };
        assert_eq!(err.to_string(), "upstream still returned 429 Too Many Requests after 3 attempts");
        assert_eq!(err.kind(), "retries_exhausted");
    }
}
