//! Cache-aside access to the upstream employee directory.
//!
//! # Cache policy
//! - `all-employees`: one slot holding the whole list. Filled on a list miss,
//!   cleared by every successful create or delete before the call returns.
//! - `employee-by-id`: one slot per id. Filled on a get miss. A delete by
//!   name cannot know the id, so it leaves this namespace alone; callers that
//!   resolved the id themselves drop it with [`CachedDirectory::evict_employee`].
//!
//! A list miss that started before a concurrent create may still store the
//! older list after that create evicted it. That window is accepted.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::DirectoryConfig;
use crate::directory::cache::CacheStore;
use crate::resilience::ResilientTransport;
use crate::upstream::client::{Exchange, HttpExchange, RawResponse, UpstreamRequest};
use crate::upstream::types::{CreateRequest, DeleteRequest, EmployeeRecord, Envelope, TransportError};

pub const ALL_EMPLOYEES: &str = "all-employees";
pub const EMPLOYEE_BY_ID: &str = "employee-by-id";

/// Errors returned by directory operations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// Upstream answered with a non-success, non-429 status.
    #[error("upstream rejected the request with status {0}")]
    Rejected(StatusCode),

    /// Upstream kept throttling until the retry budget ran out.
    #[error("upstream still throttling after {attempts} attempts")]
    RetriesExhausted { attempts: u32, status: StatusCode },

    /// Network or request-construction fault.
    #[error("upstream unavailable: {0}")]
    Transport(String),

    /// Success status with a body that is not the expected envelope.
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl DirectoryError {
    /// Status a caller should reflect for this outcome.
    pub fn status(&self) -> StatusCode {
        match self {
            DirectoryError::Rejected(status) => *status,
            DirectoryError::RetriesExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            DirectoryError::Transport(_) | DirectoryError::Malformed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<TransportError> for DirectoryError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::RetriesExhausted { attempts, status } => {
                DirectoryError::RetriesExhausted { attempts, status }
            }
            other => DirectoryError::Transport(other.to_string()),
        }
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Outcome of a delete: `deleted` is true only on an upstream 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deletion {
    pub deleted: bool,
    pub status: StatusCode,
}

/// Employee directory reads and writes behind a process-wide cache.
pub struct CachedDirectory<E = HttpExchange> {
    transport: ResilientTransport<E>,
    collection: Url,
    all_employees: CacheStore<(), Arc<Vec<EmployeeRecord>>>,
    by_id: CacheStore<String, EmployeeRecord>,
}

impl CachedDirectory<HttpExchange> {
    /// Build a directory talking to the configured upstream over HTTP.
    pub fn from_config(config: &DirectoryConfig) -> DirectoryResult<Self> {
        let exchange = HttpExchange::new(&config.upstream)?;
        let base = Url::parse(&config.upstream.base_url)
            .map_err(|e| TransportError::InvalidRequest(format!("invalid base URL: {e}")))?;
        Self::new(ResilientTransport::new(exchange, config.retries.clone()), base)
    }
}

impl<E: Exchange> CachedDirectory<E> {
    /// `base` is the upstream API root; the collection is `{base}/employee`.
    pub fn new(transport: ResilientTransport<E>, base: Url) -> DirectoryResult<Self> {
        let collection = child_url(&base, &["employee"])?;
        tracing::info!(collection = %collection, "Employee directory configured");
        Ok(Self {
            transport,
            collection,
            all_employees: CacheStore::new(ALL_EMPLOYEES),
            by_id: CacheStore::new(EMPLOYEE_BY_ID),
        })
    }

    /// Full employee list, from cache when present.
    pub async fn list_all(&self) -> DirectoryResult<Arc<Vec<EmployeeRecord>>> {
        if let Some(cached) = self.all_employees.get(&()) {
            tracing::debug!(count = cached.len(), "Serving employee list from cache");
            return Ok(cached);
        }

        let request = UpstreamRequest::get(self.collection.clone());
        let response = self.transport.send(&request).await?;
        let employees: Vec<EmployeeRecord> = parse_ok(response)?;
        let employees = Arc::new(employees);

        self.all_employees.insert((), employees.clone());
        tracing::info!(count = employees.len(), "Employee list cached");
        Ok(employees)
    }

    /// One employee by upstream id, from cache when present.
    pub async fn get_by_id(&self, id: &str) -> DirectoryResult<EmployeeRecord> {
        if let Some(cached) = self.by_id.get(id) {
            tracing::debug!(id, "Serving employee from cache");
            return Ok(cached);
        }

        let request = UpstreamRequest::get(child_url(&self.collection, &[id])?);
        let response = self.transport.send(&request).await?;
        let employee: EmployeeRecord = parse_ok(response)?;

        self.by_id.insert(id.to_string(), employee.clone());
        Ok(employee)
    }

    /// Create an employee upstream and invalidate the cached list.
    pub async fn create(&self, input: &CreateRequest) -> DirectoryResult<EmployeeRecord> {
        let request = UpstreamRequest::new(Method::POST, self.collection.clone()).with_json(input)?;
        let response = self.transport.send(&request).await?;

        // A 200 means the record exists upstream even if its body is unreadable.
        if response.status == StatusCode::OK {
            self.all_employees.evict_all();
        }
        let created: EmployeeRecord = parse_ok(response)?;

        tracing::info!(id = %created.id, name = %created.name, "Employee created");
        Ok(created)
    }

    /// Delete the employee with `name` upstream.
    ///
    /// Evicts the cached list on success. `employee-by-id` is untouched; see
    /// the module docs.
    pub async fn delete_by_name(&self, name: &str) -> DirectoryResult<Deletion> {
        let request = UpstreamRequest::new(Method::DELETE, self.collection.clone())
            .with_json(&DeleteRequest { name })?;
        let response = self.transport.send(&request).await?;

        if response.status != StatusCode::OK {
            tracing::warn!(name, status = %response.status, "Upstream refused delete");
            return Ok(Deletion {
                deleted: false,
                status: response.status,
            });
        }

        self.all_employees.evict_all();
        tracing::info!(name, "Employee deleted");
        Ok(Deletion {
            deleted: true,
            status: response.status,
        })
    }

    /// Drop the cached record for `id`, if any.
    pub fn evict_employee(&self, id: &str) -> bool {
        self.by_id.evict(id)
    }

    pub fn is_list_cached(&self) -> bool {
        self.all_employees.contains(&())
    }

    pub fn is_employee_cached(&self, id: &str) -> bool {
        self.by_id.contains(id)
    }
}

/// Parse the `data` field of a 200 response; any other status is passed through.
fn parse_ok<T: DeserializeOwned>(response: RawResponse) -> DirectoryResult<T> {
    if response.status != StatusCode::OK {
        tracing::warn!(status = %response.status, "Upstream returned non-success status");
        return Err(DirectoryError::Rejected(response.status));
    }

    serde_json::from_str::<Envelope<T>>(&response.body)
        .map(|envelope| envelope.data)
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to parse upstream response");
            DirectoryError::Malformed(e.to_string())
        })
}

fn child_url(base: &Url, segments: &[&str]) -> Result<Url, TransportError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| TransportError::InvalidRequest(format!("'{base}' cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
