//! Upstream employee-directory service.
//!
//! # Data Flow
//! ```text
//! UpstreamRequest
//!     → client.rs (one round-trip, per-attempt timeout)
//!     → RawResponse { status, body }  |  TransportError
//!     → types.rs (Envelope<T> parsing happens in the directory)
//! ```

pub mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod scripted;

pub use client::{Exchange, HttpExchange, RawResponse, UpstreamRequest};
pub use types::{CreateRequest, DeleteRequest, EmployeeRecord, Envelope, TransportError};
