//! Cached employee directory.
//!
//! # Data Flow
//! ```text
//! caller
//!     → service.rs (cache-aside reads, evicting writes)
//!         → cache.rs (all-employees, employee-by-id)
//!         → resilience::ResilientTransport on miss / mutation
//!     → query.rs (search, highest salary, top earners over the list)
//! ```

pub mod cache;
pub mod query;
pub mod service;

pub use cache::CacheStore;
pub use service::{CachedDirectory, Deletion, DirectoryError, DirectoryResult};
