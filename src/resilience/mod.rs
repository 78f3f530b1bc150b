//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → retries.rs (send; on 429 sleep and replay)
//!     → backoff.rs (delay for the next attempt)
//!     → upstream::client (one round-trip with per-attempt timeout)
//! ```

pub mod backoff;
pub mod retries;

pub use retries::ResilientTransport;
