//! Caching, rate-limit tolerant gateway in front of an employee directory.

pub mod config;
pub mod directory;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod upstream;

pub use config::schema::DirectoryConfig;
pub use directory::{CachedDirectory, DirectoryError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resilience::ResilientTransport;
