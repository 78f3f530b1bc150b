//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for the employee API
//! - Wire up middleware (request id, tracing, timeout, body limit, metrics)
//! - Serve on a bound listener until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::DirectoryConfig;
use crate::directory::{CachedDirectory, DirectoryResult};
use crate::http::handlers;
use crate::http::request::{make_request_span, MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<CachedDirectory>,
}

/// HTTP server for the directory gateway.
pub struct HttpServer {
    router: Router,
    config: DirectoryConfig,
}

impl HttpServer {
    /// Create a server with a directory built from the configuration.
    pub fn new(config: DirectoryConfig) -> DirectoryResult<Self> {
        let directory = Arc::new(CachedDirectory::from_config(&config)?);
        Ok(Self::with_directory(config, directory))
    }

    /// Create a server around an existing directory.
    pub fn with_directory(config: DirectoryConfig, directory: Arc<CachedDirectory>) -> Self {
        let router = Self::build_router(&config, AppState { directory });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DirectoryConfig, state: AppState) -> Router {
        Router::new()
            .route(
                "/api/employees",
                get(handlers::list_employees).post(handlers::create_employee),
            )
            .route("/api/employees/search/{fragment}", get(handlers::search_employees))
            .route("/api/employees/highestSalary", get(handlers::highest_salary))
            .route(
                "/api/employees/topTenHighestEarningEmployeeNames",
                get(handlers::top_earner_names),
            )
            .route(
                "/api/employees/{id}",
                get(handlers::get_employee).delete(handlers::delete_employee),
            )
            .route("/health", get(handlers::health))
            .route_layer(middleware::from_fn(metrics::track_requests))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.listener.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The configured router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
