//! Directory Gateway
//!
//! Fronts a throttling employee-directory service with a stable API.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request         ┌──────────────────────────────────────────────┐
//!     ───────────────────────┼─▶ http server ──▶ handlers ──▶ directory    │
//!                            │                                  │  cache   │
//!                            │                         miss /   ▼ mutation │
//!                            │                       resilient transport   │
//!                            │                        (429 → backoff)      │
//!                            │                                  │          │
//!     Client Response        │                                  ▼          │
//!     ◀──────────────────────┼──────────────────────────── upstream ◀──────┼──── Employee
//!                            │                                             │     Directory
//!                            │  config · logging · metrics · lifecycle     │
//!                            └─────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use directory_gateway::config::{load_config, validation::validate_config, ConfigError, DirectoryConfig};
use directory_gateway::lifecycle::{signals, Shutdown};
use directory_gateway::observability::{logging, metrics};
use directory_gateway::{CachedDirectory, HttpServer};

#[derive(Parser)]
#[command(name = "directory-gateway")]
#[command(about = "Caching gateway for the employee directory service", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(long)]
    bind: Option<String>,

    /// Override upstream.base_url.
    #[arg(long)]
    upstream: Option<String>,
}

fn resolve_config(args: &Args) -> Result<DirectoryConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => DirectoryConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(upstream) = &args.upstream {
        config.upstream.base_url = upstream.clone();
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    logging::init(&config.observability);
    tracing::info!("directory-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        max_attempts = config.retries.max_attempts,
        initial_backoff_ms = config.retries.initial_backoff_ms,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let directory = Arc::new(CachedDirectory::from_config(&config)?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::trigger_on_signal(shutdown));

    let server = HttpServer::with_directory(config, directory);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
