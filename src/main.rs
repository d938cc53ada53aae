use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Extension;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use tokio::signal;
use tracing::{info, Level};

use turnstile::config::{BackendKind, LimiterConfig};
use turnstile::gate::AdmissionGate;
use turnstile::http::{admission_middleware, RateLimitShim};
use turnstile::store::{AtomicStore, RedisStore};

/// Demo HTTP server fronted by the Turnstile admission gate.
#[derive(Debug, Parser)]
#[command(name = "turnstile", version)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Path to a YAML limiter configuration file
    #[arg(long)]
    config: Option<String>,

    /// Redis URL, required when the configured backend is `shared`
    #[arg(long)]
    redis_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let args = Args::parse();

    info!("Starting Turnstile demo server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => LimiterConfig::from_file(path)?,
        None => LimiterConfig::default(),
    };
    info!(
        capacity = config.tokens_per_interval,
        interval = ?config.interval,
        backend = ?config.backend,
        "Configuration loaded"
    );

    let store: Option<Arc<dyn AtomicStore>> = match (config.backend, &args.redis_url) {
        (BackendKind::Shared, Some(url)) => {
            info!(url = %url, "Connecting to shared store");
            Some(Arc::new(RedisStore::connect(url).await?))
        }
        (BackendKind::Shared, None) => {
            anyhow::bail!("shared backend requires --redis-url");
        }
        _ => None,
    };

    let gate = Arc::new(AdmissionGate::from_config(config, store)?);
    let shim = Arc::new(RateLimitShim::new(gate));

    let app = Router::new()
        .route("/", get(|| async { "ok\n" }))
        .layer(axum::middleware::from_fn(admission_middleware))
        .layer(Extension(shim));

    info!("Listening on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Turnstile demo server stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
