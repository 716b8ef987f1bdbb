//! Cabinet server binary.

use anyhow::{Context, Result};
use cabinet_core::config::AppConfig;
use cabinet_metadata::BucketSelector;
use cabinet_server::{create_router, AppState, Scavenger};
use clap::Parser;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Cabinet - a file metadata service
#[derive(Parser, Debug)]
#[command(name = "cabinetd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "CABINET_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Cabinet v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration: the file is optional, CABINET_ env vars can
    // provide or override everything.
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("CABINET_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Register Prometheus metrics
    cabinet_server::metrics::register_metrics();

    // Connect to the metadata database. This is fatal on failure: the
    // service cannot run without its authoritative store.
    let metadata = cabinet_metadata::from_config(&config.database)
        .await
        .context("failed to initialize metadata store")?;
    tracing::info!("Metadata store initialized");

    // Connect to the cache. Fatal when enabled so misconfiguration surfaces
    // at startup; per-request cache failures later are swallowed.
    let (cache, leader_lock) = cabinet_cache::from_config(&config.cache)
        .await
        .context("failed to initialize file cache")?;

    // Reconcile configured buckets and load the rotation. Zero usable
    // buckets is fatal: file creation has nowhere to place files.
    let buckets = Arc::new(
        BucketSelector::initialize(metadata.as_ref(), &config.buckets.names)
            .await
            .context("failed to initialize bucket rotation")?,
    );
    tracing::info!(count = buckets.bucket_count(), "Bucket rotation initialized");

    // Signed URL provider
    let storage = cabinet_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage provider")?;

    let state = AppState::new(
        config.clone(),
        metadata.clone(),
        cache.clone(),
        storage,
        buckets,
    );

    // Background tasks share one cancellation token; shutdown waits for
    // each to acknowledge by joining its handle.
    let shutdown = CancellationToken::new();
    let mut background: Vec<(&str, JoinHandle<()>)> = Vec::new();

    if config.scavenger.enabled {
        let scavenger = Scavenger::new(metadata.clone(), leader_lock, config.scavenger.clone());
        background.push(("scavenger", scavenger.spawn(shutdown.clone())));
        tracing::info!("Scavenger spawned");
    } else {
        tracing::info!("Scavenger disabled");
    }

    if config.notification.enabled {
        let queue = cabinet_notify::from_config(&config.notification)
            .await
            .context("failed to initialize notification queue")?;
        let reconciler = cabinet_notify::Reconciler::new(queue, metadata.clone(), cache.clone());
        background.push(("reconciler", reconciler.spawn(shutdown.clone())));
        tracing::info!("Upload reconciler spawned");
    } else {
        tracing::info!("Upload notifications disabled");
    }

    let app = create_router(state);

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The server has drained; stop the background loops and wait for each
    // to observe the signal and exit cleanly.
    shutdown.cancel();
    for (name, handle) in background {
        if let Err(error) = handle.await {
            tracing::error!(task = name, %error, "Background task did not shut down cleanly");
        } else {
            tracing::info!(task = name, "Background task stopped");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves when the process receives SIGINT (ctrl-c).
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
