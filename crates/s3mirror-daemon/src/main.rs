//! s3mirror Daemon - Background mirroring service
//!
//! This binary runs as a systemd user service and handles:
//! - Watching configured local directories for changes
//! - Uploading changed files to object storage
//! - Removing remote objects when local paths disappear
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon loads the configuration, builds the storage adapter, and
//! starts the watch engine. It then blocks until a `CancellationToken`
//! is triggered on receipt of SIGTERM or SIGINT, at which point the
//! engine is stopped and in-flight transfers are drained.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use s3mirror_core::config::Config;
use s3mirror_core::ports::ISyncMappingStore;
use s3mirror_store::S3ObjectStorage;
use s3mirror_watch::engine::{WatchEngine, WatchEngineHandle};

/// Main daemon service that owns the watch engine
///
/// Holds the configuration and a cancellation token for graceful
/// shutdown.
struct DaemonService {
    /// Application configuration loaded from YAML
    config: Config,
    /// Token for signalling graceful shutdown
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Creates a new DaemonService
    ///
    /// Loads configuration and reports validation problems without
    /// refusing to start; a misconfigured entry is skipped, not fatal.
    fn new(shutdown: CancellationToken) -> Self {
        let config_path = Config::default_path();
        let config = Config::load_or_default(&config_path);
        info!(config_path = %config_path.display(), "Loaded configuration");

        for error in config.validate() {
            warn!(field = %error.field, message = %error.message, "Configuration problem");
        }

        Self { config, shutdown }
    }

    /// Runs the daemon
    ///
    /// 1. Builds the storage adapter from the configured profiles
    /// 2. Starts the watch engine over the configured sync entries
    /// 3. Blocks until the shutdown token fires
    /// 4. Stops the engine, draining in-flight transfers
    async fn run(&self) -> Result<()> {
        let mappings = self.config.snapshot();
        if mappings.is_empty() {
            warn!("No syncs configured. Run 's3mirror sync add' to add one.");
        }

        let storage = Arc::new(S3ObjectStorage::new(self.config.profiles.clone()));

        let handle: WatchEngineHandle = WatchEngine::start(mappings, storage)
            .context("Failed to start the mirror engine")?;

        info!("Mirror engine running");

        self.shutdown.cancelled().await;

        info!("Shutdown signal received; draining in-flight transfers");
        handle.stop().await;

        Ok(())
    }
}

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    info!("s3mirror daemon starting (s3mirrord)");

    let shutdown_token = CancellationToken::new();

    // Spawn signal handler task
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(shutdown_token.clone());

    let result = service.run().await;

    match &result {
        Ok(()) => info!("s3mirror daemon shut down gracefully"),
        Err(e) => error!(error = %e, "s3mirror daemon exiting with error"),
    }

    result
}
