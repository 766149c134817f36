//! Run command - Run the mirror engine in the foreground
//!
//! Loads the configuration, builds the storage adapter, starts the
//! watch engine, and drains in-flight transfers on Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use s3mirror_core::config::Config;
use s3mirror_core::ports::ISyncMappingStore;
use s3mirror_store::S3ObjectStorage;
use s3mirror_watch::engine::WatchEngine;

use crate::output::{formatter, OutputFormat};

/// Run the mirror engine in the foreground until interrupted
#[derive(Debug, Args)]
pub struct RunCommand {}

impl RunCommand {
    /// Execute the run command
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        let formatter = formatter(format);

        let config_path = Config::default_path();
        let config = Config::load_or_default(&config_path);

        for error in config.validate() {
            warn!(field = %error.field, message = %error.message, "Configuration problem");
        }

        let mappings = config.snapshot();
        if mappings.is_empty() {
            formatter.error("No syncs configured; run 's3mirror sync add' first");
            std::process::exit(1);
        }

        info!(
            config_path = %config_path.display(),
            syncs = mappings.len(),
            "Starting mirror engine"
        );

        let storage = Arc::new(S3ObjectStorage::new(config.profiles.clone()));
        let handle = WatchEngine::start(mappings, storage)
            .context("Failed to start the mirror engine")?;

        formatter.success("Mirroring; press Ctrl-C to stop");

        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;

        info!("Shutdown requested; draining in-flight transfers");
        handle.stop().await;

        formatter.success("Stopped");
        Ok(())
    }
}
