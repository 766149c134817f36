//! Sync command - Manage local-directory-to-bucket sync entries
//!
//! Provides the `s3mirror sync` CLI command which:
//! 1. Adds a sync entry under an existing profile
//! 2. Removes the entry for a local root
//! 3. Lists all configured entries across profiles

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use s3mirror_core::config::Config;

use crate::output::{formatter, OutputFormat};

/// Sync subcommands
#[derive(Debug, Subcommand)]
pub enum SyncCommand {
    /// Add a sync entry
    Add {
        /// Profile to use for this entry
        #[arg(long)]
        profile: String,
        /// Target bucket name
        #[arg(long)]
        bucket: String,
        /// Local directory to mirror (absolute path)
        #[arg(long)]
        local: PathBuf,
        /// Object-key namespace within the bucket
        #[arg(long, default_value = "")]
        key_prefix: String,
        /// Entry name; defaults to the last path component of --local
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove the sync entry for a local root
    Remove {
        /// Local directory of the entry to remove
        #[arg(long)]
        local: PathBuf,
    },
    /// List configured sync entries
    List,
}

impl SyncCommand {
    /// Execute the sync command
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        match self {
            SyncCommand::Add {
                profile,
                bucket,
                local,
                key_prefix,
                name,
            } => {
                self.execute_add(profile, bucket, local, key_prefix, name.as_deref(), format)
                    .await
            }
            SyncCommand::Remove { local } => self.execute_remove(local, format).await,
            SyncCommand::List => self.execute_list(format).await,
        }
    }

    async fn execute_add(
        &self,
        profile: &str,
        bucket: &str,
        local: &Path,
        key_prefix: &str,
        name: Option<&str>,
        format: OutputFormat,
    ) -> Result<()> {
        let formatter = formatter(format);

        let name = match name {
            Some(n) => n.to_string(),
            None => local
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .context("Cannot derive an entry name from the local path; pass --name")?,
        };

        let config_path = Config::default_path();
        let mut config = Config::load_or_default(&config_path);

        info!(profile = %profile, bucket = %bucket, local = %local.display(), "Adding sync entry");

        if let Err(e) = config.add_sync(profile, &name, local, bucket, key_prefix) {
            formatter.error(&e.to_string());
            std::process::exit(1);
        }

        config
            .save(&config_path)
            .context("Failed to write configuration file")?;

        if format.is_json() {
            let json = serde_json::json!({
                "success": true,
                "name": name,
                "profile": profile,
                "bucket": bucket,
                "local": local.display().to_string(),
                "key_prefix": key_prefix,
            });
            formatter.print_json(&json);
        } else {
            formatter.success(&format!(
                "Mirroring {} to {}/{}",
                local.display(),
                bucket,
                key_prefix
            ));
            formatter.info(&format!("Saved to {}", config_path.display()));
        }

        Ok(())
    }

    async fn execute_remove(&self, local: &Path, format: OutputFormat) -> Result<()> {
        let formatter = formatter(format);

        let config_path = Config::default_path();
        let mut config = Config::load_or_default(&config_path);

        if !config.remove_sync(local) {
            formatter.error(&format!("No sync configured for {}", local.display()));
            std::process::exit(1);
        }

        config
            .save(&config_path)
            .context("Failed to write configuration file")?;

        if format.is_json() {
            let json = serde_json::json!({
                "success": true,
                "local": local.display().to_string(),
            });
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Removed sync for {}", local.display()));
        }

        Ok(())
    }

    async fn execute_list(&self, format: OutputFormat) -> Result<()> {
        let formatter = formatter(format);

        let config_path = Config::default_path();
        let config = Config::load_or_default(&config_path);

        let mut entries = Vec::new();
        for (profile_name, profile) in &config.profiles {
            for (name, sync) in &profile.syncs {
                entries.push((profile_name, name, sync));
            }
        }

        if format.is_json() {
            let json_entries: Vec<serde_json::Value> = entries
                .iter()
                .map(|(profile, name, sync)| {
                    serde_json::json!({
                        "name": name,
                        "profile": profile,
                        "local": sync.local.display().to_string(),
                        "bucket": sync.bucket,
                        "key_prefix": sync.key_prefix,
                    })
                })
                .collect();
            formatter.print_json(&serde_json::json!({ "syncs": json_entries }));
        } else if entries.is_empty() {
            formatter.info("No syncs configured");
        } else {
            formatter.success(&format!(
                "{} sync{} configured",
                entries.len(),
                if entries.len() == 1 { "" } else { "s" }
            ));
            for (profile, name, sync) in &entries {
                formatter.info(&format!(
                    "{}: {} -> {}/{} (profile {})",
                    name,
                    sync.local.display(),
                    sync.bucket,
                    sync.key_prefix,
                    profile,
                ));
            }
        }

        Ok(())
    }
}
