//! Profile command - Manage credential profiles
//!
//! Provides the `s3mirror profile` CLI command which:
//! 1. Registers a new credential profile (region, optional endpoint)
//! 2. Lists configured profiles with their sync counts

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use s3mirror_core::config::Config;

use crate::output::{formatter, OutputFormat};

/// Profile subcommands
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Register a new credential profile
    Add {
        /// Profile name
        #[arg(long)]
        name: String,
        /// Region of the target store, e.g. "eu-west-1"
        #[arg(long)]
        region: String,
        /// Endpoint URL for S3-compatible stores (MinIO, Ceph)
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// List configured profiles
    List,
}

impl ProfileCommand {
    /// Execute the profile command
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        match self {
            ProfileCommand::Add {
                name,
                region,
                endpoint,
            } => self.execute_add(name, region, endpoint.clone(), format).await,
            ProfileCommand::List => self.execute_list(format).await,
        }
    }

    async fn execute_add(
        &self,
        name: &str,
        region: &str,
        endpoint: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let formatter = formatter(format);

        let config_path = Config::default_path();
        let mut config = Config::load_or_default(&config_path);

        info!(profile = %name, region = %region, "Adding profile");

        if !config.add_profile(name, region, endpoint.clone()) {
            formatter.error(&format!("Profile '{}' already exists", name));
            std::process::exit(1);
        }

        config
            .save(&config_path)
            .context("Failed to write configuration file")?;

        if format.is_json() {
            let json = serde_json::json!({
                "success": true,
                "profile": name,
                "region": region,
                "endpoint": endpoint,
                "config_path": config_path.display().to_string(),
            });
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Added profile '{}'", name));
            formatter.info(&format!("Saved to {}", config_path.display()));
        }

        Ok(())
    }

    async fn execute_list(&self, format: OutputFormat) -> Result<()> {
        let formatter = formatter(format);

        let config_path = Config::default_path();
        let config = Config::load_or_default(&config_path);

        if format.is_json() {
            let profiles: Vec<serde_json::Value> = config
                .profiles
                .iter()
                .map(|(name, profile)| {
                    serde_json::json!({
                        "name": name,
                        "region": profile.region,
                        "endpoint": profile.endpoint,
                        "syncs": profile.syncs.len(),
                    })
                })
                .collect();
            formatter.print_json(&serde_json::json!({ "profiles": profiles }));
        } else if config.profiles.is_empty() {
            formatter.info("No profiles configured");
            formatter.info("Run 's3mirror profile add --name <name> --region <region>' to add one");
        } else {
            formatter.success(&format!(
                "{} profile{} configured",
                config.profiles.len(),
                if config.profiles.len() == 1 { "" } else { "s" }
            ));
            for (name, profile) in &config.profiles {
                let endpoint = profile
                    .endpoint
                    .as_deref()
                    .map(|e| format!(", endpoint {}", e))
                    .unwrap_or_default();
                formatter.info(&format!(
                    "{} (region {}{}, {} sync{})",
                    name,
                    profile.region,
                    endpoint,
                    profile.syncs.len(),
                    if profile.syncs.len() == 1 { "" } else { "s" }
                ));
            }
        }

        Ok(())
    }
}
