//! Config command - View and validate s3mirror configuration
//!
//! Provides the `s3mirror config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Validates the configuration file and reports errors

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use s3mirror_core::config::Config;

use crate::output::{formatter, OutputFormat};

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(format).await,
            ConfigCommand::Validate => self.execute_validate(format).await,
        }
    }

    /// Show current configuration
    async fn execute_show(&self, format: OutputFormat) -> Result<()> {
        let formatter = formatter(format);

        let config_path = Config::default_path();
        let config = Config::load_or_default(&config_path);

        info!(config_path = %config_path.display(), "Showing configuration");

        if format.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;

            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    /// Validate configuration file
    async fn execute_validate(&self, format: OutputFormat) -> Result<()> {
        let formatter = formatter(format);

        let config_path = Config::default_path();

        // Try to load the config file explicitly (not load_or_default)
        let config = match Config::load(&config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                if !config_path.exists() {
                    if format.is_json() {
                        let json = serde_json::json!({
                            "valid": false,
                            "config_path": config_path.display().to_string(),
                            "errors": ["Configuration file not found."],
                        });
                        formatter.print_json(&json);
                    } else {
                        formatter.info(&format!(
                            "Configuration file not found at {}",
                            config_path.display()
                        ));
                        formatter.info("Run 's3mirror profile add' to create one.");
                    }
                    return Ok(());
                }

                if format.is_json() {
                    let json = serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [format!("Failed to parse configuration: {}", e)],
                    });
                    formatter.print_json(&json);
                } else {
                    formatter.error(&format!("Failed to parse configuration: {}", e));
                    formatter.info(&format!("File: {}", config_path.display()));
                }
                return Ok(());
            }
        };

        info!(config_path = %config_path.display(), "Validating configuration");

        let errors = config.validate();

        if format.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            let json = serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            });
            formatter.print_json(&json);
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        Ok(())
    }
}
