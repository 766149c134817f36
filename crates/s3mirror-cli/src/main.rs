//! s3mirror CLI - Command-line interface for s3mirror
//!
//! Provides commands for:
//! - Managing credential profiles
//! - Managing sync entries (local directory to bucket)
//! - Viewing and validating configuration
//! - Running the mirror engine in the foreground

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    config::ConfigCommand, profile::ProfileCommand, run::RunCommand, sync::SyncCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "s3mirror", version, about = "Mirror local directories to S3-compatible storage")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage credential profiles
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Manage sync entries
    #[command(subcommand)]
    Sync(SyncCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Run the mirror engine in the foreground
    Run(RunCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Profile(cmd) => cmd.execute(format).await,
        Commands::Sync(cmd) => cmd.execute(format).await,
        Commands::Config(cmd) => cmd.execute(format).await,
        Commands::Run(cmd) => cmd.execute(format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_profile_add() {
        let cli = Cli::try_parse_from([
            "s3mirror", "profile", "add", "--name", "p1", "--region", "eu-west-1",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Profile(ProfileCommand::Add { .. })
        ));
    }

    #[test]
    fn test_parse_sync_add_with_defaults() {
        let cli = Cli::try_parse_from([
            "s3mirror", "sync", "add", "--profile", "p1", "--bucket", "b1", "--local",
            "/data/docs",
        ])
        .unwrap();
        match cli.command {
            Commands::Sync(SyncCommand::Add {
                key_prefix, name, ..
            }) => {
                assert_eq!(key_prefix, "");
                assert_eq!(name, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_sync_add_requires_local() {
        let result = Cli::try_parse_from([
            "s3mirror", "sync", "add", "--profile", "p1", "--bucket", "b1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_global_json_flag() {
        let cli = Cli::try_parse_from(["s3mirror", "--json", "config", "show"]).unwrap();
        assert!(cli.json);
    }

    #[test]
    fn test_parse_verbosity_count() {
        let cli = Cli::try_parse_from(["s3mirror", "-vv", "sync", "list"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
