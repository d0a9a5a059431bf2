//! # Queue-Keeper CLI
//!
//! Thin operational CLI for the Queue-Keeper event processing system.
//!
//! The service itself is started via `queue-keeper-service`; this CLI only
//! covers operator-facing checks that don't require embedding the full
//! runtime:
//! - `config validate` — load a TOML configuration file and run
//!   [`queue_keeper_api::config::ServiceConfig::validate`] against it.
//! - `health ping` — issue an HTTP GET against a running service's health
//!   endpoint and report the result.

use clap::{Parser, Subcommand};
use queue_keeper_api::config::ServiceConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

// ============================================================================
// CLI Structure
// ============================================================================

/// Queue-Keeper CLI - operational checks for a Queue-Keeper deployment
#[derive(Parser)]
#[command(name = "queue-keeper")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operational CLI for Queue-Keeper deployments")]
pub struct Cli {
    /// Logging level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Health check commands
    Health {
        #[command(subcommand)]
        action: HealthCommands,
    },
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file without starting the service
    Validate {
        /// Path to the TOML configuration file
        #[arg(short, long)]
        file: PathBuf,
    },
}

/// Health check subcommands
#[derive(Subcommand)]
pub enum HealthCommands {
    /// Ping a running service's health endpoint
    Ping {
        /// Base URL of the running service, e.g. http://localhost:8080
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,

        /// Request timeout in seconds
        #[arg(short, long, default_value = "10")]
        timeout: u64,
    },
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("health check failed: {message}")]
    HealthCheckFailed { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    #[error("configuration is invalid: {0}")]
    Validation(#[from] queue_keeper_api::ConfigError),
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    initialize_logging(&cli);

    match cli.command {
        Commands::Config { action } => execute_config_command(action).await,
        Commands::Health { action } => execute_health_command(action).await,
    }
}

/// Initialize logging based on CLI arguments
fn initialize_logging(cli: &Cli) {
    let filter = tracing_subscriber::EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if cli.json_logs {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

/// Execute config command
async fn execute_config_command(action: ConfigCommands) -> Result<(), CliError> {
    match action {
        ConfigCommands::Validate { file } => {
            info!(file = %file.display(), "validating configuration");

            if !file.exists() {
                return Err(ConfigError::FileNotFound { path: file }.into());
            }

            let contents = std::fs::read_to_string(&file)?;
            let config: ServiceConfig =
                toml::from_str(&contents).map_err(ConfigError::InvalidFormat)?;
            config.validate().map_err(ConfigError::Validation)?;

            info!(file = %file.display(), "configuration is valid");
            println!("configuration is valid: {}", file.display());
            Ok(())
        }
    }
}

/// Execute health command
async fn execute_health_command(action: HealthCommands) -> Result<(), CliError> {
    match action {
        HealthCommands::Ping { url, timeout } => {
            let endpoint = format!("{}/health", url.trim_end_matches('/'));
            info!(endpoint = %endpoint, "pinging health endpoint");

            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout))
                .build()
                .map_err(|e| CliError::HealthCheckFailed {
                    message: format!("failed to build HTTP client: {e}"),
                })?;

            let response = client.get(&endpoint).send().await.map_err(|e| {
                CliError::HealthCheckFailed {
                    message: format!("request to {endpoint} failed: {e}"),
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(CliError::HealthCheckFailed {
                    message: format!("service at {endpoint} returned status {status}"),
                });
            }

            let body = response.text().await.unwrap_or_default();
            info!(status = %status, "service reported healthy");
            println!("{body}");
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
