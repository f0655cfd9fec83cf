//! # logfan CLI
//!
//! Command-line host for the log fan-out driver.
//!
//! Provides:
//! - Blueprint loading and validation
//! - A single-session driver host with graceful shutdown
//! - Driver and option introspection

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_session, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        driver = driver::DRIVER_NAME,
        "logfan CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_session(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let default_log_level = if cli.quiet {
        "warn".to_string()
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
        .to_string()
    };

    let log_format = match cli.log_format {
        cli::LogFormat::Json => observability::LogFormat::Json,
        cli::LogFormat::Pretty => observability::LogFormat::Pretty,
        cli::LogFormat::Compact => observability::LogFormat::Compact,
    };

    observability::init_with_config(observability::ObservabilityConfig {
        log_format,
        // Installed per-command so `validate` and `info` stay listener-free.
        metrics_port: None,
        default_log_level,
    })
}
