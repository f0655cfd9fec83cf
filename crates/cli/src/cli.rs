//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// logfan - container log fan-out driver
#[derive(Parser, Debug)]
#[command(
    name = "logfan",
    author,
    version,
    about = "Container log fan-out driver",
    long_about = "Multiplexes one container log stream out to GELF telemetry \n\
                  sinks and a durable file sink, and can replay the stored \n\
                  history in the original wire framing."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LOGFAN_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "LOGFAN_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one logging session until interrupted
    Run(RunArgs),

    /// Validate a blueprint file without running
    Validate(ValidateArgs),

    /// Display driver information and recognized options
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to the session blueprint (TOML or JSON)
    #[arg(short, long, default_value = "session.toml", env = "LOGFAN_CONFIG")]
    pub config: PathBuf,

    /// Override the input stream path from the blueprint
    #[arg(long, env = "LOGFAN_STREAM")]
    pub stream: Option<PathBuf>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "LOGFAN_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate the blueprint and exit without starting the session
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the blueprint file to validate
    #[arg(short, long, default_value = "session.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
