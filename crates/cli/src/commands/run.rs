//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use config_loader::{ConfigLoader, SessionBlueprint};
use driver::Driver;

use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading blueprint");

    if !args.config.exists() {
        anyhow::bail!("Blueprint file not found: {}", args.config.display());
    }

    let mut blueprint = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load blueprint from {}", args.config.display()))?;

    if let Some(ref stream) = args.stream {
        info!(stream = %stream.display(), "Overriding stream path from CLI");
        blueprint.stream = stream.clone();
    }

    info!(
        stream = %blueprint.stream.display(),
        container = %blueprint.container.id,
        options = blueprint.options.len(),
        "Blueprint loaded"
    );

    if args.dry_run {
        info!("Dry run mode - blueprint is valid, exiting");
        print_blueprint_summary(&blueprint);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let driver = Driver::new();
    driver
        .start_logging(&blueprint.stream, blueprint.session_info())
        .await
        .context("Failed to start logging session")?;

    info!("Session running; press Ctrl+C to stop");
    shutdown_signal().await;

    info!("Shutting down");
    driver.shutdown().await;
    info!("Session stopped");

    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print a blueprint summary for dry-run mode
fn print_blueprint_summary(blueprint: &SessionBlueprint) {
    println!("\n=== Session Summary ===\n");
    println!("Stream: {}", blueprint.stream.display());
    println!(
        "Container: {} ({})",
        blueprint.container.id, blueprint.container.name
    );
    if let Some(ref path) = blueprint.log_path {
        println!("Log path: {}", path.display());
    }

    let telemetry = sinks::options::telemetry_count(&blueprint.options).unwrap_or(0);
    println!("\nSinks:");
    println!("  - file (durable, read-back)");
    for ordinal in 0..telemetry {
        let scoped = sinks::options::telemetry_options(&blueprint.options, ordinal);
        let address = scoped
            .get("gelf-address")
            .map(String::as_str)
            .unwrap_or("<unset>");
        println!("  - gelf-{ordinal} ({address})");
    }
    println!();
}
