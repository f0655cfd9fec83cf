//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::InfoArgs;

/// Driver info for JSON output
#[derive(Serialize)]
struct DriverInfo {
    driver: &'static str,
    version: &'static str,
    count_option: &'static str,
    telemetry_options: Vec<String>,
    durable_options: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let info = DriverInfo {
        driver: driver::DRIVER_NAME,
        version: env!("CARGO_PKG_VERSION"),
        count_option: sinks::options::TELEMETRY_COUNT_KEY,
        telemetry_options: scoped_telemetry_keys(),
        durable_options: scoped_durable_keys(),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&info).context("Failed to serialize info")?;
        println!("{}", json);
    } else {
        print_info(&info);
    }
    Ok(())
}

fn scoped_telemetry_keys() -> Vec<String> {
    sinks::options::GELF_OPTS
        .iter()
        .map(|opt| format!("{}{}.<N>", sinks::options::OPTION_SCOPE, opt))
        .collect()
}

fn scoped_durable_keys() -> Vec<String> {
    sinks::options::FILE_OPTS
        .iter()
        .map(|opt| format!("{}{}", sinks::options::OPTION_SCOPE, opt))
        .collect()
}

fn print_info(info: &DriverInfo) {
    println!("driver: {} v{}", info.driver, info.version);
    println!("\ntelemetry sink count:");
    println!("  {}", info.count_option);
    println!("\ntelemetry sink options (per ordinal N):");
    for key in &info.telemetry_options {
        println!("  {}", key);
    }
    println!("\ndurable sink options:");
    for key in &info.durable_options {
        println!("  {}", key);
    }
}
