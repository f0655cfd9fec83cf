//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use config_loader::ConfigLoader;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<BlueprintSummary>,
}

#[derive(Serialize)]
struct BlueprintSummary {
    stream: String,
    container_id: String,
    telemetry_sinks: usize,
    option_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating blueprint");

    let result = validate_blueprint(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Blueprint validation failed")
    }
}

fn validate_blueprint(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            summary: None,
        };
    }

    match ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let telemetry_sinks =
                sinks::options::telemetry_count(&blueprint.options).unwrap_or(0);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                summary: Some(BlueprintSummary {
                    stream: blueprint.stream.display().to_string(),
                    container_id: blueprint.container.id,
                    telemetry_sinks,
                    option_count: blueprint.options.len(),
                }),
            }
        }
        Err(err) => ValidationResult {
            valid: false,
            config_path,
            error: Some(err.to_string()),
            summary: None,
        },
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ {} is valid", result.config_path);
        if let Some(ref summary) = result.summary {
            println!("  stream: {}", summary.stream);
            println!("  container: {}", summary.container_id);
            println!("  telemetry sinks: {}", summary.telemetry_sinks);
        }
    } else {
        println!("✗ {} is invalid", result.config_path);
        if let Some(ref error) = result.error {
            println!("  {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ValidateArgs;
    use std::io::Write;

    fn validate_file(content: &str) -> ValidationResult {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        };
        validate_blueprint(&args)
    }

    #[test]
    fn test_valid_blueprint_reports_summary() {
        let result = validate_file(
            r#"
stream = "/run/logfan/web.fifo"

[container]
id = "abc"

[options]
"logfan-gelf-count" = "0"
"#,
        );
        assert!(result.valid);
        assert_eq!(result.summary.unwrap().telemetry_sinks, 0);
    }

    #[test]
    fn test_invalid_blueprint_reports_error() {
        let result = validate_file("stream = 3");
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_missing_file_reports_error() {
        let args = ValidateArgs {
            config: "/definitely/not/here.toml".into(),
            json: false,
        };
        let result = validate_blueprint(&args);
        assert!(!result.valid);
    }
}
