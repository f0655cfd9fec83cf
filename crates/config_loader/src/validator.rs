//! Blueprint validation
//!
//! Rules:
//! - stream path and container id are non-empty
//! - every scoped option key matches a sink allow-list
//! - the telemetry sink count is present and parseable
//! - each configured telemetry ordinal lies below the count
//!
//! Option *values* are validated by each sink's constructor; this pass only
//! rejects blueprints the driver is guaranteed to refuse.

use sinks::options;

use crate::blueprint::SessionBlueprint;
use crate::error::ConfigError;

/// Validate a blueprint, returning the first error encountered
pub fn validate(blueprint: &SessionBlueprint) -> Result<(), ConfigError> {
    validate_identity(blueprint)?;
    validate_option_keys(blueprint)?;
    validate_telemetry_count(blueprint)?;
    Ok(())
}

fn validate_identity(blueprint: &SessionBlueprint) -> Result<(), ConfigError> {
    if blueprint.stream.as_os_str().is_empty() {
        return Err(ConfigError::validation("stream", "must not be empty"));
    }
    if blueprint.container.id.is_empty() {
        return Err(ConfigError::validation("container.id", "must not be empty"));
    }
    Ok(())
}

fn validate_option_keys(blueprint: &SessionBlueprint) -> Result<(), ConfigError> {
    for key in blueprint.options.keys() {
        if !options::is_recognized_key(key) {
            return Err(ConfigError::validation(
                format!("options.{key}"),
                "unknown driver option",
            ));
        }
    }
    Ok(())
}

fn validate_telemetry_count(blueprint: &SessionBlueprint) -> Result<(), ConfigError> {
    let count = options::telemetry_count(&blueprint.options)
        .map_err(|err| ConfigError::validation(options::TELEMETRY_COUNT_KEY, err.to_string()))?;

    // Options for ordinals past the count would be silently dead.
    for ordinal in count.. {
        if options::telemetry_options(&blueprint.options, ordinal).is_empty() {
            break;
        }
        return Err(ConfigError::validation(
            format!("options (telemetry ordinal {ordinal})"),
            format!("configured beyond {}={count}", options::TELEMETRY_COUNT_KEY),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::ContainerSection;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn blueprint(options: &[(&str, &str)]) -> SessionBlueprint {
        SessionBlueprint {
            stream: PathBuf::from("/run/logfan/web.fifo"),
            container: ContainerSection {
                id: "abc".to_string(),
                name: "web".to_string(),
            },
            log_path: None,
            options: options
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_valid_blueprint_passes() {
        let bp = blueprint(&[
            ("logfan-gelf-count", "1"),
            ("logfan-gelf-address.0", "udp://g:12201"),
            ("logfan-max-size", "10m"),
        ]);
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_empty_container_id_rejected() {
        let mut bp = blueprint(&[("logfan-gelf-count", "0")]);
        bp.container.id.clear();
        assert!(matches!(
            validate(&bp),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_unknown_scoped_key_rejected() {
        let bp = blueprint(&[("logfan-gelf-count", "0"), ("logfan-frobnicate", "1")]);
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("logfan-frobnicate"));
    }

    #[test]
    fn test_missing_count_rejected() {
        let bp = blueprint(&[("logfan-max-size", "10m")]);
        assert!(matches!(
            validate(&bp),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_options_beyond_count_rejected() {
        let bp = blueprint(&[
            ("logfan-gelf-count", "1"),
            ("logfan-gelf-address.0", "udp://g:12201"),
            ("logfan-gelf-address.1", "udp://h:12201"),
        ]);
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("ordinal 1"));
    }

    #[test]
    fn test_foreign_keys_pass_through() {
        let mut options = HashMap::new();
        options.insert("logfan-gelf-count".to_string(), "0".to_string());
        options.insert("env".to_string(), "PATH".to_string());
        let mut bp = blueprint(&[]);
        bp.options = options;
        assert!(validate(&bp).is_ok());
    }
}
