//! Blueprint parsing
//!
//! TOML is the primary format; JSON is accepted for runtime-generated files.

use crate::blueprint::SessionBlueprint;
use crate::error::ConfigError;

/// Blueprint file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse a TOML blueprint
pub fn parse_toml(content: &str) -> Result<SessionBlueprint, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::parse(format!("TOML parse error: {e}")))
}

/// Parse a JSON blueprint
pub fn parse_json(content: &str) -> Result<SessionBlueprint, ConfigError> {
    serde_json::from_str(content).map_err(|e| ConfigError::parse(format!("JSON parse error: {e}")))
}

/// Parse a blueprint in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<SessionBlueprint, ConfigError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
stream = "/run/logfan/web.fifo"

[container]
id = "abc"
name = "web"

[options]
"logfan-gelf-count" = "1"
"logfan-gelf-address.0" = "udp://graylog:12201"
"#;
        let blueprint = parse_toml(content).unwrap();
        assert_eq!(blueprint.container.name, "web");
        assert_eq!(blueprint.options.len(), 2);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "stream": "/run/logfan/web.fifo",
            "container": { "id": "abc" },
            "options": { "logfan-gelf-count": "0" }
        }"#;
        let blueprint = parse_json(content).unwrap();
        assert_eq!(blueprint.container.id, "abc");
        assert!(blueprint.container.name.is_empty());
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let result = parse_toml("not toml [[[");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
