//! # Config Loader
//!
//! Session blueprint loading and parsing for CLI hosts.
//!
//! Responsibilities:
//! - Parse TOML/JSON blueprint files
//! - Validate blueprint legality (identifiers, option keys, sink count)
//! - Produce the `SessionInfo` handed to the driver
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("session.toml")).unwrap();
//! println!("stream: {}", blueprint.stream.display());
//! ```

mod blueprint;
mod error;
mod parser;
mod validator;

pub use blueprint::{ContainerSection, SessionBlueprint};
pub use error::ConfigError;
pub use parser::ConfigFormat;

use std::path::Path;

/// Blueprint loader
///
/// Provides static methods to load a blueprint from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a blueprint from a file path.
    ///
    /// Detects the format from the file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<SessionBlueprint, ConfigError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load a blueprint from a string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<SessionBlueprint, ConfigError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ConfigError::parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::parse(format!("unsupported config format: .{ext}")))
    }
}
