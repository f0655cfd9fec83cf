//! Config loader error types

use thiserror::Error;

/// Blueprint loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Blueprint did not parse
    #[error("config parse error: {message}")]
    Parse { message: String },

    /// Blueprint parsed but is not legal
    #[error("config validation error at '{field}': {message}")]
    Validation { field: String, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
