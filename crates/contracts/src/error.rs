//! Layered error definitions
//!
//! Categorized by source: option handling / write path / connection / lifecycle

use thiserror::Error;

/// Unified sink error type
#[derive(Debug, Error)]
pub enum SinkError {
    // ===== Configuration Errors =====
    /// Option failed validation
    #[error("invalid option '{key}': {message}")]
    InvalidOption { key: String, message: String },

    /// Required option absent
    #[error("missing required option '{key}'")]
    MissingOption { key: String },

    // ===== Write Path Errors =====
    /// Sink rejected one record
    #[error("sink '{sink_name}' write error: {message}")]
    Write { sink_name: String, message: String },

    /// Sink transport could not be established or re-established
    #[error("sink '{sink_name}' connection error: {message}")]
    Connection { sink_name: String, message: String },

    // ===== Lifecycle Errors =====
    /// Write attempted after close
    #[error("sink '{sink_name}' is closed")]
    Closed { sink_name: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SinkError {
    /// Create an invalid-option error
    pub fn invalid_option(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a missing-option error
    pub fn missing_option(key: impl Into<String>) -> Self {
        Self::MissingOption { key: key.into() }
    }

    /// Create a write error
    pub fn write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create a closed-sink error
    pub fn closed(sink_name: impl Into<String>) -> Self {
        Self::Closed {
            sink_name: sink_name.into(),
        }
    }
}
