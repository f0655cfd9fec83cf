//! Driver error types

use contracts::SinkError;
use thiserror::Error;

/// Driver-level errors surfaced to the host runtime
#[derive(Debug, Error)]
pub enum DriverError {
    /// A live session already owns this stream id
    #[error("session already exists for stream '{stream_id}'")]
    SessionExists { stream_id: String },

    /// No live session for this stream or owner id
    #[error("no session for '{id}'")]
    NotFound { id: String },

    /// A sink failed to validate its options or to construct
    #[error("failed to build sink '{name}': {source}")]
    SinkConstruction {
        name: String,
        #[source]
        source: SinkError,
    },

    /// The input stream could not be opened
    #[error("failed to open input stream '{stream_id}': {source}")]
    StreamOpen {
        stream_id: String,
        #[source]
        source: std::io::Error,
    },

    /// Replay requested against a sink without read-back
    #[error("sink '{name}' does not support read-back")]
    ReplayUnsupported { name: String },
}

impl DriverError {
    /// Create a duplicate-session error
    pub fn session_exists(stream_id: impl Into<String>) -> Self {
        Self::SessionExists {
            stream_id: stream_id.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a sink-construction error
    pub fn sink_construction(name: impl Into<String>, source: SinkError) -> Self {
        Self::SinkConstruction {
            name: name.into(),
            source,
        }
    }

    /// Create a stream-open error
    pub fn stream_open(stream_id: impl Into<String>, source: std::io::Error) -> Self {
        Self::StreamOpen {
            stream_id: stream_id.into(),
            source,
        }
    }

    /// Create a replay-unsupported error
    pub fn replay_unsupported(name: impl Into<String>) -> Self {
        Self::ReplayUnsupported { name: name.into() }
    }
}
