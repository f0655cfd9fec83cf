//! Codec error types

use thiserror::Error;

/// Frame codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    /// IO failure on the underlying stream, including end-of-stream and a
    /// handle closed by concurrent teardown
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Length prefix larger than the frame limit
    #[error("frame length {len} exceeds limit {max}")]
    FrameTooLarge { len: usize, max: usize },

    /// Frame payload did not deserialize
    #[error("frame decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Entry did not serialize
    #[error("frame encode error: {0}")]
    Encode(#[from] prost::EncodeError),
}

impl CodecError {
    /// Create a frame-too-large error
    pub fn frame_too_large(len: usize, max: usize) -> Self {
        Self::FrameTooLarge { len, max }
    }

    /// Whether this error permanently ends the stream.
    ///
    /// Terminal conditions stop the pump; any other decode error is transient
    /// framing corruption recovered by resyncing the decoder.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
