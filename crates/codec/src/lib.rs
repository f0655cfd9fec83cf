//! # Codec
//!
//! Record wire codec.
//!
//! Responsibilities:
//! - Decode a continuous length-prefixed byte stream into wire entries
//! - Encode records back into the identical framing for replay
//! - Classify decode failures as stream-terminal or transient corruption

mod error;
mod frame;
mod wire;

pub use error::CodecError;
pub use frame::{FrameCodec, LEN_PREFIX_BYTES, MAX_FRAME_LEN};
pub use wire::{LogEntry, PartialLogEntryMetadata};
