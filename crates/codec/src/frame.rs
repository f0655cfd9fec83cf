//! Length-prefixed frame codec
//!
//! `[4 bytes big-endian frame length][serialized LogEntry]`, both directions.

use bytes::{Buf, BufMut, BytesMut};
use contracts::LogRecord;
use prost::Message;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;
use crate::wire::LogEntry;

/// Size of the big-endian length prefix
pub const LEN_PREFIX_BYTES: usize = 4;

/// Upper bound on one frame's payload length
pub const MAX_FRAME_LEN: usize = 1_000_000;

/// Frame codec over the wire entry schema.
///
/// The length prefix is consumed before it is validated, so after a bogus
/// length the next decode attempt starts at the following bytes: a corrupted
/// stream is re-attempted frame by frame rather than wedging on one bad
/// prefix. A fresh codec forgets any half-read frame, which is exactly what
/// the pump's resync relies on.
#[derive(Debug)]
pub struct FrameCodec {
    max_frame_len: usize,
    pending: Option<usize>,
}

impl FrameCodec {
    /// Codec with the protocol frame limit
    pub fn new() -> Self {
        Self::with_max_frame_len(MAX_FRAME_LEN)
    }

    /// Codec with a custom frame limit
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            max_frame_len,
            pending: None,
        }
    }

    /// Frame one record: length prefix plus serialized entry
    pub fn encode_record(
        &mut self,
        record: &LogRecord,
        dst: &mut BytesMut,
    ) -> Result<(), CodecError> {
        let entry = LogEntry::from(record);
        self.encode(&entry, dst)
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = LogEntry;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<LogEntry>, CodecError> {
        let len = match self.pending {
            Some(len) => len,
            None => {
                if src.len() < LEN_PREFIX_BYTES {
                    return Ok(None);
                }
                let len = src.get_u32() as usize;
                if len > self.max_frame_len {
                    return Err(CodecError::frame_too_large(len, self.max_frame_len));
                }
                self.pending = Some(len);
                len
            }
        };

        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }

        self.pending = None;
        let frame = src.split_to(len).freeze();
        let entry = LogEntry::decode(frame)?;
        Ok(Some(entry))
    }
}

impl Encoder<&LogEntry> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, entry: &LogEntry, dst: &mut BytesMut) -> Result<(), CodecError> {
        let len = entry.encoded_len();
        if len > self.max_frame_len {
            return Err(CodecError::frame_too_large(len, self.max_frame_len));
        }
        dst.reserve(LEN_PREFIX_BYTES + len);
        dst.put_u32(len as u32);
        entry.encode(dst)?;
        Ok(())
    }
}
