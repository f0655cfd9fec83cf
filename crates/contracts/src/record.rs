//! LogRecord - the canonical decoded log unit

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One decoded log record.
///
/// Timestamps are monotonically non-decreasing within one session's sequence
/// as emitted by the runtime; this is upstream-guaranteed and not re-validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Opaque payload bytes (one log line, without framing)
    pub line: Bytes,

    /// Source tag, e.g. "stdout" / "stderr"
    pub source: String,

    /// Unix timestamp in nanoseconds
    pub time_nano: i64,

    /// Present when this record is one fragment of a larger logical message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial: Option<PartialMeta>,
}

/// Partial-message descriptor
///
/// Marks a record as one fragment of a logical message split across frames.
/// Consumers reassemble using their own ordinal tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialMeta {
    /// Identifier shared by all fragments of one logical message
    pub id: String,

    /// Zero-based fragment position
    pub ordinal: i32,

    /// Whether this fragment closes the logical message
    pub last: bool,
}

impl LogRecord {
    /// Create a record without a partial-message descriptor
    pub fn new(line: impl Into<Bytes>, source: impl Into<String>, time_nano: i64) -> Self {
        Self {
            line: line.into(),
            source: source.into(),
            time_nano,
            partial: None,
        }
    }

    /// Attach a partial-message descriptor
    pub fn with_partial(mut self, partial: PartialMeta) -> Self {
        self.partial = Some(partial);
        self
    }

    /// Whether this record carries a partial-message descriptor
    pub fn is_partial(&self) -> bool {
        self.partial.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_independent() {
        let record = LogRecord::new(&b"hello"[..], "stdout", 42);
        let copy = record.clone();
        drop(record);
        assert_eq!(copy.line.as_ref(), b"hello");
        assert_eq!(copy.source, "stdout");
    }

    #[test]
    fn test_serde_round_trip_preserves_bytes() {
        let record = LogRecord::new(vec![0u8, 159, 146, 150], "stderr", 1_700_000_000).with_partial(
            PartialMeta {
                id: "m1".to_string(),
                ordinal: 2,
                last: true,
            },
        );

        let json = serde_json::to_string(&record).unwrap();
        let back: LogRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_partial_absent_is_omitted() {
        let record = LogRecord::new(&b"x"[..], "stdout", 1);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("partial"));
    }
}
