//! Wire entry messages
//!
//! Protobuf schema shared with the container runtime. Field tags are part of
//! the protocol and must not change:
//!
//! ```text
//! message LogEntry {
//!     string source = 1;
//!     int64 time_nano = 2;
//!     bytes line = 3;
//!     bool partial = 4;
//!     PartialLogEntryMetadata partial_log_metadata = 5;
//! }
//! message PartialLogEntryMetadata {
//!     bool last = 1;
//!     string id = 2;
//!     int32 ordinal = 3;
//! }
//! ```

use bytes::Bytes;
use contracts::{LogRecord, PartialMeta};

/// One serialized frame payload
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LogEntry {
    /// Source tag ("stdout" / "stderr")
    #[prost(string, tag = "1")]
    pub source: ::prost::alloc::string::String,

    /// Unix timestamp in nanoseconds
    #[prost(int64, tag = "2")]
    pub time_nano: i64,

    /// Log payload bytes
    #[prost(bytes = "bytes", tag = "3")]
    pub line: Bytes,

    /// Set when the entry carries a partial-message descriptor
    #[prost(bool, tag = "4")]
    pub partial: bool,

    /// Partial-message descriptor, absent for complete messages
    #[prost(message, optional, tag = "5")]
    pub partial_log_metadata: ::core::option::Option<PartialLogEntryMetadata>,
}

/// Fragment metadata for messages split across frames
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PartialLogEntryMetadata {
    /// Whether this fragment closes the logical message
    #[prost(bool, tag = "1")]
    pub last: bool,

    /// Identifier shared by all fragments of one logical message
    #[prost(string, tag = "2")]
    pub id: ::prost::alloc::string::String,

    /// Zero-based fragment position
    #[prost(int32, tag = "3")]
    pub ordinal: i32,
}

impl From<LogEntry> for LogRecord {
    fn from(entry: LogEntry) -> Self {
        // The wire `partial` flag is advisory on ingest; descriptor presence
        // is authoritative.
        LogRecord {
            line: entry.line,
            source: entry.source,
            time_nano: entry.time_nano,
            partial: entry.partial_log_metadata.map(|meta| PartialMeta {
                id: meta.id,
                ordinal: meta.ordinal,
                last: meta.last,
            }),
        }
    }
}

impl From<&LogRecord> for LogEntry {
    fn from(record: &LogRecord) -> Self {
        LogEntry {
            source: record.source.clone(),
            time_nano: record.time_nano,
            line: record.line.clone(),
            // Derived from descriptor presence, not from its `last` field:
            // downstream consumers reassemble with their own ordinal tracking.
            partial: record.partial.is_some(),
            partial_log_metadata: record.partial.as_ref().map(|meta| PartialLogEntryMetadata {
                last: meta.last,
                id: meta.id.clone(),
                ordinal: meta.ordinal,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_entry_record_round_trip() {
        let entry = LogEntry {
            source: "stdout".to_string(),
            time_nano: 1_700_000_000_000_000_000,
            line: Bytes::from_static(b"a line"),
            partial: true,
            partial_log_metadata: Some(PartialLogEntryMetadata {
                last: false,
                id: "msg-1".to_string(),
                ordinal: 0,
            }),
        };

        let record = LogRecord::from(entry.clone());
        assert_eq!(record.source, "stdout");
        assert!(record.is_partial());

        let back = LogEntry::from(&record);
        assert_eq!(back, entry);
    }

    #[test]
    fn test_partial_flag_follows_descriptor_presence() {
        let record = LogRecord::new(&b"x"[..], "stderr", 7);
        let entry = LogEntry::from(&record);
        assert!(!entry.partial);
        assert!(entry.partial_log_metadata.is_none());

        let record = record.with_partial(PartialMeta {
            id: "m".to_string(),
            ordinal: 3,
            last: true,
        });
        let entry = LogEntry::from(&record);
        assert!(entry.partial);
    }

    #[test]
    fn test_proto_field_tags_are_stable() {
        // 0x0a = field 1 (source), length-delimited; the runtime depends on
        // this exact layout.
        let entry = LogEntry {
            source: "s".to_string(),
            ..Default::default()
        };
        let bytes = entry.encode_to_vec();
        assert_eq!(bytes[0], 0x0a);
    }
}
