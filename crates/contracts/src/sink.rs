//! Sink capability interface
//!
//! Defines the abstract interface for record sinks and the adapter that
//! tags a sink with its optional read-back capability.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{LogRecord, ReadConfig, RecordSubscription, SinkError};

/// Record output trait
///
/// All sink implementations must implement this trait. `write` takes the
/// record by value: every sink receives its own copy and sinks never share
/// mutable state through a dispatch.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one record
    ///
    /// # Errors
    /// Returns a write error (should include context); the caller logs and
    /// continues, so a failing sink must not assume it stops the stream.
    async fn write(&self, record: LogRecord) -> Result<(), SinkError>;

    /// Close the sink, releasing its handles. Must be idempotent.
    async fn close(&self) -> Result<(), SinkError>;
}

/// Read-back capability
///
/// Implemented only by sinks whose stored history can be replayed.
pub trait RecordReader: Send + Sync {
    /// Open a live subscription over stored and, optionally, future records
    fn subscribe(&self, config: ReadConfig) -> RecordSubscription;
}

/// A sink tagged with its optional read-back capability.
///
/// The capability is carried as data and checked at attach time, rather than
/// discovered through downcasting.
#[derive(Clone)]
pub struct SinkAdapter {
    sink: Arc<dyn RecordSink>,
    reader: Option<Arc<dyn RecordReader>>,
}

impl SinkAdapter {
    /// Wrap a write-only sink
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self { sink, reader: None }
    }

    /// Wrap a sink that also supports read-back
    pub fn with_reader(sink: Arc<dyn RecordSink>, reader: Arc<dyn RecordReader>) -> Self {
        Self {
            sink,
            reader: Some(reader),
        }
    }

    /// Sink name
    pub fn name(&self) -> &str {
        self.sink.name()
    }

    /// Write one record
    pub async fn write(&self, record: LogRecord) -> Result<(), SinkError> {
        self.sink.write(record).await
    }

    /// Close the underlying sink (idempotent)
    pub async fn close(&self) -> Result<(), SinkError> {
        self.sink.close().await
    }

    /// The read-back capability, when present
    pub fn reader(&self) -> Option<&Arc<dyn RecordReader>> {
        self.reader.as_ref()
    }

    /// Whether this sink supports read-back
    pub fn supports_read_back(&self) -> bool {
        self.reader.is_some()
    }
}

impl std::fmt::Debug for SinkAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkAdapter")
            .field("name", &self.name())
            .field("read_back", &self.supports_read_back())
            .finish()
    }
}
