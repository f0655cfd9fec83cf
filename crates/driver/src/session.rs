//! Session - one input stream and its set of sinks

use std::sync::atomic::{AtomicBool, Ordering};

use contracts::{LogRecord, SessionInfo, SinkAdapter};
use observability::{record_dispatched, record_session_closed, record_sink_write_failure};
use tracing::{error, instrument};

use crate::stream::StreamHandle;

/// The live association between one input stream and its sinks.
///
/// Owns the sink adapters and the input stream's close handle; the registry
/// holds it by `Arc` and controls creation/destruction ordering.
#[derive(Debug)]
pub struct Session {
    stream_id: String,
    info: SessionInfo,
    telemetry: Vec<SinkAdapter>,
    durable: SinkAdapter,
    stream: StreamHandle,
    closed: AtomicBool,
}

impl Session {
    pub(crate) fn new(
        stream_id: String,
        info: SessionInfo,
        durable: SinkAdapter,
        telemetry: Vec<SinkAdapter>,
        stream: StreamHandle,
    ) -> Self {
        Self {
            stream_id,
            info,
            telemetry,
            durable,
            stream,
            closed: AtomicBool::new(false),
        }
    }

    /// Stream identifier (the input path)
    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Owner identifier (the originating container)
    pub fn owner_id(&self) -> &str {
        &self.info.container_id
    }

    /// Originating configuration snapshot
    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    /// The durable sink
    pub fn durable(&self) -> &SinkAdapter {
        &self.durable
    }

    /// Telemetry sinks in configuration order
    pub fn telemetry(&self) -> &[SinkAdapter] {
        &self.telemetry
    }

    /// Whether teardown has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Dispatch one decoded record to every sink.
    ///
    /// Telemetry sinks first, in configuration order, then the durable sink;
    /// each receives its own copy, written to completion before the next.
    /// A failing sink is logged and counted; it never stops the loop or
    /// affects delivery to its neighbors.
    pub(crate) async fn dispatch(&self, record: &LogRecord) {
        for sink in &self.telemetry {
            if let Err(err) = sink.write(record.clone()).await {
                record_sink_write_failure(sink.name());
                error!(
                    container = %self.info.container_id,
                    sink = sink.name(),
                    error = %err,
                    "telemetry sink write failed"
                );
            }
        }
        if let Err(err) = self.durable.write(record.clone()).await {
            record_sink_write_failure(self.durable.name());
            error!(
                container = %self.info.container_id,
                sink = self.durable.name(),
                error = %err,
                "durable sink write failed"
            );
        }
        record_dispatched(&record.source);
    }

    /// Teardown: close the input stream first (this unblocks the pump's
    /// pending read), then every telemetry sink, then the durable sink.
    /// Idempotent; individual close failures are logged, never raised.
    #[instrument(
        name = "session_close",
        skip(self),
        fields(stream = %self.stream_id, container = %self.info.container_id)
    )]
    pub(crate) async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stream.close();
        for sink in &self.telemetry {
            if let Err(err) = sink.close().await {
                error!(sink = sink.name(), error = %err, "error closing telemetry sink");
            }
        }
        if let Err(err) = self.durable.close().await {
            error!(sink = self.durable.name(), error = %err, "error closing durable sink");
        }
        record_session_closed();
    }
}
