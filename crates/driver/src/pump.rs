//! Ingest pump - decode loop for one session

use std::sync::Arc;

use codec::FrameCodec;
use contracts::LogRecord;
use observability::record_decoder_resync;
use tokio_stream::StreamExt;
use tokio_util::codec::FramedRead;
use tracing::{debug, warn};

use crate::registry::SessionRegistry;
use crate::session::Session;
use crate::stream::InputStream;

/// Run one session's ingest loop to completion.
///
/// Decodes frames and fans each record out strictly sequentially; the slowest
/// sink delays the next decode, which is the chosen back-pressure mechanism.
/// Terminal stream conditions end the task and self-tear-down the session;
/// transient decode corruption installs a fresh decoder over the same stream
/// and continues, indefinitely and without backoff.
pub(crate) async fn run(session: Arc<Session>, registry: SessionRegistry, input: InputStream) {
    let mut frames = FramedRead::new(input, FrameCodec::new());
    debug!(stream = session.stream_id(), "ingest pump started");

    loop {
        match frames.next().await {
            Some(Ok(entry)) => {
                let record = LogRecord::from(entry);
                session.dispatch(&record).await;
            }
            Some(Err(err)) if err.is_terminal() => {
                debug!(
                    stream = session.stream_id(),
                    error = %err,
                    "input stream terminated"
                );
                break;
            }
            Some(Err(err)) => {
                warn!(
                    stream = session.stream_id(),
                    container = session.owner_id(),
                    error = %err,
                    "transient decode failure, resyncing"
                );
                record_decoder_resync();
                // Fresh decoder over the same stream; any half-read frame is
                // forgotten while the read position is preserved.
                *frames.decoder_mut() = FrameCodec::new();
            }
            None => {
                debug!(stream = session.stream_id(), "input stream reached end");
                break;
            }
        }
    }

    // Clean end-of-stream tears the session down without an explicit stop.
    registry.detach(session.stream_id());
    session.close().await;
    debug!(stream = session.stream_id(), "ingest pump stopped");
}
