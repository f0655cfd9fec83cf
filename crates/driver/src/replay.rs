//! Replay Bridge - wire framing over a sink's stored history
//!
//! Attaches to the durable sink's read-back subscription and re-encodes each
//! record into the ingest wire framing on an output byte stream, until the
//! consumer detaches or the source exhausts.

use std::io;

use bytes::{Bytes, BytesMut};
use codec::FrameCodec;
use contracts::ReadConfig;
use observability::{record_replay_frame, record_replay_opened};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::io::StreamReader;
use tracing::{debug, instrument};

use crate::error::DriverError;
use crate::session::Session;

/// Replay output: an `AsyncRead` yielding length-prefixed frames
pub type ReplayStream = StreamReader<ReceiverStream<Result<Bytes, io::Error>>, Bytes>;

const REPLAY_BUFFER: usize = 64;

/// Attach to a session's durable sink and bridge its records onto a byte
/// stream.
///
/// Fails with `ReplayUnsupported` when the durable sink carries no read-back
/// capability. The bridge task ends when the subscription closes (clean
/// end-of-stream for the consumer), the subscription errors (surfaced as a
/// read error), or the consumer drops the stream, in which case dropping the
/// subscription notifies the sink to release its reader-side resources.
#[instrument(name = "replay_open", skip(session, config), fields(container = %session.owner_id()))]
pub(crate) fn open(session: &Session, config: ReadConfig) -> Result<ReplayStream, DriverError> {
    let durable = session.durable();
    let reader = durable
        .reader()
        .ok_or_else(|| DriverError::replay_unsupported(durable.name()))?;

    let mut subscription = reader.subscribe(config);
    let (tx, rx) = mpsc::channel::<Result<Bytes, io::Error>>(REPLAY_BUFFER);
    record_replay_opened();

    let owner = session.owner_id().to_string();
    tokio::spawn(async move {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        let mut errors_closed = false;
        loop {
            tokio::select! {
                record = subscription.records.recv() => match record {
                    Some(record) => {
                        buf.clear();
                        if let Err(err) = codec.encode_record(&record, &mut buf) {
                            let _ = tx.send(Err(io::Error::other(err))).await;
                            break;
                        }
                        record_replay_frame();
                        if tx.send(Ok(buf.split().freeze())).await.is_err() {
                            // Consumer disconnected. Dropping the
                            // subscription below notifies the sink.
                            break;
                        }
                    }
                    // Source exhausted: dropping the sender closes the
                    // output stream cleanly.
                    None => break,
                },
                error = subscription.errors.recv(), if !errors_closed => match error {
                    Some(err) => {
                        let _ = tx.send(Err(io::Error::other(err))).await;
                        break;
                    }
                    None => errors_closed = true,
                },
            }
        }
        debug!(container = %owner, "replay bridge closed");
    });

    Ok(StreamReader::new(ReceiverStream::new(rx)))
}
