//! Shared read-back plumbing for sinks with stored history
//!
//! A subscription delivers stored history first, then (when following) live
//! records handed over by the write path. The follower is registered and the
//! history boundary captured under the sink's state lock, so no record is
//! missed or delivered twice across the hand-off.

use contracts::LogRecord;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Channel capacity towards one subscription consumer
pub(crate) const SUBSCRIPTION_BUFFER: usize = 1024;

/// Channel capacity from the write path to one follower
pub(crate) const FOLLOWER_BUFFER: usize = 1024;

/// One live read-back consumer registered with a sink
pub(crate) struct Follower {
    pub tx: mpsc::Sender<LogRecord>,
    pub detached: CancellationToken,
}

/// Forward a freshly written record to every live follower.
///
/// Detached and closed followers are dropped from the list. A follower whose
/// buffer is full loses the record (logged) rather than blocking the write
/// path.
pub(crate) fn fan_to_followers(followers: &mut Vec<Follower>, record: &LogRecord, sink_name: &str) {
    followers.retain(|follower| {
        if follower.detached.is_cancelled() {
            return false;
        }
        match follower.tx.try_send(record.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(sink = %sink_name, "slow read-back consumer, record dropped");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    });
}

/// Deliver history then live records to one subscription consumer.
///
/// Ends when: the history (non-follow) is drained, the consumer detaches or
/// drops its receiver, or the sink closes the live channel.
pub(crate) async fn deliver(
    history: Vec<LogRecord>,
    tail: Option<usize>,
    live: Option<mpsc::Receiver<LogRecord>>,
    record_tx: mpsc::Sender<LogRecord>,
    detach: CancellationToken,
) {
    let skip = tail
        .map(|n| history.len().saturating_sub(n))
        .unwrap_or(0);
    for record in history.into_iter().skip(skip) {
        tokio::select! {
            _ = detach.cancelled() => return,
            sent = record_tx.send(record) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }

    let Some(mut live) = live else {
        // History-only read: dropping the sender closes the record channel.
        return;
    };
    loop {
        tokio::select! {
            _ = detach.cancelled() => return,
            record = live.recv() => match record {
                Some(record) => {
                    if record_tx.send(record).await.is_err() {
                        return;
                    }
                }
                None => return,
            }
        }
    }
}
