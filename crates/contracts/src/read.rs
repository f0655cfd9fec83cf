//! Read-back subscription types

use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{LogRecord, SinkError};

/// Options for a read-back subscription
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadConfig {
    /// Deliver only the last N stored records of history (None = all)
    pub tail: Option<usize>,

    /// Keep the subscription open and forward records written after attach
    pub follow: bool,
}

impl ReadConfig {
    /// History plus live records until detach
    pub fn follow() -> Self {
        Self {
            tail: None,
            follow: true,
        }
    }

    /// Stored history only; the record channel closes once drained
    pub fn history() -> Self {
        Self {
            tail: None,
            follow: false,
        }
    }
}

/// A live read-back subscription on one sink.
///
/// Records and terminal errors arrive on separate channels. Dropping the
/// subscription notifies the sink that the consumer detached, so it can
/// release reader-side resources; `detach` makes that explicit.
pub struct RecordSubscription {
    /// Replayed and followed records, in storage order
    pub records: mpsc::Receiver<LogRecord>,

    /// Terminal subscription error, at most one
    pub errors: mpsc::Receiver<SinkError>,

    _detach: DropGuard,
}

impl RecordSubscription {
    /// Build a subscription whose drop cancels `detach_token`
    pub fn new(
        records: mpsc::Receiver<LogRecord>,
        errors: mpsc::Receiver<SinkError>,
        detach_token: CancellationToken,
    ) -> Self {
        Self {
            records,
            errors,
            _detach: detach_token.drop_guard(),
        }
    }

    /// Notify the sink that this consumer is gone
    pub fn detach(self) {}
}
