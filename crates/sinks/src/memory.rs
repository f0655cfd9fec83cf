//! MemorySink - in-memory sink with read-back, for tests
//!
//! Stores every write and supports the full subscription surface, so driver
//! and integration tests can assert fan-out and replay without touching the
//! filesystem.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{
    LogRecord, ReadConfig, RecordReader, RecordSink, RecordSubscription, SinkError,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::follow::{deliver, fan_to_followers, Follower, FOLLOWER_BUFFER, SUBSCRIPTION_BUFFER};

struct MemoryState {
    records: Vec<LogRecord>,
    followers: Vec<Follower>,
}

/// Sink that keeps all records in memory
pub struct MemorySink {
    name: String,
    state: Mutex<MemoryState>,
    closed: AtomicBool,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(MemoryState {
                records: Vec::new(),
                followers: Vec::new(),
            }),
            closed: AtomicBool::new(false),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of everything written so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock_state().records.clone()
    }

    /// Number of records written so far
    pub fn write_count(&self) -> usize {
        self.lock_state().records.len()
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RecordSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, record: LogRecord) -> Result<(), SinkError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SinkError::closed(&self.name));
        }
        let mut state = self.lock_state();
        state.records.push(record.clone());
        fan_to_followers(&mut state.followers, &record, &self.name);
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.lock_state().followers.clear();
        Ok(())
    }
}

impl RecordReader for MemorySink {
    fn subscribe(&self, config: ReadConfig) -> RecordSubscription {
        let (record_tx, records) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let (_error_tx, errors) = mpsc::channel(1);
        let detach = CancellationToken::new();

        let (history, live) = {
            let mut state = self.lock_state();
            let history = state.records.clone();
            let live = if config.follow && !self.closed.load(Ordering::SeqCst) {
                let (tx, rx) = mpsc::channel(FOLLOWER_BUFFER);
                state.followers.push(Follower {
                    tx,
                    detached: detach.clone(),
                });
                Some(rx)
            } else {
                None
            };
            (history, live)
        };

        let task_detach = detach.clone();
        tokio::spawn(async move {
            deliver(history, config.tail, live, record_tx, task_detach).await;
        });

        RecordSubscription::new(records, errors, detach)
    }
}
