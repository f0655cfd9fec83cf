//! JsonFileSink - durable sink with read-back
//!
//! One JSON line per record (lossless serde of `LogRecord`), size-based
//! rotation, and a tail/follow subscription over the stored history.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{
    LogRecord, ReadConfig, RecordReader, RecordSink, RecordSubscription, SinkError,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::follow::{deliver, fan_to_followers, Follower, FOLLOWER_BUFFER, SUBSCRIPTION_BUFFER};
use crate::options::parse_byte_size;

/// Configuration for the durable file sink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Storage path of the current log file
    pub path: PathBuf,

    /// Rotate once the current file would exceed this many bytes
    pub max_size: Option<u64>,

    /// Number of files kept, current one included
    pub max_files: usize,

    /// Accepted for compatibility; rotated files stay uncompressed
    pub compress: bool,
}

impl FileSinkConfig {
    /// Build and validate config from the sink's un-scoped option subset
    pub fn from_options(
        path: impl Into<PathBuf>,
        options: &HashMap<String, String>,
    ) -> Result<Self, SinkError> {
        let max_size = match options.get("max-size") {
            Some(value) => Some(
                parse_byte_size(value)
                    .map_err(|message| SinkError::invalid_option("max-size", message))?,
            ),
            None => None,
        };

        let max_files = match options.get("max-file") {
            Some(value) => {
                let count: usize = value.parse().map_err(|_| {
                    SinkError::invalid_option(
                        "max-file",
                        format!("expected a positive integer, got {value:?}"),
                    )
                })?;
                if count == 0 {
                    return Err(SinkError::invalid_option("max-file", "must be at least 1"));
                }
                count
            }
            None => 1,
        };

        let compress = match options.get("compress") {
            Some(value) => value.parse::<bool>().map_err(|_| {
                SinkError::invalid_option(
                    "compress",
                    format!("expected true or false, got {value:?}"),
                )
            })?,
            None => false,
        };

        Ok(Self {
            path: path.into(),
            max_size,
            max_files,
            compress,
        })
    }
}

struct FileState {
    /// None once the sink is closed
    file: Option<File>,
    /// Bytes written to the current file
    written: u64,
    followers: Vec<Follower>,
}

/// Durable sink that stores records as JSON lines
pub struct JsonFileSink {
    name: String,
    config: FileSinkConfig,
    state: Mutex<FileState>,
    closed: AtomicBool,
}

impl JsonFileSink {
    /// Validate options and open the storage file
    pub fn create(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        options: &HashMap<String, String>,
    ) -> Result<Self, SinkError> {
        let config = FileSinkConfig::from_options(path, options)?;
        Self::with_config(name, config)
    }

    /// Open the storage file for an already validated config
    pub fn with_config(name: impl Into<String>, config: FileSinkConfig) -> Result<Self, SinkError> {
        let name = name.into();
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = open_append(&config.path)?;
        let written = file.metadata()?.len();

        if config.compress {
            warn!(sink = %name, "rotated-file compression requested but not applied");
        }

        Ok(Self {
            name,
            config,
            state: Mutex::new(FileState {
                file: Some(file),
                written,
                followers: Vec::new(),
            }),
            closed: AtomicBool::new(false),
        })
    }

    /// Storage path of the current file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    // A poisoned lock only means a writer panicked mid-write; the map state
    // itself stays usable.
    fn lock_state(&self) -> MutexGuard<'_, FileState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn rotate(&self, state: &mut FileState) -> Result<(), SinkError> {
        state.file = None;
        let path = &self.config.path;
        if self.config.max_files > 1 {
            // Shift path.N-1 -> path.N down to path -> path.1; the oldest
            // file falls off the end.
            for index in (1..self.config.max_files).rev() {
                let from = if index == 1 {
                    path.clone()
                } else {
                    rotated_path(path, index - 1)
                };
                let to = rotated_path(path, index);
                match std::fs::rename(&from, &to) {
                    Ok(()) => {}
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => return Err(SinkError::write(&self.name, err.to_string())),
                }
            }
        } else {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(SinkError::write(&self.name, err.to_string())),
            }
        }

        let file = open_append(path)?;
        state.file = Some(file);
        state.written = 0;
        debug!(sink = %self.name, path = %path.display(), "log file rotated");
        Ok(())
    }

    /// Rotated files oldest-first, then the current file capped at `written`
    fn history_snapshot(&self, state: &FileState) -> Vec<(PathBuf, Option<u64>)> {
        let mut files = Vec::new();
        for index in (1..self.config.max_files).rev() {
            let path = rotated_path(&self.config.path, index);
            if path.exists() {
                files.push((path, None));
            }
        }
        files.push((self.config.path.clone(), Some(state.written)));
        files
    }
}

#[async_trait::async_trait]
impl RecordSink for JsonFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, record: LogRecord) -> Result<(), SinkError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SinkError::closed(&self.name));
        }

        let mut line = serde_json::to_vec(&record)
            .map_err(|err| SinkError::write(&self.name, err.to_string()))?;
        line.push(b'\n');

        let mut state = self.lock_state();
        if let Some(max_size) = self.config.max_size {
            if state.written > 0 && state.written + line.len() as u64 > max_size {
                self.rotate(&mut state)?;
            }
        }
        let Some(file) = state.file.as_mut() else {
            return Err(SinkError::closed(&self.name));
        };
        file.write_all(&line)
            .map_err(|err| SinkError::write(&self.name, err.to_string()))?;
        state.written += line.len() as u64;

        fan_to_followers(&mut state.followers, &record, &self.name);
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self), fields(sink = %self.name))]
    async fn close(&self) -> Result<(), SinkError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut state = self.lock_state();
        // Dropping the follower senders ends live subscriptions cleanly.
        state.followers.clear();
        if let Some(file) = state.file.take() {
            file.sync_all()?;
        }
        debug!(sink = %self.name, "JsonFileSink closed");
        Ok(())
    }
}

impl RecordReader for JsonFileSink {
    fn subscribe(&self, config: ReadConfig) -> RecordSubscription {
        let (record_tx, records) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let (error_tx, errors) = mpsc::channel(1);
        let detach = CancellationToken::new();

        // Follower registration and the history boundary are captured under
        // one lock: records written after this point arrive only on the live
        // channel, records before it only through the files.
        let (history_files, live) = {
            let mut state = self.lock_state();
            let files = self.history_snapshot(&state);
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
            (files, live)
        };

        let sink_name = self.name.clone();
        let task_detach = detach.clone();
        tokio::spawn(async move {
            let history = match read_history(&history_files) {
                Ok(records) => records,
                Err(err) => {
                    let _ = error_tx
                        .send(SinkError::write(&sink_name, err.to_string()))
                        .await;
                    return;
                }
            };
            deliver(history, config.tail, live, record_tx, task_detach).await;
        });

        RecordSubscription::new(records, errors, detach)
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn rotated_path(path: &Path, index: usize) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(format!(".{index}"));
    PathBuf::from(os)
}

fn read_history(files: &[(PathBuf, Option<u64>)]) -> std::io::Result<Vec<LogRecord>> {
    let mut records = Vec::new();
    for (path, limit) in files {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(err),
        };
        let reader: Box<dyn BufRead> = match limit {
            Some(bytes) => Box::new(BufReader::new(file.take(*bytes))),
            None => Box::new(BufReader::new(file)),
        };
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let record: LogRecord = serde_json::from_str(&line)
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
            records.push(record);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(i: i64) -> LogRecord {
        LogRecord::new(format!("line {i}").into_bytes(), "stdout", i)
    }

    fn open_sink(dir: &Path, options: &[(&str, &str)]) -> JsonFileSink {
        let options: HashMap<String, String> = options
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        JsonFileSink::create("durable", dir.join("container.log"), &options).unwrap()
    }

    #[tokio::test]
    async fn test_write_then_history_read() {
        let dir = tempdir().unwrap();
        let sink = open_sink(dir.path(), &[]);

        for i in 0..5 {
            sink.write(record(i)).await.unwrap();
        }

        let mut subscription = sink.subscribe(ReadConfig::history());
        let mut seen = Vec::new();
        while let Some(r) = subscription.records.recv().await {
            seen.push(r.time_nano);
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_tail_limits_history() {
        let dir = tempdir().unwrap();
        let sink = open_sink(dir.path(), &[]);
        for i in 0..10 {
            sink.write(record(i)).await.unwrap();
        }

        let mut subscription = sink.subscribe(ReadConfig {
            tail: Some(2),
            follow: false,
        });
        let mut seen = Vec::new();
        while let Some(r) = subscription.records.recv().await {
            seen.push(r.time_nano);
        }
        assert_eq!(seen, vec![8, 9]);
    }

    #[tokio::test]
    async fn test_follow_receives_later_writes() {
        let dir = tempdir().unwrap();
        let sink = open_sink(dir.path(), &[]);
        sink.write(record(0)).await.unwrap();

        let mut subscription = sink.subscribe(ReadConfig::follow());
        assert_eq!(subscription.records.recv().await.unwrap().time_nano, 0);

        sink.write(record(1)).await.unwrap();
        assert_eq!(subscription.records.recv().await.unwrap().time_nano, 1);

        // Closing the sink ends the subscription.
        sink.close().await.unwrap();
        assert!(subscription.records.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_rotation_keeps_bounded_files_and_history_order() {
        let dir = tempdir().unwrap();
        let sink = open_sink(dir.path(), &[("max-size", "1k"), ("max-file", "2")]);

        // Enough records to rotate at least once.
        for i in 0..64 {
            sink.write(record(i)).await.unwrap();
        }
        assert!(rotated_path(sink.path(), 1).exists());
        assert!(!rotated_path(sink.path(), 2).exists());

        let mut subscription = sink.subscribe(ReadConfig::history());
        let mut seen = Vec::new();
        while let Some(r) = subscription.records.recv().await {
            seen.push(r.time_nano);
        }
        // Possibly truncated at the front by rotation, never reordered and
        // always ending with the latest record.
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*seen.last().unwrap(), 63);
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_rejects_writes() {
        let dir = tempdir().unwrap();
        let sink = open_sink(dir.path(), &[]);
        sink.close().await.unwrap();
        sink.close().await.unwrap();
        assert!(matches!(
            sink.write(record(0)).await,
            Err(SinkError::Closed { .. })
        ));
    }

    #[test]
    fn test_config_rejects_bad_options() {
        let bad_size: HashMap<_, _> =
            [("max-size".to_string(), "ten".to_string())].into_iter().collect();
        assert!(matches!(
            FileSinkConfig::from_options("/tmp/x", &bad_size),
            Err(SinkError::InvalidOption { .. })
        ));

        let bad_count: HashMap<_, _> =
            [("max-file".to_string(), "0".to_string())].into_iter().collect();
        assert!(matches!(
            FileSinkConfig::from_options("/tmp/x", &bad_count),
            Err(SinkError::InvalidOption { .. })
        ));
    }
}
