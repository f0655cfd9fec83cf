//! # Integration Tests
//!
//! End-to-end tests over the full driver stack: framed input streams,
//! session registry, ingest pump, sinks, and the replay bridge.

#[cfg(test)]
mod support {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::BytesMut;
    use codec::FrameCodec;
    use contracts::{LogRecord, RecordSink, SessionInfo, SinkAdapter, SinkError};
    use sinks::MemorySink;
    use tokio::io::AsyncWriteExt;

    /// A telemetry sink that rejects every write
    pub struct FailingSink {
        name: String,
    }

    impl FailingSink {
        pub fn new(name: impl Into<String>) -> Self {
            Self { name: name.into() }
        }
    }

    #[async_trait]
    impl RecordSink for FailingSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&self, _record: LogRecord) -> Result<(), SinkError> {
            Err(SinkError::write(&self.name, "injected failure"))
        }

        async fn close(&self) -> Result<(), SinkError> {
            Ok(())
        }
    }

    pub fn record(i: i64) -> LogRecord {
        LogRecord::new(format!("line {i}").into_bytes(), "stdout", i)
    }

    pub fn memory_adapter(name: &str) -> (Arc<MemorySink>, SinkAdapter) {
        let sink = Arc::new(MemorySink::new(name));
        let adapter = SinkAdapter::with_reader(sink.clone(), sink.clone());
        (sink, adapter)
    }

    pub fn durable_only_info(dir: &std::path::Path, container: &str) -> SessionInfo {
        SessionInfo::new(container, "web")
            .with_option("logfan-gelf-count", "0")
            .with_log_path(dir.join(format!("{container}.log")))
    }

    pub fn encode_frames(records: &[LogRecord]) -> BytesMut {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        for record in records {
            codec.encode_record(record, &mut buf).unwrap();
        }
        buf
    }

    pub async fn write_frames(writer: &mut tokio::io::DuplexStream, records: &[LogRecord]) {
        let frames = encode_frames(records);
        writer.write_all(&frames).await.unwrap();
    }

    pub async fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
        for _ in 0..500 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {what}");
    }
}

#[cfg(test)]
mod session_tests {
    use std::sync::Arc;

    use contracts::SinkAdapter;
    use driver::{DriverError, SessionRegistry};

    use crate::support::*;

    /// Exactly one of many concurrent creates for one stream id wins.
    #[tokio::test]
    async fn test_concurrent_create_has_single_winner() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::new();

        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = registry.clone();
            let info = durable_only_info(dir.path(), &format!("c{i}"));
            handles.push(tokio::spawn(async move {
                let (writer, reader) = tokio::io::duplex(4096);
                let result = registry
                    .create_from_stream("stream-x", info, Box::new(reader))
                    .await;
                // Keep the writer alive so winners do not self-tear-down.
                (result, writer)
            }));
        }

        let mut winners = 0;
        let mut writers = Vec::new();
        for handle in handles {
            let (result, writer) = handle.await.unwrap();
            writers.push(writer);
            match result {
                Ok(_) => winners += 1,
                Err(err) => assert!(matches!(err, DriverError::SessionExists { .. })),
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(registry.len(), 1);
    }

    /// Every sink receives every record, field for field, in order.
    #[tokio::test]
    async fn test_fanout_completeness() {
        let registry = SessionRegistry::new();
        let (durable_sink, durable) = memory_adapter("durable");
        let (tele_a, adapter_a) = memory_adapter("gelf-0");
        let (tele_b, adapter_b) = memory_adapter("gelf-1");

        let (mut writer, reader) = tokio::io::duplex(4096);
        registry
            .create_with_adapters(
                "stream-a",
                durable_only_info(std::path::Path::new("/tmp"), "c1"),
                Box::new(reader),
                durable,
                vec![adapter_a, adapter_b],
            )
            .unwrap();

        let records: Vec<_> = (0..5).map(record).collect();
        write_frames(&mut writer, &records).await;

        wait_for("all sinks to receive all records", || {
            durable_sink.write_count() == 5
                && tele_a.write_count() == 5
                && tele_b.write_count() == 5
        })
        .await;

        assert_eq!(durable_sink.records(), records);
        assert_eq!(tele_a.records(), records);
        assert_eq!(tele_b.records(), records);
    }

    /// A sink failing every write never affects its neighbors.
    #[tokio::test]
    async fn test_sink_isolation() {
        let registry = SessionRegistry::new();
        let (durable_sink, durable) = memory_adapter("durable");
        let (first, adapter_first) = memory_adapter("gelf-0");
        let failing = SinkAdapter::new(Arc::new(FailingSink::new("gelf-1")));
        let (third, adapter_third) = memory_adapter("gelf-2");

        let (mut writer, reader) = tokio::io::duplex(4096);
        registry
            .create_with_adapters(
                "stream-a",
                durable_only_info(std::path::Path::new("/tmp"), "c1"),
                Box::new(reader),
                durable,
                vec![adapter_first, failing, adapter_third],
            )
            .unwrap();

        let records: Vec<_> = (0..4).map(record).collect();
        write_frames(&mut writer, &records).await;

        wait_for("surviving sinks to receive all records", || {
            first.write_count() == 4 && third.write_count() == 4 && durable_sink.write_count() == 4
        })
        .await;

        assert_eq!(first.records(), records);
        assert_eq!(third.records(), records);
        assert_eq!(registry.len(), 1);
    }

    /// One malformed frame between two good ones: both good records arrive,
    /// in order, and the session survives.
    #[tokio::test]
    async fn test_resync_on_corruption() {
        use tokio::io::AsyncWriteExt;

        let registry = SessionRegistry::new();
        let (durable_sink, durable) = memory_adapter("durable");

        let (mut writer, reader) = tokio::io::duplex(4096);
        registry
            .create_with_adapters(
                "stream-a",
                durable_only_info(std::path::Path::new("/tmp"), "c1"),
                Box::new(reader),
                durable,
                Vec::new(),
            )
            .unwrap();

        write_frames(&mut writer, &[record(1)]).await;

        // A framed payload that is not a valid entry.
        let mut corrupt = Vec::new();
        corrupt.extend_from_slice(&16u32.to_be_bytes());
        corrupt.extend_from_slice(&[0xff; 16]);
        writer.write_all(&corrupt).await.unwrap();

        write_frames(&mut writer, &[record(2)]).await;

        wait_for("both good records to arrive", || {
            durable_sink.write_count() == 2
        })
        .await;
        let seen: Vec<i64> = durable_sink.records().iter().map(|r| r.time_nano).collect();
        assert_eq!(seen, vec![1, 2]);
        assert_eq!(registry.len(), 1);
    }

    /// After destroy returns, every handle is closed and lookups fail.
    #[tokio::test]
    async fn test_teardown_completeness() {
        let registry = SessionRegistry::new();
        let (durable_sink, durable) = memory_adapter("durable");
        let (tele, adapter) = memory_adapter("gelf-0");

        let (_writer, reader) = tokio::io::duplex(4096);
        let session = registry
            .create_with_adapters(
                "stream-a",
                durable_only_info(std::path::Path::new("/tmp"), "c1"),
                Box::new(reader),
                durable,
                vec![adapter],
            )
            .unwrap();

        registry.destroy("stream-a").await.unwrap();

        assert!(session.is_closed());
        assert!(durable_sink.is_closed());
        assert!(tele.is_closed());
        assert!(matches!(
            registry.lookup("c1").unwrap_err(),
            DriverError::NotFound { .. }
        ));
    }

    /// Closing the input externally self-tears-down the session.
    #[tokio::test]
    async fn test_clean_end_of_stream() {
        let registry = SessionRegistry::new();
        let (durable_sink, durable) = memory_adapter("durable");

        let (mut writer, reader) = tokio::io::duplex(4096);
        let session = registry
            .create_with_adapters(
                "stream-a",
                durable_only_info(std::path::Path::new("/tmp"), "c1"),
                Box::new(reader),
                durable,
                Vec::new(),
            )
            .unwrap();

        write_frames(&mut writer, &[record(1)]).await;
        drop(writer);

        wait_for("session to self-tear-down", || registry.is_empty()).await;
        wait_for("session teardown to finish", || session.is_closed()).await;
        assert!(durable_sink.is_closed());
        assert_eq!(durable_sink.write_count(), 1);
    }
}

#[cfg(test)]
mod replay_tests {
    use std::sync::Arc;

    use contracts::{PartialMeta, ReadConfig, SinkAdapter};
    use driver::{Driver, DriverError, SessionRegistry};
    use sinks::MemorySink;
    use tokio::io::AsyncReadExt;

    use crate::support::*;

    /// Replayed frames are byte-for-byte equal to direct encoding, through
    /// the real durable file sink.
    #[tokio::test]
    async fn test_replay_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::new();
        let driver = Driver::with_registry(registry.clone());

        let (mut writer, reader) = tokio::io::duplex(4096);
        let session = registry
            .create_from_stream(
                "stream-a",
                durable_only_info(dir.path(), "c1"),
                Box::new(reader),
            )
            .await
            .unwrap();

        let records = vec![
            record(1),
            record(2).with_partial(PartialMeta {
                id: "m1".to_string(),
                ordinal: 0,
                last: false,
            }),
        ];
        write_frames(&mut writer, &records).await;

        // Wait until the durable sink has stored both records.
        let reader_capability = session
            .durable()
            .reader()
            .expect("durable sink supports read-back")
            .clone();
        let mut stored = 0;
        for _ in 0..500 {
            let mut subscription = reader_capability.subscribe(ReadConfig::history());
            stored = 0;
            while subscription.records.recv().await.is_some() {
                stored += 1;
            }
            if stored == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(stored, 2, "durable sink never stored both records");

        let mut replay = driver.read_logs("c1", ReadConfig::history()).unwrap();
        let mut replayed = Vec::new();
        replay.read_to_end(&mut replayed).await.unwrap();

        let expected = encode_frames(&records);
        assert_eq!(replayed, expected.to_vec());
    }

    /// Follow-mode replay streams records written after attach, until the
    /// session's sink closes.
    #[tokio::test]
    async fn test_replay_follow_streams_live_records() {
        let registry = SessionRegistry::new();
        let driver = Driver::with_registry(registry.clone());
        let (durable_sink, durable) = memory_adapter("durable");

        let (mut writer, reader) = tokio::io::duplex(4096);
        registry
            .create_with_adapters(
                "stream-a",
                durable_only_info(std::path::Path::new("/tmp"), "c1"),
                Box::new(reader),
                durable,
                Vec::new(),
            )
            .unwrap();

        let mut replay = driver.read_logs("c1", ReadConfig::follow()).unwrap();

        let records = vec![record(1), record(2)];
        write_frames(&mut writer, &records).await;
        wait_for("records to reach the durable sink", || {
            durable_sink.write_count() == 2
        })
        .await;

        let expected = encode_frames(&records);
        let mut replayed = vec![0u8; expected.len()];
        replay.read_exact(&mut replayed).await.unwrap();
        assert_eq!(replayed, expected.to_vec());

        // Ending the session closes the replay stream cleanly.
        registry.destroy("stream-a").await.unwrap();
        let mut rest = Vec::new();
        replay.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    /// Replay against a sink without read-back fails, session untouched.
    #[tokio::test]
    async fn test_replay_unsupported_sink() {
        let registry = SessionRegistry::new();
        let driver = Driver::with_registry(registry.clone());

        let durable = SinkAdapter::new(Arc::new(MemorySink::new("durable")));
        let (_writer, reader) = tokio::io::duplex(4096);
        registry
            .create_with_adapters(
                "stream-a",
                durable_only_info(std::path::Path::new("/tmp"), "c1"),
                Box::new(reader),
                durable,
                Vec::new(),
            )
            .unwrap();

        let err = driver.read_logs("c1", ReadConfig::history()).unwrap_err();
        assert!(matches!(err, DriverError::ReplayUnsupported { .. }));
        assert_eq!(registry.len(), 1);
    }

    /// Replay for an unknown owner fails with NotFound.
    #[tokio::test]
    async fn test_replay_unknown_owner() {
        let driver = Driver::new();
        assert!(matches!(
            driver.read_logs("ghost", ReadConfig::history()).unwrap_err(),
            DriverError::NotFound { .. }
        ));
    }
}
