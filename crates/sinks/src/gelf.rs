//! GelfSink - GELF telemetry over UDP or TCP
//!
//! One GELF 1.1 message per record. UDP sends one datagram per message; TCP
//! frames messages with a trailing null byte and reconnects with bounded
//! retries on write failure. Write-only: no read-back capability.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use contracts::{LogRecord, RecordSink, SinkError};
use serde_json::{json, Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Transport selected by the address scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GelfTransportKind {
    Udp,
    Tcp,
}

/// Payload compression declared in the options.
///
/// Validated for compatibility; messages are currently sent uncompressed,
/// which GELF receivers detect by magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Compression {
    #[default]
    None,
    Gzip,
    Zlib,
}

/// Configuration for the GELF telemetry sink
#[derive(Debug, Clone)]
pub struct GelfSinkConfig {
    /// Transport kind from the address scheme
    pub kind: GelfTransportKind,

    /// `host:port` target
    pub target: String,

    compression: Compression,

    /// Compression level, -1 (default) through 9
    pub compression_level: i32,

    /// TCP write retries before a record is failed
    pub max_reconnect: u32,

    /// Pause between reconnect attempts
    pub reconnect_delay: Duration,
}

impl GelfSinkConfig {
    /// Build and validate config from the sink's un-scoped option subset
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self, SinkError> {
        let address = options
            .get("gelf-address")
            .ok_or_else(|| SinkError::missing_option("gelf-address"))?;
        let (kind, target) = parse_address(address)?;

        let compression = match options.get("gelf-compression-type").map(String::as_str) {
            None | Some("none") => Compression::None,
            Some("gzip") => Compression::Gzip,
            Some("zlib") => Compression::Zlib,
            Some(other) => {
                return Err(SinkError::invalid_option(
                    "gelf-compression-type",
                    format!("expected none, gzip or zlib, got {other:?}"),
                ))
            }
        };

        let compression_level = match options.get("gelf-compression-level") {
            Some(value) => {
                let level: i32 = value.parse().map_err(|_| {
                    SinkError::invalid_option(
                        "gelf-compression-level",
                        format!("expected an integer, got {value:?}"),
                    )
                })?;
                if !(-1..=9).contains(&level) {
                    return Err(SinkError::invalid_option(
                        "gelf-compression-level",
                        "must be between -1 and 9",
                    ));
                }
                level
            }
            None => -1,
        };

        let max_reconnect = match options.get("gelf-tcp-max-reconnect") {
            Some(value) => value.parse().map_err(|_| {
                SinkError::invalid_option(
                    "gelf-tcp-max-reconnect",
                    format!("expected a non-negative integer, got {value:?}"),
                )
            })?,
            None => 3,
        };

        let reconnect_delay = match options.get("gelf-tcp-reconnect-delay") {
            Some(value) => {
                let seconds: u64 = value.parse().map_err(|_| {
                    SinkError::invalid_option(
                        "gelf-tcp-reconnect-delay",
                        format!("expected seconds, got {value:?}"),
                    )
                })?;
                Duration::from_secs(seconds)
            }
            None => Duration::from_secs(1),
        };

        Ok(Self {
            kind,
            target,
            compression,
            compression_level,
            max_reconnect,
            reconnect_delay,
        })
    }
}

enum Transport {
    Udp(UdpSocket),
    Tcp(TcpStream),
}

impl Transport {
    async fn open(config: &GelfSinkConfig) -> std::io::Result<Self> {
        match config.kind {
            GelfTransportKind::Udp => {
                let socket = UdpSocket::bind("0.0.0.0:0").await?;
                socket.connect(&config.target).await?;
                Ok(Self::Udp(socket))
            }
            GelfTransportKind::Tcp => {
                let stream = TcpStream::connect(&config.target).await?;
                Ok(Self::Tcp(stream))
            }
        }
    }

    async fn send(&mut self, payload: &[u8]) -> std::io::Result<()> {
        match self {
            Self::Udp(socket) => {
                socket.send(payload).await?;
                Ok(())
            }
            Self::Tcp(stream) => {
                stream.write_all(payload).await?;
                stream.write_all(&[0]).await?;
                Ok(())
            }
        }
    }
}

/// Telemetry sink emitting GELF messages
pub struct GelfSink {
    name: String,
    /// GELF `host` field
    host: String,
    /// Owning container id, attached as `_container_id`
    owner: String,
    config: GelfSinkConfig,
    transport: Mutex<Option<Transport>>,
    closed: AtomicBool,
}

impl GelfSink {
    /// Validate options and establish the transport
    pub async fn connect(
        name: impl Into<String>,
        host: impl Into<String>,
        owner: impl Into<String>,
        options: &HashMap<String, String>,
    ) -> Result<Self, SinkError> {
        let name = name.into();
        let config = GelfSinkConfig::from_options(options)?;
        if config.compression != Compression::None {
            warn!(sink = %name, "gelf compression requested but not applied");
        }

        let transport = Transport::open(&config)
            .await
            .map_err(|err| SinkError::connection(&name, err.to_string()))?;
        debug!(sink = %name, target = %config.target, "GelfSink connected");

        Ok(Self {
            name,
            host: host.into(),
            owner: owner.into(),
            config,
            transport: Mutex::new(Some(transport)),
            closed: AtomicBool::new(false),
        })
    }

    fn encode_message(&self, record: &LogRecord) -> Result<Vec<u8>, SinkError> {
        let mut message = Map::new();
        message.insert("version".to_string(), json!("1.1"));
        message.insert("host".to_string(), json!(self.host));
        message.insert(
            "short_message".to_string(),
            json!(String::from_utf8_lossy(&record.line)),
        );
        message.insert(
            "timestamp".to_string(),
            json!(record.time_nano as f64 / 1e9),
        );
        let level = if record.source == "stderr" { 3 } else { 6 };
        message.insert("level".to_string(), json!(level));
        message.insert("_container_id".to_string(), json!(self.owner));
        message.insert("_source".to_string(), json!(record.source));
        if let Some(meta) = &record.partial {
            message.insert("_partial_id".to_string(), json!(meta.id));
            message.insert("_partial_ordinal".to_string(), json!(meta.ordinal));
            message.insert("_partial_last".to_string(), json!(meta.last));
        }
        serde_json::to_vec(&Value::Object(message))
            .map_err(|err| SinkError::write(&self.name, err.to_string()))
    }
}

#[async_trait::async_trait]
impl RecordSink for GelfSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, record: LogRecord) -> Result<(), SinkError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SinkError::closed(&self.name));
        }
        let payload = self.encode_message(&record)?;

        let mut transport = self.transport.lock().await;
        let mut attempt: u32 = 0;
        loop {
            if transport.is_none() {
                match Transport::open(&self.config).await {
                    Ok(fresh) => *transport = Some(fresh),
                    Err(err) => {
                        if attempt >= self.config.max_reconnect {
                            return Err(SinkError::connection(&self.name, err.to_string()));
                        }
                        attempt += 1;
                        tokio::time::sleep(self.config.reconnect_delay).await;
                        continue;
                    }
                }
            }
            let Some(conn) = transport.as_mut() else {
                continue;
            };
            match conn.send(&payload).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    *transport = None;
                    if attempt >= self.config.max_reconnect {
                        return Err(SinkError::write(&self.name, err.to_string()));
                    }
                    attempt += 1;
                    tokio::time::sleep(self.config.reconnect_delay).await;
                }
            }
        }
    }

    #[instrument(name = "gelf_sink_close", skip(self), fields(sink = %self.name))]
    async fn close(&self) -> Result<(), SinkError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.transport.lock().await.take();
        debug!(sink = %self.name, "GelfSink closed");
        Ok(())
    }
}

fn parse_address(address: &str) -> Result<(GelfTransportKind, String), SinkError> {
    let (scheme, rest) = address.split_once("://").ok_or_else(|| {
        SinkError::invalid_option(
            "gelf-address",
            format!("expected udp://host:port or tcp://host:port, got {address:?}"),
        )
    })?;
    let kind = match scheme {
        "udp" => GelfTransportKind::Udp,
        "tcp" => GelfTransportKind::Tcp,
        other => {
            return Err(SinkError::invalid_option(
                "gelf-address",
                format!("unsupported scheme {other:?}"),
            ))
        }
    };
    if rest.is_empty() || !rest.contains(':') {
        return Err(SinkError::invalid_option(
            "gelf-address",
            format!("missing host:port in {address:?}"),
        ));
    }
    Ok((kind, rest.to_string()))
}
