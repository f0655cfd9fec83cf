//! Sink construction from session options
//!
//! The durable sink is built first, then telemetry sinks in configuration
//! order. Any failure releases everything already built, so session creation
//! is atomic: either all sinks exist or none do.

use std::path::PathBuf;
use std::sync::Arc;

use contracts::{SessionInfo, SinkAdapter};
use sinks::{options, GelfSink, JsonFileSink};
use tracing::warn;

use crate::error::DriverError;

/// Adapter name of the durable sink
pub(crate) const DURABLE_SINK_NAME: &str = "file";

/// Storage root used when the runtime supplies no log path
pub(crate) const DEFAULT_LOG_DIR: &str = "/var/log/logfan";

pub(crate) async fn build_sinks(
    info: &SessionInfo,
) -> Result<(SinkAdapter, Vec<SinkAdapter>), DriverError> {
    let durable = {
        let scoped = options::durable_options(&info.options);
        let sink = JsonFileSink::create(DURABLE_SINK_NAME, durable_path(info), &scoped)
            .map_err(|err| DriverError::sink_construction(DURABLE_SINK_NAME, err))?;
        let sink = Arc::new(sink);
        SinkAdapter::with_reader(sink.clone(), sink)
    };

    let count = match options::telemetry_count(&info.options) {
        Ok(count) => count,
        Err(err) => {
            release(std::slice::from_ref(&durable)).await;
            return Err(DriverError::sink_construction("gelf", err));
        }
    };

    let mut telemetry = Vec::with_capacity(count);
    for ordinal in 0..count {
        let name = format!("gelf-{ordinal}");
        let scoped = options::telemetry_options(&info.options, ordinal);
        match GelfSink::connect(&name, &info.container_name, &info.container_id, &scoped).await {
            Ok(sink) => telemetry.push(SinkAdapter::new(Arc::new(sink))),
            Err(err) => {
                release(&telemetry).await;
                release(std::slice::from_ref(&durable)).await;
                return Err(DriverError::sink_construction(name, err));
            }
        }
    }

    Ok((durable, telemetry))
}

/// Release sinks after a failed creation, telemetry first
pub(crate) async fn release_sinks(durable: &SinkAdapter, telemetry: &[SinkAdapter]) {
    release(telemetry).await;
    release(std::slice::from_ref(durable)).await;
}

async fn release(adapters: &[SinkAdapter]) {
    for adapter in adapters {
        if let Err(err) = adapter.close().await {
            warn!(sink = adapter.name(), error = %err, "error releasing sink");
        }
    }
}

fn durable_path(info: &SessionInfo) -> PathBuf {
    info.log_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR).join(&info.container_id))
}
