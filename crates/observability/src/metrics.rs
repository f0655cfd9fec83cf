//! Driver metrics
//!
//! Counter and gauge helpers recorded along the ingest, session, and replay
//! paths. Exported through the Prometheus listener when one is installed.

use metrics::{counter, gauge};

/// One record dispatched to every sink of its session
pub fn record_dispatched(source: &str) {
    counter!("logfan_records_total", "source" => source.to_string()).increment(1);
}

/// One sink rejected one record
pub fn record_sink_write_failure(sink: &str) {
    counter!("logfan_sink_write_failures_total", "sink" => sink.to_string()).increment(1);
}

/// The decoder was rebuilt after transient framing corruption
pub fn record_decoder_resync() {
    counter!("logfan_decoder_resyncs_total").increment(1);
}

/// A session was registered and its pump started
pub fn record_session_started() {
    counter!("logfan_sessions_started_total").increment(1);
    gauge!("logfan_sessions_active").increment(1.0);
}

/// A session finished teardown
pub fn record_session_closed() {
    counter!("logfan_sessions_closed_total").increment(1);
    gauge!("logfan_sessions_active").decrement(1.0);
}

/// A replay bridge was attached
pub fn record_replay_opened() {
    counter!("logfan_replays_opened_total").increment(1);
}

/// One frame re-encoded onto a replay stream
pub fn record_replay_frame() {
    counter!("logfan_replay_frames_total").increment(1);
}
