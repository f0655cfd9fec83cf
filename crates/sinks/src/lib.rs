//! # Sinks
//!
//! Sink implementations and per-kind option handling.
//!
//! Contains the durable JSON-file sink (with read-back), the GELF telemetry
//! sink, and an in-memory sink for tests. Each sink kind validates its own
//! option subset in its constructor; the `options` module owns the fixed
//! allow-lists and the key-prefix scoping that selects each subset.

mod file;
mod follow;
mod gelf;
mod memory;
pub mod options;

pub use file::{FileSinkConfig, JsonFileSink};
pub use gelf::{GelfSink, GelfSinkConfig, GelfTransportKind};
pub use memory::MemorySink;
