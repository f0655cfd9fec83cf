//! # Driver
//!
//! The stream-processing core.
//!
//! Responsibilities:
//! - Session Registry: one live session per stream id, owner-id lookup
//! - Session lifecycle: sink construction, ordered teardown
//! - Ingest Pump: frame decode, resync on corruption, sequential fan-out
//! - Replay Bridge: durable-sink history re-framed onto an output stream

mod error;
mod facade;
mod factory;
mod pump;
mod registry;
mod replay;
mod session;
mod stream;

pub use error::DriverError;
pub use facade::{Driver, DRIVER_NAME};
pub use registry::SessionRegistry;
pub use replay::ReplayStream;
pub use session::Session;
pub use stream::ByteStream;
