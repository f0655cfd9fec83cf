//! Driver facade - the control surface consumed by the host runtime

use std::path::Path;

use contracts::{ReadConfig, SessionInfo};

use crate::error::DriverError;
use crate::registry::SessionRegistry;
use crate::replay::{self, ReplayStream};

/// Fixed driver identifier reported to the host runtime
pub const DRIVER_NAME: &str = "logfan";

/// The log driver: session lifecycle plus replay.
///
/// A thin facade over the session registry; hosts that need finer control
/// can reach the registry directly.
pub struct Driver {
    registry: SessionRegistry,
}

impl Driver {
    /// Create a driver with an empty registry
    pub fn new() -> Self {
        Self::with_registry(SessionRegistry::new())
    }

    /// Create a driver over an existing registry
    pub fn with_registry(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    /// The fixed driver identifier
    pub fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    /// The underlying session registry
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Start a logging session reading from `stream_path`
    pub async fn start_logging(
        &self,
        stream_path: impl AsRef<Path>,
        info: SessionInfo,
    ) -> Result<(), DriverError> {
        self.registry
            .create(stream_path.as_ref(), info)
            .await
            .map(drop)
    }

    /// Stop and tear down the session reading from `stream_path`
    pub async fn stop_logging(&self, stream_path: impl AsRef<Path>) -> Result<(), DriverError> {
        let stream_id = stream_path.as_ref().to_string_lossy().into_owned();
        self.registry.destroy(&stream_id).await
    }

    /// Open a replay stream over the owner's durable sink history
    pub fn read_logs(
        &self,
        owner_id: &str,
        config: ReadConfig,
    ) -> Result<ReplayStream, DriverError> {
        let session = self.registry.lookup(owner_id)?;
        replay::open(&session, config)
    }

    /// Drain every live session, for process exit
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}
