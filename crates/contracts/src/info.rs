//! SessionInfo - configuration snapshot carried by one session

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Originating configuration of one logging session.
///
/// Captured at session creation and never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Owner identifier (the originating container)
    pub container_id: String,

    /// Human-readable container name, used as the telemetry host field
    pub container_name: String,

    /// Durable sink storage path; a default under the state directory is
    /// derived from the container id when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// Flat sink option map, scoped by key prefix per sink kind
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl SessionInfo {
    /// Create an info snapshot with empty options
    pub fn new(container_id: impl Into<String>, container_name: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            container_name: container_name.into(),
            log_path: None,
            options: HashMap::new(),
        }
    }

    /// Set the durable sink storage path
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Add one raw option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}
