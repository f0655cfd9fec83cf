//! SessionBlueprint - one session described in a config file

use std::collections::HashMap;
use std::path::PathBuf;

use contracts::SessionInfo;
use serde::{Deserialize, Serialize};

/// One logging session as described by a blueprint file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionBlueprint {
    /// Input stream path (FIFO or recorded file)
    pub stream: PathBuf,

    /// Owning container identity
    pub container: ContainerSection,

    /// Durable sink storage path (defaults under the driver's state dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// Raw driver options, scoped keys as the runtime would pass them
    #[serde(default)]
    pub options: HashMap<String, String>,
}

/// Container identity section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSection {
    /// Owner identifier
    pub id: String,

    /// Human-readable name; falls back to the id when omitted
    #[serde(default)]
    pub name: String,
}

impl SessionBlueprint {
    /// The `SessionInfo` handed to the driver
    pub fn session_info(&self) -> SessionInfo {
        let name = if self.container.name.is_empty() {
            self.container.id.clone()
        } else {
            self.container.name.clone()
        };
        let mut info = SessionInfo::new(self.container.id.clone(), name);
        info.log_path = self.log_path.clone();
        info.options = self.options.clone();
        info
    }
}
