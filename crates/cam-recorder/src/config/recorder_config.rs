use crate::config::{default_autostart, default_recordings_root};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Recording storage and startup behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Directory every recording is written under.
    #[serde(default = "default_recordings_root")]
    pub recordings_root: PathBuf,

    /// Start every configured camera at boot.
    #[serde(default = "default_autostart")]
    pub autostart: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            recordings_root: default_recordings_root(),
            autostart: default_autostart(),
        }
    }
}
