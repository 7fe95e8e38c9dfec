use crate::config::default_base_url;

use serde::{Deserialize, Serialize};

/// HTTP server settings the recorder needs to know about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Externally reachable base URL; manifests reference segments below it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}
