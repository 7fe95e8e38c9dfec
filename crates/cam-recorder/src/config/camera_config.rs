use cam_recorder_core::{Camera, CameraId};
use serde::{Deserialize, Serialize};

/// One camera entry of the `[[cameras]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Unique camera id.
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Live stream address, e.g. `rtsp://10.0.0.7/stream`.
    pub source_url: String,
}

impl From<&CameraConfig> for Camera {
    fn from(config: &CameraConfig) -> Self {
        Camera::new(CameraId(config.id), &config.name, &config.source_url)
    }
}
