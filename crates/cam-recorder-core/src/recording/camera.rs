use std::fmt;

/// Identifier of a camera in the metadata store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(pub u64);

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CameraId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Read-only view of a camera record.
///
/// Owned by the camera metadata store; the recorder only reads it to build
/// the encoder invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Camera {
    /// Unique camera identifier.
    pub id: CameraId,
    /// Human-readable camera name.
    pub name: String,
    /// Live stream address the encoder reads from (usually RTSP).
    pub source_url: String,
}

impl Camera {
    /// Creates a camera record.
    pub fn new(id: CameraId, name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            source_url: source_url.into(),
        }
    }
}
