//! In-memory camera metadata store built from the `[[cameras]]` table.

use crate::{AppError, AppResult, config::CameraConfig};

use std::{collections::BTreeMap, panic::Location};

use cam_recorder_core::{Camera, CameraId};
use error_location::ErrorLocation;

/// A camera together with its recording flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraStatus {
    /// The camera record.
    pub camera: Camera,
    /// Whether a session is reserved or running for it.
    pub is_recording: bool,
}

/// Cameras keyed by id, iterated in id order.
#[derive(Debug, Clone, Default)]
pub struct CameraDirectory {
    cameras: BTreeMap<CameraId, Camera>,
}

impl CameraDirectory {
    /// Builds the directory from configuration entries.
    pub fn from_config(entries: &[CameraConfig]) -> Self {
        let cameras = entries
            .iter()
            .map(Camera::from)
            .map(|camera| (camera.id, camera))
            .collect();

        Self { cameras }
    }

    /// Looks up a camera by id.
    ///
    /// # Errors
    ///
    /// Returns `CameraNotFound` if no camera has this id.
    #[track_caller]
    pub fn get(&self, camera_id: u64) -> AppResult<&Camera> {
        let location = Location::caller();

        self.cameras
            .get(&CameraId(camera_id))
            .ok_or_else(|| AppError::CameraNotFound {
                camera_id,
                location: ErrorLocation::from(location),
            })
    }

    /// All cameras in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Camera> {
        self.cameras.values()
    }

    /// Number of cameras.
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Whether no camera is configured.
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }
}
