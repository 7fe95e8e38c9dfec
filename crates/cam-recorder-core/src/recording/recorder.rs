use crate::{
    Camera, CameraId, CoreResult, EncoderSettings, OutputAllocator, RecorderError,
    RecordingCatalog, SessionRegistry, SessionTask, recording::ProcessSupervisor,
};

use std::{panic::Location, path::Path, sync::Arc};

use error_location::ErrorLocation;
use tracing::{info, instrument, warn};

/// Public entry point for starting and stopping camera recordings.
///
/// Guarantees at most one encoder per camera. Cheap to clone; clones share
/// the same registry.
#[derive(Debug, Clone)]
pub struct Recorder {
    registry: SessionRegistry,
    supervisor: Arc<ProcessSupervisor>,
}

impl Recorder {
    /// Creates a recorder writing under `recordings_root`.
    ///
    /// `base_url` is the externally reachable address of this server; the
    /// manifests reference segments below it.
    pub fn new<P: AsRef<Path>>(
        recordings_root: P,
        base_url: impl Into<String>,
        encoder: EncoderSettings,
    ) -> Self {
        let registry = SessionRegistry::new();
        let supervisor = ProcessSupervisor::new(
            registry.clone(),
            OutputAllocator::new(recordings_root),
            encoder,
            base_url.into(),
        );

        Self {
            registry,
            supervisor: Arc::new(supervisor),
        }
    }

    /// Starts recording `camera`.
    ///
    /// Success means the recording was accepted, not that the encoder is
    /// running: allocation and spawn happen on a background task whose
    /// failures are logged and reported only through the returned
    /// [`SessionTask`]. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyActive` if the camera already has a session.
    #[track_caller]
    #[instrument(skip(self, camera), fields(camera_id = %camera.id))]
    pub fn start(&self, camera: &Camera) -> CoreResult<SessionTask> {
        let session_id = self.registry.reserve(camera.id)?;

        info!(session_id = %session_id, source_url = %camera.source_url, "Recording requested");

        Ok(self.supervisor.launch(camera.clone(), session_id))
    }

    /// Stops recording `camera_id`.
    ///
    /// The slot is removed immediately; the encoder is signalled but may
    /// still be exiting when this returns.
    ///
    /// # Errors
    ///
    /// Returns `NotActive` if the camera has no session.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn stop(&self, camera_id: CameraId) -> CoreResult<()> {
        let location = Location::caller();
        let session = self
            .registry
            .remove(camera_id)
            .ok_or_else(|| RecorderError::NotActive {
                camera_id,
                location: ErrorLocation::from(location),
            })?;

        if let Some(process) = &session.process {
            if let Err(e) = process.signal() {
                warn!(camera_id = %camera_id, error = ?e, "Failed to signal encoder");
            }
        }

        info!(
            camera_id = %camera_id,
            session_id = %session.session_id,
            "Recording stopped"
        );

        Ok(())
    }

    /// Whether `camera_id` has a session, reserved or running.
    pub fn is_recording(&self, camera_id: CameraId) -> bool {
        self.registry.contains(camera_id)
    }

    /// Sorted ids of every camera with a session.
    pub fn active_cameras(&self) -> Vec<CameraId> {
        self.registry.camera_ids()
    }

    /// Stops every active session.
    #[instrument(skip(self))]
    pub fn stop_all(&self) {
        for camera_id in self.registry.camera_ids() {
            // A session may end on its own between listing and stopping.
            if let Err(e) = self.stop(camera_id) {
                warn!(camera_id = %camera_id, error = ?e, "Session already gone");
            }
        }
    }

    /// Read access to the recordings written under this recorder's root.
    pub fn catalog(&self) -> RecordingCatalog {
        RecordingCatalog::new(self.supervisor.allocator().root())
    }

    /// The underlying session registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }
}
