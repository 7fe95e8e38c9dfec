//! Per-session lifecycle: allocate output, spawn encoder, wait, release.

use crate::{
    Camera, CameraId, CoreResult, EncoderSettings, OutputAllocator, OutputLocation,
    RecorderError, SessionId, SessionOutcome, SessionRegistry, SessionStatus, SessionTask,
    recording::{EncoderProcess, ProcessExit},
};

use std::{fs::File, panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Releases a reserved slot when the lifecycle task ends, however it ends.
struct SlotGuard {
    registry: SessionRegistry,
    camera_id: CameraId,
    session_id: SessionId,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if self.registry.release(self.camera_id, self.session_id) {
            debug!(camera_id = %self.camera_id, session_id = %self.session_id, "Slot released");
        }
    }
}

/// Runs the lifecycle task of each recording session.
#[derive(Debug)]
pub(crate) struct ProcessSupervisor {
    registry: SessionRegistry,
    allocator: OutputAllocator,
    encoder: EncoderSettings,
    base_url: String,
}

impl ProcessSupervisor {
    pub(crate) fn new(
        registry: SessionRegistry,
        allocator: OutputAllocator,
        encoder: EncoderSettings,
        base_url: String,
    ) -> Self {
        Self {
            registry,
            allocator,
            encoder,
            base_url,
        }
    }

    pub(crate) fn allocator(&self) -> &OutputAllocator {
        &self.allocator
    }

    /// Spawns the lifecycle task for a slot that has already been reserved.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn launch(self: &Arc<Self>, camera: Camera, session_id: SessionId) -> SessionTask {
        let camera_id = camera.id;
        let (status_tx, status_rx) = watch::channel(SessionStatus::Reserved);

        let guard = SlotGuard {
            registry: self.registry.clone(),
            camera_id,
            session_id,
        };

        let supervisor = Arc::clone(self);
        let join = tokio::spawn(async move {
            let outcome = supervisor.run(&camera, session_id, &status_tx).await;

            // Release before publishing so observers of `Finished` never see
            // a stale slot.
            drop(guard);
            info!(camera_id = %camera.id, session_id = %session_id, "Cleaned up recording");

            status_tx.send_replace(SessionStatus::Finished(outcome.clone()));
            outcome
        });

        SessionTask::new(camera_id, session_id, status_rx, join)
    }

    #[instrument(skip(self, camera, status_tx), fields(camera_id = %camera.id))]
    async fn run(
        &self,
        camera: &Camera,
        session_id: SessionId,
        status_tx: &watch::Sender<SessionStatus>,
    ) -> SessionOutcome {
        let output = match self.allocator.allocate(camera.id).await {
            Ok(output) => output,
            Err(e) => {
                error!(session_id = %session_id, error = ?e, "Failed to allocate output");
                return failed(e);
            }
        };

        let log = match open_log(&output).await {
            Ok(log) => log,
            Err(e) => {
                error!(session_id = %session_id, error = ?e, "Failed to open encoder log");
                return failed(e);
            }
        };

        let args = self.encoder.recording_args(camera, &output, &self.base_url);
        debug!(args = ?args, "Encoder arguments");

        let spawned = EncoderProcess::spawn(&self.encoder, camera.id, &args, log);
        let (mut process, handle) = match spawned {
            Ok(spawned) => spawned,
            Err(e) => {
                error!(session_id = %session_id, error = ?e, "Failed to start encoder");
                return failed(e);
            }
        };

        if let Err(e) = self
            .registry
            .attach_process(camera.id, session_id, output.clone(), handle)
        {
            warn!(
                session_id = %session_id,
                error = ?e,
                "Recording slot was removed before the encoder attached, killing it"
            );
            if let Err(e) = process.kill().await {
                error!(session_id = %session_id, error = ?e, "Failed to reap orphaned encoder");
            }
            return SessionOutcome::Stopped {
                recording_id: Some(output.recording_id),
            };
        }

        status_tx.send_replace(SessionStatus::Running {
            recording_id: output.recording_id.clone(),
            pid: process.pid(),
        });

        info!(
            session_id = %session_id,
            recording_id = %output.recording_id,
            path = ?output.path,
            "Recording started"
        );

        match process.wait().await {
            Ok(ProcessExit::Exited(status)) => {
                if status.success() {
                    info!(session_id = %session_id, "Encoder exited successfully");
                } else {
                    warn!(session_id = %session_id, status = %status, "Encoder exited with error");
                }
                SessionOutcome::Exited {
                    recording_id: output.recording_id,
                    code: status.code(),
                    success: status.success(),
                }
            }
            Ok(ProcessExit::Killed(status)) => {
                info!(session_id = %session_id, status = %status, "Encoder terminated");
                SessionOutcome::Stopped {
                    recording_id: Some(output.recording_id),
                }
            }
            Err(e) => {
                error!(session_id = %session_id, error = ?e, "Failed to wait on encoder");
                failed(e)
            }
        }
    }
}

/// Opens the session log in append mode so reused directories keep history.
pub(crate) async fn open_log(output: &OutputLocation) -> CoreResult<File> {
    let location = Location::caller();
    let file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&output.log_path)
        .await
        .map_err(|e| RecorderError::OutputAllocationFailed {
            path: output.log_path.clone(),
            source: e,
            location: ErrorLocation::from(location),
        })?;

    Ok(file.into_std().await)
}

fn failed(e: RecorderError) -> SessionOutcome {
    SessionOutcome::Failed {
        reason: e.to_string(),
    }
}
