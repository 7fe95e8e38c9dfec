use crate::{AppError, AppResult, CameraDirectory, CameraStatus, config::Config};

use std::time::Duration;

use cam_recorder_core::{EncoderSettings, Recorder, RecorderError, RecordingCatalog, SessionTask};
use tracing::{error, info, instrument, warn};

/// How long shutdown waits for encoders to be reaped.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Main application state.
///
/// Owns the recorder and the camera directory; camera lookups always happen
/// before a session is started or stopped.
pub struct App {
    pub(crate) recorder: Recorder,
    pub(crate) cameras: CameraDirectory,
    pub(crate) autostart: bool,
}

impl App {
    /// Build the application from loaded configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            recorder: Recorder::new(
                &config.recorder.recordings_root,
                config.server.base_url.clone(),
                EncoderSettings::from(&config.encoder),
            ),
            cameras: CameraDirectory::from_config(&config.cameras),
            autostart: config.recorder.autostart,
        }
    }

    /// Run until Ctrl-C, then stop every session.
    #[instrument(skip(self))]
    pub(crate) async fn run(self) -> AppResult<()> {
        info!(cameras = self.cameras.len(), "Cam-Recorder starting");

        if self.cameras.is_empty() {
            warn!("No cameras configured, nothing will be recorded");
        }

        match self.catalog().list().await {
            Ok(recordings) => info!(recordings = recordings.len(), "Existing recordings found"),
            Err(e) => warn!(error = ?e, "Failed to list existing recordings"),
        }

        let tasks = if self.autostart {
            self.start_all()
        } else {
            Vec::new()
        };

        for status in self.camera_statuses() {
            info!(
                camera_id = %status.camera.id,
                name = %status.camera.name,
                is_recording = status.is_recording,
                "Camera status"
            );
        }

        tokio::signal::ctrl_c().await?;
        info!("Shutdown requested");

        self.shutdown(tasks).await;
        info!("Cam-Recorder shut down successfully");

        Ok(())
    }

    /// Start recording a configured camera.
    #[instrument(skip(self))]
    pub(crate) fn start_camera(&self, camera_id: u64) -> AppResult<SessionTask> {
        let camera = self.cameras.get(camera_id)?;
        Ok(self.recorder.start(camera)?)
    }

    /// Stop recording a configured camera.
    #[instrument(skip(self))]
    pub(crate) fn stop_camera(&self, camera_id: u64) -> AppResult<()> {
        let camera = self.cameras.get(camera_id)?;
        Ok(self.recorder.stop(camera.id)?)
    }

    /// Every configured camera with its recording flag.
    pub(crate) fn camera_statuses(&self) -> Vec<CameraStatus> {
        self.cameras
            .iter()
            .map(|camera| CameraStatus {
                camera: camera.clone(),
                is_recording: self.recorder.is_recording(camera.id),
            })
            .collect()
    }

    /// Recordings available on disk.
    pub(crate) fn catalog(&self) -> RecordingCatalog {
        self.recorder.catalog()
    }

    /// Start every configured camera, skipping ones already recording.
    pub(crate) fn start_all(&self) -> Vec<SessionTask> {
        let mut tasks = Vec::with_capacity(self.cameras.len());

        for camera in self.cameras.iter() {
            match self.start_camera(camera.id.0) {
                Ok(task) => tasks.push(task),
                Err(AppError::Recorder {
                    source: RecorderError::AlreadyActive { .. },
                    ..
                }) => {
                    info!(camera_id = %camera.id, "Camera already recording");
                }
                Err(e) => error!(camera_id = %camera.id, error = ?e, "Failed to start recording"),
            }
        }

        tasks
    }

    /// Stop every session and wait a bounded time for the encoders to exit.
    pub(crate) async fn shutdown(&self, tasks: Vec<SessionTask>) {
        self.recorder.stop_all();

        let waits = async {
            for task in tasks {
                let camera_id = task.camera_id();
                let outcome = task.wait().await;
                info!(camera_id = %camera_id, outcome = ?outcome, "Session finished");
            }
        };

        if tokio::time::timeout(SHUTDOWN_GRACE, waits).await.is_err() {
            warn!(
                "Encoders did not exit within timeout, \
                 will be killed when the runtime drops"
            );
        }
    }
}
