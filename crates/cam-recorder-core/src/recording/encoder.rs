//! Encoder child process and its termination trigger.
//!
//! [`EncoderProcess`] owns the child and is held by the session task for the
//! whole lifetime of the process. [`ProcessHandle`] is the cloneable side that
//! lives in the registry so `stop` can ask the owning task to kill the child.

use crate::{Camera, CameraId, CoreResult, OutputLocation, RecorderError};

use std::{
    fs::File,
    panic::Location,
    path::PathBuf,
    process::{ExitStatus, Stdio},
    sync::Arc,
};

use error_location::ErrorLocation;
use tokio::{
    process::{Child, Command},
    sync::watch,
};
use tracing::{debug, info, instrument, warn};

/// Target HLS segment duration in seconds.
pub const SEGMENT_DURATION_SECS: u32 = 5;

/// How the encoder is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    /// Encoder executable, resolved through `PATH` when relative.
    pub program: PathBuf,
    /// Arguments placed before the generated recording arguments.
    pub leading_args: Vec<String>,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            leading_args: Vec::new(),
        }
    }
}

impl EncoderSettings {
    /// Builds the recording arguments for one session.
    ///
    /// Video is copied as-is, audio is transcoded to AAC and the output is an
    /// HLS playlist whose segment URLs point back at this server.
    pub fn recording_args(
        &self,
        camera: &Camera,
        output: &OutputLocation,
        base_url: &str,
    ) -> Vec<String> {
        let segments_url = segments_url(base_url, &output.recording_id);

        let mut args = self.leading_args.clone();
        args.extend([
            "-i".to_string(),
            camera.source_url.clone(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-f".to_string(),
            "hls".to_string(),
            "-hls_time".to_string(),
            SEGMENT_DURATION_SECS.to_string(),
            "-hls_base_url".to_string(),
            segments_url,
            output.playlist_path.to_string_lossy().into_owned(),
        ]);
        args
    }
}

/// Base address the manifest uses to reference a recording's segments.
pub(crate) fn segments_url(base_url: &str, recording_id: &str) -> String {
    format!(
        "{}/api/v1/recordings/{}/segments/",
        base_url.trim_end_matches('/'),
        recording_id
    )
}

/// How an encoder process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// The process exited on its own.
    Exited(ExitStatus),
    /// The process was killed after a termination signal.
    Killed(ExitStatus),
}

/// Cloneable trigger that asks the owning task to kill its encoder.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    camera_id: CameraId,
    pid: Option<u32>,
    kill_tx: Arc<watch::Sender<bool>>,
}

impl ProcessHandle {
    /// Handle with no process behind it; its receiver is already gone.
    #[cfg(test)]
    pub(crate) fn detached(camera_id: CameraId) -> Self {
        let (kill_tx, _) = watch::channel(false);
        Self {
            camera_id,
            pid: None,
            kill_tx: Arc::new(kill_tx),
        }
    }

    /// OS process id, if the child was still alive when spawned.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Requests termination of the encoder.
    ///
    /// Returns once the request is delivered; the process may still be
    /// running for a short while afterwards.
    ///
    /// # Errors
    ///
    /// Returns `SignalFailed` if the owning task is no longer listening.
    #[track_caller]
    pub fn signal(&self) -> CoreResult<()> {
        let location = Location::caller();

        self.kill_tx
            .send(true)
            .map_err(|e| RecorderError::SignalFailed {
                camera_id: self.camera_id,
                reason: format!("Session task has gone away: {}", e),
                location: ErrorLocation::from(location),
            })
    }
}

/// Owned encoder child process.
#[derive(Debug)]
pub struct EncoderProcess {
    child: Child,
    pid: Option<u32>,
    kill_rx: watch::Receiver<bool>,
}

impl EncoderProcess {
    /// Spawns the encoder with stdout and stderr appended to `log`.
    ///
    /// # Errors
    ///
    /// Returns `SpawnFailed` if the log handle cannot be duplicated or the
    /// program cannot be started.
    #[track_caller]
    #[instrument(skip(settings, args, log))]
    pub fn spawn(
        settings: &EncoderSettings,
        camera_id: CameraId,
        args: &[String],
        log: File,
    ) -> CoreResult<(Self, ProcessHandle)> {
        let location = Location::caller();
        let spawn_failed = |source| RecorderError::SpawnFailed {
            program: settings.program.clone(),
            source,
            location: ErrorLocation::from(location),
        };

        let stderr = log.try_clone().map_err(spawn_failed)?;

        debug!(program = ?settings.program, args = ?args, "Starting encoder");

        let child = Command::new(&settings.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_failed)?;

        let pid = child.id();
        let (kill_tx, kill_rx) = watch::channel(false);

        info!(camera_id = %camera_id, pid = ?pid, "Encoder started");

        let handle = ProcessHandle {
            camera_id,
            pid,
            kill_tx: Arc::new(kill_tx),
        };

        Ok((Self { child, pid, kill_rx }, handle))
    }

    /// OS process id, if known.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Waits until the process exits or a termination signal arrives.
    ///
    /// A signal kills the child and reaps it before returning.
    ///
    /// # Errors
    ///
    /// Returns `WaitFailed` if the exit status cannot be collected.
    pub async fn wait(&mut self) -> CoreResult<ProcessExit> {
        let signalled = tokio::select! {
            status = self.child.wait() => {
                return status.map(ProcessExit::Exited).map_err(wait_failed);
            }
            requested = self.kill_rx.wait_for(|kill| *kill) => requested.is_ok(),
        };

        if signalled {
            self.kill().await.map(ProcessExit::Killed)
        } else {
            // Every handle was dropped without a signal; nobody can stop us now.
            self.child.wait().await.map(ProcessExit::Exited).map_err(wait_failed)
        }
    }

    /// Kills the process and reaps it.
    ///
    /// # Errors
    ///
    /// Returns `WaitFailed` if the exit status cannot be collected.
    pub async fn kill(&mut self) -> CoreResult<ExitStatus> {
        if let Err(e) = self.child.start_kill() {
            warn!(pid = ?self.pid, error = %e, "Failed to kill encoder");
        }

        self.child.wait().await.map_err(wait_failed)
    }
}

fn wait_failed(source: std::io::Error) -> RecorderError {
    RecorderError::WaitFailed {
        source,
        location: ErrorLocation::from(Location::caller()),
    }
}
