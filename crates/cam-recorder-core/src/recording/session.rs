use crate::{CameraId, SessionId};

use tokio::{sync::watch, task::JoinHandle};
use tracing::error;

/// How a recording session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The encoder exited on its own.
    Exited {
        /// Recording the encoder was writing.
        recording_id: String,
        /// Exit code, `None` if terminated by a signal.
        code: Option<i32>,
        /// Whether the exit status reported success.
        success: bool,
    },
    /// The session was stopped before the encoder exited on its own.
    Stopped {
        /// Recording in progress, if the encoder had been started.
        recording_id: Option<String>,
    },
    /// Output allocation, spawning or waiting failed.
    Failed {
        /// Description of the failure.
        reason: String,
    },
}

/// Live state of a recording session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Slot claimed, encoder not yet attached.
    Reserved,
    /// Encoder attached and writing.
    Running {
        /// Recording being written.
        recording_id: String,
        /// Encoder process id.
        pid: Option<u32>,
    },
    /// Session is over and its slot released.
    Finished(SessionOutcome),
}

impl SessionStatus {
    /// Whether the session has ended.
    pub fn is_finished(&self) -> bool {
        matches!(self, SessionStatus::Finished(_))
    }
}

/// Handle to a session's lifecycle task.
///
/// Dropping it detaches the task; the session keeps running until stopped
/// or until the encoder exits.
#[derive(Debug)]
pub struct SessionTask {
    camera_id: CameraId,
    session_id: SessionId,
    status_rx: watch::Receiver<SessionStatus>,
    join: JoinHandle<SessionOutcome>,
}

impl SessionTask {
    pub(crate) fn new(
        camera_id: CameraId,
        session_id: SessionId,
        status_rx: watch::Receiver<SessionStatus>,
        join: JoinHandle<SessionOutcome>,
    ) -> Self {
        Self {
            camera_id,
            session_id,
            status_rx,
            join,
        }
    }

    /// Camera this session records.
    pub fn camera_id(&self) -> CameraId {
        self.camera_id
    }

    /// Reservation this task owns.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Latest published status.
    pub fn status(&self) -> SessionStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_rx.clone()
    }

    /// Whether the lifecycle task has returned.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the lifecycle task and returns how the session ended.
    pub async fn wait(self) -> SessionOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(camera_id = %self.camera_id, error = ?e, "Session task did not complete");
                SessionOutcome::Failed {
                    reason: format!("Session task did not complete: {}", e),
                }
            }
        }
    }
}
