//! Concurrency-safe map of active recording sessions.
//!
//! This is the only shared mutable state of the recorder. Every operation
//! takes the lock for the duration of a single map mutation or read; no IO
//! or process operation ever runs while it is held.

use crate::{CameraId, CoreResult, OutputLocation, ProcessHandle, RecorderError};

use std::{
    collections::HashMap,
    fmt,
    panic::Location,
    sync::{Arc, Mutex, MutexGuard},
};

use error_location::ErrorLocation;
use tracing::{debug, error};
use uuid::Uuid;

/// Identifies one reservation of a camera slot.
///
/// A camera can be stopped and started again while the first session's task
/// is still winding down; the id keeps that task from touching the newer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of one camera's slot.
#[derive(Debug, Clone)]
pub struct Session {
    /// Camera this session records.
    pub camera_id: CameraId,
    /// Reservation this slot belongs to.
    pub session_id: SessionId,
    /// Output location, known once the encoder has been attached.
    pub output: Option<OutputLocation>,
    /// Termination trigger, absent while the slot is only reserved.
    pub process: Option<ProcessHandle>,
}

impl Session {
    /// Whether an encoder process has been attached to this slot.
    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }
}

/// Camera id to session map guarded by a single mutex.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    slots: Arc<Mutex<HashMap<CameraId, Session>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claims the slot for `camera_id`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyActive` if the camera already has a slot.
    #[track_caller]
    pub fn reserve(&self, camera_id: CameraId) -> CoreResult<SessionId> {
        let mut slots = self.lock();

        if slots.contains_key(&camera_id) {
            return Err(RecorderError::AlreadyActive {
                camera_id,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let session_id = SessionId::new();
        slots.insert(
            camera_id,
            Session {
                camera_id,
                session_id,
                output: None,
                process: None,
            },
        );
        drop(slots);

        debug!(camera_id = %camera_id, session_id = %session_id, "Slot reserved");

        Ok(session_id)
    }

    /// Attaches a running encoder to a reserved slot.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the slot was removed, or now belongs to a newer
    /// reservation. The caller owns the orphaned process and must kill it.
    #[track_caller]
    pub fn attach_process(
        &self,
        camera_id: CameraId,
        session_id: SessionId,
        output: OutputLocation,
        process: ProcessHandle,
    ) -> CoreResult<()> {
        let mut slots = self.lock();

        match slots.get_mut(&camera_id) {
            Some(session) if session.session_id == session_id => {
                session.output = Some(output);
                session.process = Some(process);
                Ok(())
            }
            _ => Err(RecorderError::NotFound {
                camera_id,
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Removes the slot for `camera_id`, whoever owns it. No-op if absent.
    pub fn remove(&self, camera_id: CameraId) -> Option<Session> {
        self.lock().remove(&camera_id)
    }

    /// Removes the slot only if it still belongs to `session_id`.
    ///
    /// Returns `false` when the slot was already removed or re-reserved.
    pub fn release(&self, camera_id: CameraId, session_id: SessionId) -> bool {
        let mut slots = self.lock();

        match slots.get(&camera_id) {
            Some(session) if session.session_id == session_id => {
                slots.remove(&camera_id);
                true
            }
            _ => false,
        }
    }

    /// Returns a snapshot of the slot for `camera_id`.
    pub fn lookup(&self, camera_id: CameraId) -> Option<Session> {
        self.lock().get(&camera_id).cloned()
    }

    /// Whether `camera_id` has a slot, reserved or running.
    pub fn contains(&self, camera_id: CameraId) -> bool {
        self.lock().contains_key(&camera_id)
    }

    /// Sorted ids of every camera with a slot.
    pub fn camera_ids(&self) -> Vec<CameraId> {
        let mut ids: Vec<CameraId> = self.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no camera has a slot.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CameraId, Session>> {
        // Every critical section is a single map operation, so the map is
        // consistent even if a holder panicked.
        self.slots.lock().unwrap_or_else(|e| {
            error!("Session registry lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}
