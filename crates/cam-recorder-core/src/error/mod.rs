use crate::CameraId;

use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

/// Recording supervisor errors with source location tracking.
#[derive(Error, Debug)]
pub enum RecorderError {
    /// A session is already reserved or running for this camera.
    #[error("Camera {camera_id} is already being recorded {location}")]
    AlreadyActive {
        /// Camera that already owns a session.
        camera_id: CameraId,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No session exists for this camera.
    #[error("Camera {camera_id} is not being recorded {location}")]
    NotActive {
        /// Camera without a session.
        camera_id: CameraId,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The reserved slot vanished before a process could be attached.
    #[error("Recording slot for camera {camera_id} was removed {location}")]
    NotFound {
        /// Camera whose slot is gone.
        camera_id: CameraId,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Creating the session's output directory or log file failed.
    #[error("Failed to prepare output at {path:?}: {source} {location}")]
    OutputAllocationFailed {
        /// Path that could not be created or opened.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The encoder process could not be launched.
    #[error("Failed to spawn encoder {program:?}: {source} {location}")]
    SpawnFailed {
        /// Encoder program that failed to start.
        program: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Delivering the termination signal failed.
    #[error("Failed to signal encoder for camera {camera_id}: {reason} {location}")]
    SignalFailed {
        /// Camera whose encoder could not be signalled.
        camera_id: CameraId,
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Waiting on the encoder process failed.
    #[error("Failed to wait on encoder: {source} {location}")]
    WaitFailed {
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recordings root could not be read.
    #[error("Failed to read recordings at {path:?}: {source} {location}")]
    RecordingsUnreadable {
        /// Directory that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No manifest exists for the requested recording.
    #[error("Recording not found: {recording_id} {location}")]
    RecordingNotFound {
        /// Requested recording identifier.
        recording_id: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The requested segment file does not exist.
    #[error("Segment not found: {recording_id}/{segment} {location}")]
    SegmentNotFound {
        /// Recording the segment was requested from.
        recording_id: String,
        /// Requested segment file name.
        segment: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A recording or segment name escapes the recordings root.
    #[error("Invalid name: {name:?} {location}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`RecorderError`].
pub type Result<T> = std::result::Result<T, RecorderError>;
