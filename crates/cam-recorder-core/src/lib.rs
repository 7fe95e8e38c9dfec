//! Cam-recorder Core Library
//!
//! Supervises one external encoder process per camera, turning live streams
//! into segmented HLS recordings on disk.
//!
//! # Example
//!
//! ```no_run
//! use cam_recorder_core::{Camera, CameraId, CoreResult, EncoderSettings, Recorder};
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let recorder = Recorder::new(
//!         "tmp/recordings",
//!         "http://localhost:3030",
//!         EncoderSettings::default(),
//!     );
//!
//!     let camera = Camera::new(CameraId(7), "Front door", "rtsp://10.0.0.7/stream");
//!     let task = recorder.start(&camera)?;
//!     assert!(recorder.is_recording(camera.id));
//!
//!     recorder.stop(camera.id)?;
//!     let outcome = task.wait().await;
//!     println!("Session finished: {:?}", outcome);
//!     Ok(())
//! }
//! ```

mod error;
mod recording;

pub use {
    error::RecorderError,
    error::Result as CoreResult,
    recording::{
        Camera, CameraId, EncoderSettings, LOG_FILE_NAME, MANIFEST_FILE_NAME, OutputAllocator,
        OutputLocation, ProcessHandle, Recorder, RecordingCatalog, SEGMENT_DURATION_SECS, Session,
        SessionId, SessionOutcome, SessionRegistry, SessionStatus, SessionTask,
    },
};
