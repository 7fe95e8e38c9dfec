mod camera;
mod catalog;
mod encoder;
mod output;
mod recorder;
mod registry;
mod session;
mod supervisor;

pub(crate) use {
    encoder::{EncoderProcess, ProcessExit},
    supervisor::{ProcessSupervisor, open_log},
};

pub use {
    camera::{Camera, CameraId},
    catalog::RecordingCatalog,
    encoder::{EncoderSettings, ProcessHandle, SEGMENT_DURATION_SECS},
    output::{LOG_FILE_NAME, MANIFEST_FILE_NAME, OutputAllocator, OutputLocation},
    recorder::Recorder,
    registry::{Session, SessionId, SessionRegistry},
    session::{SessionOutcome, SessionStatus, SessionTask},
};
