use crate::{CameraId, CoreResult, RecorderError};

use std::{
    panic::Location,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use error_location::ErrorLocation;
use tracing::{debug, instrument};

/// Name of the HLS manifest written into every recording directory.
pub const MANIFEST_FILE_NAME: &str = "stream.m3u8";

/// Name of the combined encoder stdout/stderr log.
pub const LOG_FILE_NAME: &str = "encoder.log";

/// Where one session's artifacts live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLocation {
    /// `{camera_id}-{unix_seconds}`; names the directory and the segment URLs.
    pub recording_id: String,
    /// `{recordings_root}/{recording_id}`.
    pub path: PathBuf,
    /// Manifest file inside `path`.
    pub playlist_path: PathBuf,
    /// Encoder log file inside `path`.
    pub log_path: PathBuf,
}

/// Derives per-session output directories under a recordings root.
///
/// Recording identifiers only have second resolution, so two allocations for
/// the same camera within one second resolve to the same directory. The
/// directory is reused rather than treated as an error.
#[derive(Debug, Clone)]
pub struct OutputAllocator {
    root: PathBuf,
}

impl OutputAllocator {
    /// Creates an allocator rooted at `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory all recordings are placed under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Computes the location without touching the filesystem.
    pub fn location_for(&self, camera_id: CameraId, unix_secs: u64) -> OutputLocation {
        let recording_id = format!("{}-{}", camera_id, unix_secs);
        let path = self.root.join(&recording_id);

        OutputLocation {
            playlist_path: path.join(MANIFEST_FILE_NAME),
            log_path: path.join(LOG_FILE_NAME),
            recording_id,
            path,
        }
    }

    /// Allocates an output location stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `OutputAllocationFailed` if the directory tree cannot be created.
    pub async fn allocate(&self, camera_id: CameraId) -> CoreResult<OutputLocation> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        self.allocate_at(camera_id, now).await
    }

    /// Allocates an output location for an explicit unix timestamp.
    ///
    /// # Errors
    ///
    /// Returns `OutputAllocationFailed` if the directory tree cannot be created.
    #[instrument(skip(self))]
    pub async fn allocate_at(
        &self,
        camera_id: CameraId,
        unix_secs: u64,
    ) -> CoreResult<OutputLocation> {
        let location = Location::caller();
        let output = self.location_for(camera_id, unix_secs);

        tokio::fs::create_dir_all(&output.path)
            .await
            .map_err(|e| RecorderError::OutputAllocationFailed {
                path: output.path.clone(),
                source: e,
                location: ErrorLocation::from(location),
            })?;

        debug!(
            recording_id = %output.recording_id,
            path = ?output.path,
            "Output directory ready"
        );

        Ok(output)
    }
}
