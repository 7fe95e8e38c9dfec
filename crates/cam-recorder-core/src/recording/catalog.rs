//! Read-only view of finished and in-progress recordings on disk.
//!
//! Layout: `{root}/{recording_id}/stream.m3u8` plus segment files next to it.

use crate::{CoreResult, MANIFEST_FILE_NAME, RecorderError};

use std::{
    panic::Location,
    path::{Component, Path, PathBuf},
};

use error_location::ErrorLocation;
use tracing::{debug, instrument};

/// Resolves recordings and segments under a recordings root.
#[derive(Debug, Clone)]
pub struct RecordingCatalog {
    root: PathBuf,
}

impl RecordingCatalog {
    /// Creates a catalog over `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Sorted ids of every recording directory that contains a manifest.
    ///
    /// A missing root yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `RecordingsUnreadable` if the root exists but cannot be read.
    #[instrument(skip(self))]
    pub async fn list(&self) -> CoreResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.read_failed(e)),
        };

        let mut recordings = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| self.read_failed(e))? {
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }

            if tokio::fs::try_exists(entry.path().join(MANIFEST_FILE_NAME))
                .await
                .unwrap_or(false)
            {
                recordings.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        recordings.sort();
        debug!(count = recordings.len(), "Recordings listed");

        Ok(recordings)
    }

    /// Path of a recording's manifest.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` for ids that escape the root and
    /// `RecordingNotFound` when no manifest exists.
    #[track_caller]
    pub fn manifest_path(&self, recording_id: &str) -> CoreResult<PathBuf> {
        let path = self
            .root
            .join(checked_name(recording_id)?)
            .join(MANIFEST_FILE_NAME);

        if !path.is_file() {
            return Err(RecorderError::RecordingNotFound {
                recording_id: recording_id.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(path)
    }

    /// Path of one segment file of a recording.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` for names that escape the root and
    /// `SegmentNotFound` when the file does not exist.
    #[track_caller]
    pub fn segment_path(&self, recording_id: &str, segment: &str) -> CoreResult<PathBuf> {
        let path = self
            .root
            .join(checked_name(recording_id)?)
            .join(checked_name(segment)?);

        if !path.is_file() {
            return Err(RecorderError::SegmentNotFound {
                recording_id: recording_id.to_string(),
                segment: segment.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(path)
    }

    fn read_failed(&self, source: std::io::Error) -> RecorderError {
        RecorderError::RecordingsUnreadable {
            path: self.root.clone(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Accepts a single plain path component only.
#[track_caller]
fn checked_name(name: &str) -> CoreResult<&str> {
    let mut components = Path::new(name).components();

    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(name),
        _ => Err(RecorderError::InvalidName {
            name: name.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}
