//! Configuration management for cam-recorder.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, validation of the camera table, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{CONFIG_PATH_ENV, CameraConfig, EncoderConfig, RecorderConfig, ServerConfig},
};

use std::{
    collections::HashSet,
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server address settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Recording storage settings.
    #[serde(default)]
    pub recorder: RecorderConfig,
    /// Encoder executable settings.
    #[serde(default)]
    pub encoder: EncoderConfig,
    /// Cameras known to this recorder.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cameras: Vec<CameraConfig>,
}

impl Config {
    /// Load configuration from disk, creating a default if not found.
    ///
    /// The path comes from `CAM_RECORDER_CONFIG` when set, otherwise from the
    /// platform config directory.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => Self::config_path()?,
        };

        Self::load_from(&config_path)
    }

    /// Load configuration from `config_path`, creating a default if missing.
    #[track_caller]
    #[instrument]
    pub fn load_from(config_path: &Path) -> AppResult<Self> {
        let location = Location::caller();

        if config_path.exists() {
            let contents = fs::read_to_string(config_path).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to read config: {}", e),
                location: ErrorLocation::from(location),
            })?;

            let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to parse config: {}", e),
                location: ErrorLocation::from(location),
            })?;

            config.validate()?;

            info!(
                config_path = ?config_path,
                cameras = config.cameras.len(),
                "Configuration loaded"
            );

            Ok(config)
        } else {
            info!(config_path = ?config_path, "No config found, creating default");

            let config = Config::default();
            config.save_to(config_path)?;

            warn!(
                config_path = ?config_path,
                "Default config created. Add [[cameras]] entries to start recording."
            );

            Ok(config)
        }
    }

    /// Check the camera table and server settings.
    ///
    /// Camera ids must be unique and every camera needs a source URL.
    #[track_caller]
    pub fn validate(&self) -> AppResult<()> {
        if self.server.base_url.trim().is_empty() {
            return Err(AppError::ConfigError {
                reason: "server.base_url must not be empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut seen = HashSet::new();
        for camera in &self.cameras {
            if !seen.insert(camera.id) {
                return Err(AppError::ConfigError {
                    reason: format!("Duplicate camera id: {}", camera.id),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            if camera.source_url.trim().is_empty() {
                return Err(AppError::ConfigError {
                    reason: format!("Camera {} has no source_url", camera.id),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        Ok(())
    }

    /// Save configuration to `config_path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let location = Location::caller();

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                debug!(config_dir = ?parent, "Created config directory");
            }
        }

        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(location),
        })?;

        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(location),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(location),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(location),
        })?;

        fs::rename(&temp_path, config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(location),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let location = Location::caller();
        let proj_dirs =
            ProjectDirs::from("com", "cam-recorder", "Cam-Recorder").ok_or_else(|| {
                AppError::ConfigError {
                    reason: "Failed to get config directory".to_string(),
                    location: ErrorLocation::from(location),
                }
            })?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}
