mod camera_config;
#[allow(clippy::module_inception)]
mod config;
mod encoder_config;
mod recorder_config;
mod server_config;

pub(crate) use {
    camera_config::CameraConfig, config::Config, encoder_config::EncoderConfig,
    recorder_config::RecorderConfig, server_config::ServerConfig,
};

pub(crate) const CONFIG_PATH_ENV: &str = "CAM_RECORDER_CONFIG";
pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:3030";
pub(crate) const DEFAULT_RECORDINGS_ROOT: &str = "tmp/recordings";
pub(crate) const DEFAULT_ENCODER_PROGRAM: &str = "ffmpeg";
pub(crate) const DEFAULT_AUTOSTART: bool = true;

pub(crate) fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

pub(crate) fn default_recordings_root() -> std::path::PathBuf {
    std::path::PathBuf::from(DEFAULT_RECORDINGS_ROOT)
}

pub(crate) fn default_encoder_program() -> std::path::PathBuf {
    std::path::PathBuf::from(DEFAULT_ENCODER_PROGRAM)
}

pub(crate) fn default_autostart() -> bool {
    DEFAULT_AUTOSTART
}
