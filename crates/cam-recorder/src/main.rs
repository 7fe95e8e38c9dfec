//! Cam-Recorder: records live camera streams to segmented HLS files.

mod app;
mod camera_directory;
mod config;
mod error;

pub(crate) use {
    app::App,
    camera_directory::{CameraDirectory, CameraStatus},
    error::{AppError, Result as AppResult},
};

use crate::config::Config;

use tracing::error;
use tracing_subscriber::EnvFilter;

/// Default log filter when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "cam_recorder=debug,cam_recorder_core=debug";

/// Application entry point.
fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    let app = App::new(&config);

    if let Err(e) = rt.block_on(app.run()) {
        error!(error = ?e, "App error");
        std::process::exit(1);
    }
}
