use crate::config::default_encoder_program;

use std::path::PathBuf;

use cam_recorder_core::EncoderSettings;
use serde::{Deserialize, Serialize};

/// Encoder executable settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Encoder program, looked up on `PATH` when relative.
    #[serde(default = "default_encoder_program")]
    pub program: PathBuf,

    /// Extra arguments placed before the recording arguments.
    #[serde(default)]
    pub leading_args: Vec<String>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: default_encoder_program(),
            leading_args: Vec::new(),
        }
    }
}

impl From<&EncoderConfig> for EncoderSettings {
    fn from(config: &EncoderConfig) -> Self {
        EncoderSettings {
            program: config.program.clone(),
            leading_args: config.leading_args.clone(),
        }
    }
}
