//! Configuration loading.
//!
//! A TOML file supplies the output and playback tables; command-line flags override it.

use std::path::Path;

use anyhow::{Context, Result};
use oss_output::config::OssConfig;
use serde::Deserialize;

use crate::cli::Args;

/// Top-level player configuration loaded from TOML.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Output device settings.
    pub output: OssConfig,
    /// Chunking and queueing between producer and output.
    pub playback: PlaybackConfig,
}

/// Playback tuning parameters shared by the producer and the output loop.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Frames per chunk handed to the output.
    pub chunk_frames: usize,
    /// Chunks the producer may run ahead of the output.
    pub queue_chunks: usize,
    /// Discard audio at real-time speed instead of opening a device.
    pub null_output: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            chunk_frames: 1024,
            queue_chunks: 16,
            null_output: false,
        }
    }
}

impl PlayerConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<PlayerConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        Ok(cfg)
    }

    /// Apply command-line overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(device) = &args.device {
            self.output.device = Some(device.clone());
        }
        if args.null {
            self.playback.null_output = true;
        }
        if let Some(frames) = args.chunk_frames {
            self.playback.chunk_frames = frames.max(1);
        }
    }
}
