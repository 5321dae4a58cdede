use std::path::PathBuf;

use clap::{Parser, Subcommand};
use oss_output::AudioFormat;

use crate::tone::ToneSpec;

#[derive(Parser, Debug)]
#[command(name = "oss-play", version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// TOML config file with `[output]` and `[playback]` tables
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// OSS device node, e.g. /dev/dsp1 (default: search /dev/dsp, /dev/sound/dsp)
    #[arg(long)]
    pub device: Option<String>,

    /// Discard audio at real-time speed instead of opening a device
    #[arg(long)]
    pub null: bool,

    /// Frames per chunk handed to the output (higher => fewer writes, more latency)
    #[arg(long)]
    pub chunk_frames: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode and play a local file
    Play {
        /// Path to audio file
        path: PathBuf,
    },

    /// Play a sine test tone
    Tone(ToneArgs),

    /// Report which default OSS nodes are usable
    Probe,
}

#[derive(clap::Args, Debug)]
pub struct ToneArgs {
    /// Tone frequency in Hz
    #[arg(long, default_value_t = 440.0)]
    pub freq: f32,

    /// Tone length in seconds
    #[arg(long, default_value_t = 3.0)]
    pub seconds: f32,

    /// Requested sample rate in Hz
    #[arg(long, default_value_t = 44_100)]
    pub rate: u32,

    /// Requested channel count
    #[arg(long, default_value_t = 2)]
    pub channels: u8,

    /// Requested bits per sample (8 or 16; anything else plays as 16)
    #[arg(long, default_value_t = 16)]
    pub bits: u8,
}

impl ToneArgs {
    pub fn spec(&self) -> ToneSpec {
        ToneSpec {
            freq: self.freq,
            seconds: self.seconds,
            format: AudioFormat::new(self.rate, self.channels, self.bits),
        }
    }
}
