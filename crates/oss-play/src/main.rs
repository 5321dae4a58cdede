//! oss-play — plays a file or a test tone through an OSS DSP device.
//!
//! ## Pipeline
//! 1. **Negotiate**: the output is opened with the source's format; the device may answer
//!    with a different one (fewer channels, another rate, 16 bit instead of 8).
//! 2. **Produce**: a background thread decodes (Symphonia) or synthesizes interleaved PCM in
//!    the negotiated bit depth and sends chunks over a bounded channel.
//! 3. **Play**: the main thread hands each chunk to the output until the producer finishes
//!    or Ctrl-C cancels playback.
//!
//! No resampling is performed: a file whose rate or channel count the device will not take
//! is rejected.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::Parser;
use oss_play::cli::{Args, Command};
use oss_play::config::PlayerConfig;
use oss_play::runtime;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,oss_play=info,oss_output=info")
        }))
        .init();

    let mut config = match &args.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };
    config.apply_args(&args);

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_for_signal = cancel.clone();
    let _ = ctrlc::set_handler(move || {
        // A second Ctrl-C gives up on a clean shutdown.
        if cancel_for_signal.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
    });

    match &args.cmd {
        Command::Play { path } => runtime::run_play(&config, path, cancel),
        Command::Tone(tone) => runtime::run_tone(&config, &tone.spec(), cancel),
        Command::Probe => runtime::run_probe(&config),
    }
}
