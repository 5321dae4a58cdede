//! Player runtime.
//!
//! Builds the configured output, negotiates its format, then streams PCM from a producer
//! thread until the producer finishes or playback is cancelled.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use oss_output::probe::{self, DEFAULT_DEVICES};
use oss_output::{AudioFormat, AudioOutput, NullOutput};

use crate::config::PlayerConfig;
use crate::tone::{Tone, ToneSpec};
use crate::{decode, pcm};

const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Decode and play a local file.
///
/// The file plays at its own rate and channel count; if the device will not take them the
/// file is rejected rather than converted.
pub fn run_play(config: &PlayerConfig, path: &PathBuf, cancel: Arc<AtomicBool>) -> Result<()> {
    let source = decode::open_source(path)?;
    tracing::info!(
        channels = source.channels,
        rate_hz = source.rate,
        codec = source.info.codec.as_deref().unwrap_or("unknown"),
        duration_ms = source.info.duration_ms,
        "source (local file)"
    );

    let bits = playable_bits(source.info.bit_depth.unwrap_or(16));
    let desired = AudioFormat::new(source.rate, source.channels, bits);
    let mut output = build_output(config, desired)?;
    let mut format = desired;
    output.open(&mut format)?;

    if format.sample_rate != desired.sample_rate || format.channels != desired.channels {
        output.close();
        bail!("device negotiated {format}, source is {desired}; no conversion available");
    }
    tracing::info!(output = output.name(), "playing {format}");

    let (tx, rx) = crossbeam_channel::bounded(config.playback.queue_chunks.max(1));
    let producer = decode::spawn_decode(
        source,
        format.bits,
        config.playback.chunk_frames,
        tx,
        cancel.clone(),
    );

    let played = stream(output.as_mut(), rx, &cancel);
    join_producer("decoder", producer);
    report(format, played?);
    Ok(())
}

/// Play a sine tone.
///
/// The tone is synthesized in whatever format the device negotiates.
pub fn run_tone(config: &PlayerConfig, spec: &ToneSpec, cancel: Arc<AtomicBool>) -> Result<()> {
    let desired = AudioFormat {
        bits: playable_bits(u16::from(spec.format.bits)),
        ..spec.format
    };
    let mut output = build_output(config, desired)?;
    let mut format = desired;
    output.open(&mut format)?;
    if format != desired {
        tracing::info!("requested {desired}, device will be playing {format}");
    }
    tracing::info!(output = output.name(), freq_hz = spec.freq, "playing tone at {format}");

    let (tx, rx) = crossbeam_channel::bounded::<Vec<u8>>(config.playback.queue_chunks.max(1));
    let chunk_frames = config.playback.chunk_frames;
    let (freq, seconds) = (spec.freq, spec.seconds);
    let producer_cancel = cancel.clone();
    let producer = thread::spawn(move || -> Result<()> {
        let mut tone = Tone::new(freq, seconds, format.sample_rate, format.channels);
        while !producer_cancel.load(Ordering::Relaxed) {
            let Some(samples) = tone.next_chunk(chunk_frames) else {
                break;
            };
            if tx.send(pcm::encode(&samples, format.bits)?).is_err() {
                break;
            }
        }
        Ok(())
    });

    let played = stream(output.as_mut(), rx, &cancel);
    join_producer("tone", producer);
    report(format, played?);
    Ok(())
}

/// Print the diagnosis for the configured device, or for every default node.
pub fn run_probe(config: &PlayerConfig) -> Result<()> {
    let candidates: Vec<&str> = match config.output.device() {
        Some(device) => vec![device],
        None => DEFAULT_DEVICES.to_vec(),
    };
    for report in probe::survey(&candidates) {
        println!("{}: {}", report.path, report.status);
    }

    #[cfg(unix)]
    {
        let openable = match config.output.device() {
            Some(device) => probe::test_default_device(&oss_output::oss::OssDriver, &[device]),
            None => oss_output::oss::test_default_device(),
        };
        println!("openable: {}", if openable { "yes" } else { "no" });
    }
    Ok(())
}

/// Hand chunks to `output` until the producer hangs up or `cancel` is raised.
///
/// The output is closed on every path out. Returns the number of bytes played.
pub fn stream(
    output: &mut dyn AudioOutput,
    rx: Receiver<Vec<u8>>,
    cancel: &AtomicBool,
) -> Result<u64> {
    let mut played = 0u64;
    let result = loop {
        if cancel.load(Ordering::Relaxed) {
            tracing::info!("playback cancelled");
            output.cancel();
            break Ok(played);
        }
        match rx.recv_timeout(CANCEL_POLL) {
            Ok(chunk) => {
                if let Err(e) = output.play(&chunk) {
                    break Err::<u64, _>(e).with_context(|| format!("{} output", output.name()));
                }
                played += chunk.len() as u64;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break Ok(played),
        }
    };
    drop(rx);
    output.close();
    result
}

/// Wait for a producer thread, logging how it failed. Returns whether it finished cleanly.
fn join_producer(name: &str, producer: JoinHandle<Result<()>>) -> bool {
    match producer.join() {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::error!("{name} thread error: {e:#}");
            false
        }
        Err(_) => {
            tracing::error!("{name} thread panicked");
            false
        }
    }
}

fn build_output(config: &PlayerConfig, format: AudioFormat) -> Result<Box<dyn AudioOutput>> {
    if config.playback.null_output {
        return Ok(Box::new(NullOutput::new()));
    }
    build_oss_output(config, format)
}

#[cfg(unix)]
fn build_oss_output(config: &PlayerConfig, format: AudioFormat) -> Result<Box<dyn AudioOutput>> {
    use oss_output::OssOutput;
    use oss_output::mixer::NullMixer;

    let output = OssOutput::init(
        format,
        &config.output,
        oss_output::oss::OssDriver,
        Box::new(NullMixer),
    )?;
    tracing::info!(device = output.device(), "output device");
    Ok(Box::new(output))
}

#[cfg(not(unix))]
fn build_oss_output(_config: &PlayerConfig, _format: AudioFormat) -> Result<Box<dyn AudioOutput>> {
    bail!("OSS output is only available on Unix; use --null")
}

/// 8 bit sources stay 8 bit; everything else is produced as 16 bit.
fn playable_bits(bits: u16) -> u8 {
    if bits == 8 { 8 } else { 16 }
}

fn report(format: AudioFormat, bytes: u64) {
    let byte_rate = format.byte_rate().max(1);
    tracing::info!(
        bytes,
        seconds = bytes as f64 / byte_rate as f64,
        "playback finished"
    );
}
