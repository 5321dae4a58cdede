//! File decode stage.
//!
//! Uses Symphonia to:
//! - probe the input container/codec and report its native format
//! - decode packets into interleaved `f32` samples
//! - encode them at the negotiated bit depth and send fixed-size chunks from a background thread

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::Sender;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, DecoderOptions};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::pcm;

/// Metadata captured while probing the source.
#[derive(Clone, Debug, Default)]
pub struct SourceInfo {
    /// Codec name (best-effort).
    pub codec: Option<String>,
    /// Source bit depth (best-effort).
    pub bit_depth: Option<u16>,
    pub duration_ms: Option<u64>,
}

/// A probed file, ready to decode.
pub struct DecodeSource {
    format: Box<dyn FormatReader>,
    codec_params: CodecParameters,
    track_id: u32,
    pub rate: u32,
    pub channels: u8,
    pub info: SourceInfo,
}

/// Probe `path` and select its default track.
pub fn open_source(path: &Path) -> Result<DecodeSource> {
    let file = File::open(path).with_context(|| format!("open {:?}", path))?;

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("probe {:?}", path))?;

    let format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| anyhow!("No default audio track"))?;

    let channels = track
        .codec_params
        .channels
        .ok_or_else(|| anyhow!("Unknown channels"))?
        .count();
    let channels = u8::try_from(channels).map_err(|_| anyhow!("{channels} channels"))?;
    let rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| anyhow!("Unknown sample rate"))?;

    let codec_params = track.codec_params.clone();
    let track_id = track.id;
    let info = SourceInfo {
        codec: codec_name_from_params(&codec_params),
        bit_depth: codec_params
            .bits_per_sample
            .or(codec_params.bits_per_coded_sample)
            .and_then(|v| u16::try_from(v).ok()),
        duration_ms: duration_ms_from_codec_params(&codec_params),
    };

    Ok(DecodeSource {
        format,
        codec_params,
        track_id,
        rate,
        channels,
        info,
    })
}

/// Decode `source` on a background thread, sending `bits`-wide PCM chunks of
/// `chunk_frames` frames (the last one may be shorter).
///
/// The channel is dropped on EOF, error or cancellation; the thread's result carries the
/// error, if any.
pub fn spawn_decode(
    source: DecodeSource,
    bits: u8,
    chunk_frames: usize,
    tx: Sender<Vec<u8>>,
    cancel: Arc<AtomicBool>,
) -> JoinHandle<Result<()>> {
    thread::spawn(move || decode_loop(source, bits, chunk_frames, &tx, &cancel))
}

fn decode_loop(
    mut source: DecodeSource,
    bits: u8,
    chunk_frames: usize,
    tx: &Sender<Vec<u8>>,
    cancel: &AtomicBool,
) -> Result<()> {
    let mut decoder =
        symphonia::default::get_codecs().make(&source.codec_params, &DecoderOptions::default())?;
    let chunk_samples = chunk_frames.max(1) * usize::from(source.channels);
    let mut pending: Vec<f32> = Vec::with_capacity(chunk_samples * 2);

    while !cancel.load(Ordering::Relaxed) {
        let packet = match source.format.next_packet() {
            Ok(p) => p,
            Err(_) => break, // EOF
        };
        if packet.track_id() != source.track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!("skipping undecodable packet: {e}");
                continue;
            }
        };

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, *decoded.spec());
        sample_buf.copy_interleaved_ref(decoded);
        pending.extend_from_slice(sample_buf.samples());

        while pending.len() >= chunk_samples {
            let chunk = pcm::encode(&pending[..chunk_samples], bits)?;
            pending.drain(..chunk_samples);
            if tx.send(chunk).is_err() {
                return Ok(());
            }
        }
    }

    if !pending.is_empty() && !cancel.load(Ordering::Relaxed) {
        let _ = tx.send(pcm::encode(&pending, bits)?);
    }
    Ok(())
}

/// Best-effort duration in milliseconds from codec metadata.
///
/// Returns `None` if the container does not provide total frames or sample rate.
fn duration_ms_from_codec_params(codec_params: &CodecParameters) -> Option<u64> {
    let frames = codec_params.n_frames?;
    let rate = codec_params.sample_rate? as u64;
    if rate == 0 {
        return None;
    }
    Some(frames.saturating_mul(1000) / rate)
}

/// Best-effort codec label for log lines.
fn codec_name_from_params(params: &CodecParameters) -> Option<String> {
    use symphonia::core::codecs::*;
    let name = match params.codec {
        CODEC_TYPE_FLAC => "FLAC",
        CODEC_TYPE_MP3 => "MP3",
        CODEC_TYPE_AAC => "AAC",
        CODEC_TYPE_ALAC => "ALAC",
        CODEC_TYPE_VORBIS => "VORBIS",
        CODEC_TYPE_PCM_S8 | CODEC_TYPE_PCM_U8 => "PCM_8",
        CODEC_TYPE_PCM_S16LE | CODEC_TYPE_PCM_S16BE => "PCM_S16",
        CODEC_TYPE_PCM_S24LE | CODEC_TYPE_PCM_S24BE => "PCM_S24",
        CODEC_TYPE_PCM_F32LE | CODEC_TYPE_PCM_F32BE => "PCM_F32",
        _ => return None,
    };
    Some(name.to_string())
}
