use std::f32::consts::TAU;

use oss_output::AudioFormat;

const AMPLITUDE: f32 = 0.25;

/// A requested test tone; `format` is what the output is asked for.
#[derive(Clone, Debug)]
pub struct ToneSpec {
    pub freq: f32,
    pub seconds: f32,
    pub format: AudioFormat,
}

/// Sine generator producing interleaved frames with the same value on every channel.
pub struct Tone {
    step: f32,
    phase: f32,
    channels: usize,
    remaining_frames: u64,
}

impl Tone {
    pub fn new(freq: f32, seconds: f32, rate: u32, channels: u8) -> Self {
        let frames = (seconds.max(0.0) * rate as f32).round() as u64;
        Self {
            step: TAU * freq / rate.max(1) as f32,
            phase: 0.0,
            channels: usize::from(channels.max(1)),
            remaining_frames: frames,
        }
    }

    /// Up to `max_frames` interleaved frames, or `None` once the tone has ended.
    pub fn next_chunk(&mut self, max_frames: usize) -> Option<Vec<f32>> {
        if self.remaining_frames == 0 {
            return None;
        }
        let frames = self.remaining_frames.min(max_frames.max(1) as u64) as usize;
        let mut out = Vec::with_capacity(frames * self.channels);
        for _ in 0..frames {
            let value = AMPLITUDE * self.phase.sin();
            out.extend(std::iter::repeat_n(value, self.channels));
            self.phase = (self.phase + self.step) % TAU;
        }
        self.remaining_frames -= frames as u64;
        Some(out)
    }
}
