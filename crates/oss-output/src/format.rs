use std::fmt;

/// Interleaved signed PCM layout agreed with an output device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AudioFormat {
    /// Frames per second.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u8,
    /// Bits per sample.
    pub bits: u8,
}

impl AudioFormat {
    pub const fn new(sample_rate: u32, channels: u8, bits: u8) -> Self {
        Self {
            sample_rate,
            channels,
            bits,
        }
    }

    /// Bytes per interleaved frame.
    pub fn frame_size(&self) -> u32 {
        u32::from(self.channels) * u32::from(self.bits) / 8
    }

    /// Bytes consumed per second of playback.
    pub fn byte_rate(&self) -> u64 {
        u64::from(self.sample_rate) * u64::from(self.frame_size())
    }

    /// Whether every field is non-zero and the sample width is whole bytes.
    pub fn is_valid(&self) -> bool {
        self.sample_rate > 0 && self.channels > 0 && self.bits > 0 && self.bits % 8 == 0
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bit {} channel audio at {} Hz",
            self.bits, self.channels, self.sample_rate
        )
    }
}
