//! Float to integer PCM encoding for the negotiated sample width.

use anyhow::{Result, bail};

/// Encode interleaved `f32` samples as signed native-endian PCM of `bits` width.
pub fn encode(samples: &[f32], bits: u8) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(samples.len() * usize::from(bits / 8));
    match bits {
        8 => out.extend(samples.iter().map(|&s| to_i8(s) as u8)),
        16 => {
            for &s in samples {
                out.extend_from_slice(&to_i16(s).to_ne_bytes());
            }
        }
        other => bail!("cannot encode {other} bit PCM"),
    }
    Ok(out)
}

fn to_i8(sample: f32) -> i8 {
    (sample.clamp(-1.0, 1.0) * f32::from(i8::MAX)).round() as i8
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16
}
