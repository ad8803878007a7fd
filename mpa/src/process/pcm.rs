//! Conversion of synthesized samples into interleaved output bytes.

use crate::process::params::Encoding;
use crate::process::synth::Real;

/// Converts one rendered frame to interleaved little-endian bytes.
///
/// `rendered` holds one sample vector per synthesized channel; when only one
/// was rendered and `channels` is 2 it is duplicated. Returns the number of
/// samples that had to be clipped.
pub fn encode(
    rendered: &[&[Real]],
    channels: usize,
    encoding: Encoding,
    out: &mut Vec<u8>,
) -> u64 {
    let Some(len) = rendered.iter().map(|c| c.len()).min() else {
        return 0;
    };

    out.reserve(len * channels * encoding.bytes_per_sample());
    let mut clipped = 0;
    for i in 0..len {
        for ch in 0..channels {
            let sample = rendered[ch.min(rendered.len() - 1)][i];
            match encoding {
                Encoding::Signed16 => {
                    let (value, clip) = to_s16(sample);
                    clipped += clip as u64;
                    out.extend_from_slice(&value.to_le_bytes());
                }
                Encoding::Unsigned8 => {
                    let (value, clip) = to_s16(sample);
                    clipped += clip as u64;
                    out.push(((value >> 8) + 128) as u8);
                }
                Encoding::Float32 => out.extend_from_slice(&sample.to_le_bytes()),
            }
        }
    }

    clipped
}

/// Rounds to 16 bits, saturating. The flag is set when the value was clipped.
#[inline]
fn to_s16(sample: Real) -> (i16, bool) {
    let scaled = (sample * 32768.0).round();
    if scaled > i16::MAX as Real {
        (i16::MAX, true)
    } else if scaled < i16::MIN as Real {
        (i16::MIN, true)
    } else {
        (scaled as i16, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s16_saturates_and_counts() {
        let left = [0.5, 1.5, -2.0, -1.0];
        let right = [0.0, 0.25, 0.0, 0.0];
        let mut out = Vec::new();
        let clipped = encode(&[&left, &right], 2, Encoding::Signed16, &mut out);

        assert_eq!(clipped, 2);
        let values: Vec<i16> = out
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(values, [16384, 0, 32767, 8192, -32768, 0, -32768, 0]);
    }

    #[test]
    fn mono_to_stereo_and_u8() {
        let mono = [0.0, 0.5, -0.5];
        let mut out = Vec::new();
        assert_eq!(encode(&[&mono], 2, Encoding::Unsigned8, &mut out), 0);
        assert_eq!(out, [128, 128, 192, 192, 64, 64]);
    }

    #[test]
    fn float_passes_through() {
        let mono = [0.25, 3.0];
        let mut out = Vec::new();
        assert_eq!(encode(&[&mono], 1, Encoding::Float32, &mut out), 0);
        assert_eq!(&out[4..], &3.0f32.to_le_bytes());
    }
}
