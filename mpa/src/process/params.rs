//! Decoder configuration.

use crate::process::ntom::NTOM_MAX_FREQ;
use crate::structs::index::INDEX_SIZE;
use crate::utils::errors::ParamError;

/// Default number of bytes searched for a new header after sync is lost.
pub const RESYNC_LIMIT: i64 = 1024;

/// Sample encoding of the decoded output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// Signed 16-bit little-endian.
    #[default]
    Signed16,
    /// Unsigned 8-bit.
    Unsigned8,
    /// 32-bit float little-endian, nominal range -1.0..1.0.
    Float32,
}

impl Encoding {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Encoding::Signed16 => 2,
            Encoding::Unsigned8 => 1,
            Encoding::Float32 => 4,
        }
    }
}

/// Which channel a stereo stream is folded into for mono output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonoMode {
    Left,
    Right,
    /// Average of both channels.
    Mix,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecoderParams {
    /// Trim encoder delay and padding.
    pub gapless: bool,
    pub mono: Option<MonoMode>,
    /// Duplicate mono streams into two channels.
    pub force_stereo: bool,
    pub encoding: Encoding,
    /// Output rate, converted with N:M resampling when it is not a power-of-two fraction.
    pub force_rate: Option<u32>,
    /// Native rate divided by `2^down_sample`, used when `force_rate` is unset.
    pub down_sample: u8,
    /// Bytes searched for sync before failing; negative means unlimited.
    pub resync_limit: i64,
    /// Fail immediately on a broken header instead of searching.
    pub no_resync: bool,
    /// Frame index entries; must be even, 0 disables indexing.
    pub index_size: usize,
}

impl Default for DecoderParams {
    fn default() -> Self {
        Self {
            gapless: true,
            mono: None,
            force_stereo: false,
            encoding: Encoding::default(),
            force_rate: None,
            down_sample: 0,
            resync_limit: RESYNC_LIMIT,
            no_resync: false,
            index_size: INDEX_SIZE,
        }
    }
}

impl DecoderParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        if let Some(rate) = self.force_rate {
            if rate == 0 || rate > NTOM_MAX_FREQ {
                return Err(ParamError::InvalidRate(rate));
            }
        }
        if self.down_sample > 2 {
            return Err(ParamError::InvalidDownSample(self.down_sample));
        }
        if self.index_size % 2 != 0 {
            return Err(ParamError::OddIndexSize(self.index_size));
        }
        if self.mono.is_some() && self.force_stereo {
            return Err(ParamError::MonoAndStereo);
        }
        Ok(())
    }

    /// Output rate for a stream with the given native rate.
    pub fn output_rate(&self, native: u32) -> u32 {
        self.force_rate.unwrap_or(native >> self.down_sample)
    }

    /// Output channel count for a stream with `channels` channels.
    pub fn output_channels(&self, channels: usize) -> usize {
        if self.mono.is_some() {
            1
        } else if self.force_stereo {
            2
        } else {
            channels
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation() {
        assert!(DecoderParams::default().validate().is_ok());

        let bad_rate = DecoderParams {
            force_rate: Some(192000),
            ..Default::default()
        };
        assert_eq!(bad_rate.validate(), Err(ParamError::InvalidRate(192000)));

        let conflict = DecoderParams {
            mono: Some(MonoMode::Mix),
            force_stereo: true,
            ..Default::default()
        };
        assert_eq!(conflict.validate(), Err(ParamError::MonoAndStereo));

        let odd = DecoderParams {
            index_size: 7,
            ..Default::default()
        };
        assert_eq!(odd.validate(), Err(ParamError::OddIndexSize(7)));
    }

    #[test]
    fn output_shape() {
        let params = DecoderParams {
            down_sample: 1,
            mono: Some(MonoMode::Left),
            ..Default::default()
        };
        assert_eq!(params.output_rate(44100), 22050);
        assert_eq!(params.output_channels(2), 1);
    }
}
