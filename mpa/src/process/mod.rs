/// Byte sources: seekable, forward-only and caller-fed.
pub mod reader;

/// Decoder options and output encodings.
pub mod params;

/// Frame synchronization and stream resync.
///
/// Finds frame headers, skips ID3, RIFF and junk in front of the audio, and
/// reads frame bodies into the [`buffers`](buffers::FrameBuffers).
pub mod sync;

/// Double-buffered frame bodies with the Layer III bit reservoir.
pub mod buffers;

/// Layer I, II and III bitstream decoding to subband samples.
pub mod layer;

/// Polyphase synthesis filterbank.
pub mod synth;

/// N:M sample rate conversion and output position arithmetic.
pub mod ntom;

/// Decode window for seeking and gapless playback.
pub mod gapless;

/// PCM output encoding.
pub mod pcm;

/// Frame decoding to PCM.
///
/// Provides the [`Decoder`](decode::Decoder) state machine and its
/// caller-fed variant [`FeedDecoder`](decode::FeedDecoder).
pub mod decode;

/// Sample and frame accurate seeking.
pub mod seek;

#[cfg(test)]
pub(crate) mod testing;

/// Three silent MPEG-1 Layer I frames, 32 kbit/s at 32 kHz mono.
pub const EXAMPLE_DATA: &[u8] = &[
    0xFF, 0xFF, 0x18, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0x18, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0x18, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

#[cfg(test)]
mod tests {
    use super::EXAMPLE_DATA;
    use crate::process::decode::{FeedDecoder, Status};
    use crate::process::params::DecoderParams;

    #[test]
    fn example_data_decodes() -> anyhow::Result<()> {
        let mut decoder = FeedDecoder::new_feed(DecoderParams::default())?;
        decoder.feed(EXAMPLE_DATA);
        decoder.finish();

        let mut out = vec![0u8; 4096];
        let (status, _) = decoder.read(&mut out)?;
        assert_eq!(status, Status::NewFormat);
        let (status, n) = decoder.read(&mut out)?;
        assert_eq!(status, Status::Done);
        assert_eq!(n, 3 * 384 * 2);
        Ok(())
    }
}
