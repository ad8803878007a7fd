//! Random access by output sample or by frame.
//!
//! A seek sets the decode window so that decoding restarts at `ignoreframe`
//! (a few frames early for Layer III), primes the filter up to `firstframe`,
//! and drops `firstoff` samples of that frame. The reader is only moved when
//! the target is not the next frame anyway. Seekable readers jump to the
//! closest indexed frame; feed decoders report the input offset the caller
//! has to continue feeding from.

use std::io::SeekFrom;

use log::debug;

use crate::process::decode::{Decoder, FeedDecoder, Status};
use crate::process::ntom::DownSample;
use crate::process::reader::Reader;
use crate::process::sync::Interrupt;
use crate::utils::errors::{DecodeError, ReadError};

impl<R: Reader> Decoder<R> {
    /// Seeks to an output sample. Returns the new [`Decoder::tell`] position.
    ///
    /// [`SeekFrom::End`] counts from the end of the track, scanning a
    /// seekable stream if its length is not known yet.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<i64, DecodeError> {
        self.sticky(|d| {
            d.init_track()?;
            let target = match pos {
                SeekFrom::Start(n) => n as i64,
                SeekFrom::Current(n) => d.tell() + n,
                SeekFrom::End(n) => d.track_end()? + n,
            };
            d.seek_to(target.max(0))
        })
    }

    /// Seeks to the start of a frame. Returns the new [`Decoder::tellframe`].
    pub fn seek_frame(&mut self, pos: SeekFrom) -> Result<i64, DecodeError> {
        self.sticky(|d| {
            d.init_track()?;
            let mut target = match pos {
                SeekFrom::Start(n) => n as i64,
                SeekFrom::Current(n) => d.tellframe() + n,
                SeekFrom::End(n) => {
                    if d.state.track_frames < 1 && d.reader.is_seekable() {
                        d.scan_track()?;
                    }
                    if d.state.track_frames < 1 {
                        return Err(DecodeError::NoSeekFromEnd);
                    }
                    d.state.track_frames + n
                }
            };

            target = target.max(0);
            if d.state.track_frames > 0 {
                // the frame reader reports the end for the frame past the last
                target = target.min(d.state.track_frames);
            }

            let layer3 = d.is_layer3();
            d.window
                .set_frameseek(target, &d.state.scale, &d.ntom, layer3);
            d.do_the_seek()?;
            Ok(d.tellframe())
        })
    }

    /// End of the track in adjusted output samples.
    fn track_end(&mut self) -> Result<i64, DecodeError> {
        if self.state.track_frames < 1 && self.reader.is_seekable() {
            self.scan_track()?;
        }

        if self.state.track_frames > 0 {
            let outs = self
                .state
                .scale
                .frame_outs(&self.ntom, self.state.track_frames);
            Ok(self.window.adjust(outs))
        } else if self.window.end_os > 0 {
            Ok(self.window.adjust(self.window.end_os))
        } else {
            Err(DecodeError::NoSeekFromEnd)
        }
    }

    /// Seeks to an adjusted output sample position.
    pub(crate) fn seek_to(&mut self, pos: i64) -> Result<i64, DecodeError> {
        let layer3 = self.is_layer3();
        let raw = self.window.unadjust(pos);
        self.window
            .set_seek(raw, &self.state.scale, &self.ntom, layer3);
        self.do_the_seek()?;
        Ok(self.tell())
    }

    fn do_the_seek(&mut self) -> Result<(), DecodeError> {
        let fnum = self.window.ignoreframe;
        self.pcm.clear();
        self.pcm_read = 0;

        if self.state.num < self.window.firstframe {
            self.state.to_decode = false;
            if self.state.num > fnum {
                return Ok(());
            }
        }
        if self.state.num == fnum
            && (self.state.to_decode || fnum < self.window.firstframe)
        {
            return Ok(());
        }
        if self.state.num == fnum - 1 {
            self.state.to_decode = false;
            return Ok(());
        }

        self.buffers.reset();
        self.synth.reset();
        self.layers.reset();
        if self.state.scale.mode == DownSample::NtoM {
            self.ntom.set_ntom(fnum);
        }

        debug!(
            "Seeking to frame {fnum} (output from frame {}, skipping {} samples)",
            self.window.firstframe, self.window.firstoff
        );
        self.seek_reader_to_frame(fnum)?;

        if self.state.header_change > 1 {
            self.decode_update()?;
            self.state.header_change = 0;
        }
        if self.state.num < self.window.firstframe {
            self.state.to_decode = false;
        }
        Ok(())
    }

    /// Positions the reader so the last read frame is `want`, or the last
    /// frame of the stream if it ends earlier.
    pub(crate) fn seek_reader_to_frame(&mut self, want: i64) -> Result<(), DecodeError> {
        if self.reader.is_seekable() {
            let (pos, frame) = self
                .index
                .find(want)
                .unwrap_or((self.state.audio_start, 0));
            if self.state.num >= want || self.state.num < frame {
                self.reader.seek(pos)?;
                self.state.num = frame - 1;
                self.buffers.reset();
            }
        } else if self.state.num >= want {
            return Err(ReadError::NotSeekable.into());
        }

        while self.state.num < want {
            match self.read_frame() {
                Ok(()) => {}
                Err(Interrupt::End | Interrupt::NeedMore) => break,
                Err(Interrupt::Fatal(err)) => return Err(err),
            }
        }
        Ok(())
    }
}

impl FeedDecoder {
    /// Seeks a feed decoder to an output sample.
    ///
    /// Returns the new position and the input byte offset the caller must
    /// feed from next, or `None` while the first frame has not been seen.
    pub fn feed_seek(&mut self, pos: SeekFrom) -> Result<Option<(i64, u64)>, DecodeError> {
        self.sticky(|d| {
            if d.init_track()? != Status::Ok {
                return Ok(None);
            }

            let target = match pos {
                SeekFrom::Start(n) => n as i64,
                SeekFrom::Current(n) => d.tell() + n,
                SeekFrom::End(n) => d.track_end()? + n,
            }
            .max(0);

            let layer3 = d.is_layer3();
            let raw = d.window.unadjust(target);
            d.window
                .set_seek(raw, &d.state.scale, &d.ntom, layer3);
            let fnum = d.window.ignoreframe;
            d.pcm.clear();
            d.pcm_read = 0;

            let mut input_offset = d.reader.end();
            if d.state.num < d.window.firstframe {
                d.state.to_decode = false;
            }
            let next_anyway = (d.state.num == fnum && d.state.to_decode) || d.state.num == fnum - 1;
            if !next_anyway {
                let (pos, frame) = d
                    .index
                    .find(fnum)
                    .unwrap_or((d.state.audio_start, 0));
                input_offset = d.feed_set_pos(pos);
                d.state.num = frame - 1;
                d.buffers.reset();
                d.synth.reset();
                d.layers.reset();
                if d.state.scale.mode == DownSample::NtoM {
                    d.ntom.set_ntom(fnum);
                }
                debug!("Feed seek to frame {frame}, continue input at {input_offset}");
            }

            Ok(Some((d.tell(), input_offset)))
        })
    }

    /// Moves the input to `pos`, keeping buffered data when it covers `pos`.
    /// Returns the offset of the next byte to feed.
    fn feed_set_pos(&mut self, pos: u64) -> u64 {
        if self.reader.seek(pos).is_ok() {
            self.reader.forget();
            self.reader.end()
        } else {
            self.reader.reset_to(pos);
            pos
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::process::params::DecoderParams;
    use crate::process::reader::{SeekableReader, StreamReader};
    use crate::process::testing::{L1_MONO, L3_STEREO, silent_stream};

    type CursorDecoder = Decoder<SeekableReader<Cursor<Vec<u8>>>>;

    fn seekable(data: Vec<u8>, params: DecoderParams) -> anyhow::Result<CursorDecoder> {
        Ok(Decoder::new(SeekableReader::new(Cursor::new(data))?, params)?)
    }

    fn samples<R: Reader>(decoder: &Decoder<R>) -> usize {
        let bytes = decoder.state.format.map_or(1, |f| f.sample_bytes());
        decoder.output().len() / bytes
    }

    #[test]
    fn sample_seek_and_tell() -> anyhow::Result<()> {
        let mut decoder = seekable(silent_stream(L1_MONO, 10), DecoderParams::default())?;
        decoder.format()?;

        assert_eq!(decoder.seek(SeekFrom::Start(1000))?, 1000);
        assert_eq!(decoder.tell(), 1000);
        assert_eq!(decoder.tellframe(), 2);
        assert_eq!(decoder.decode_frame()?, Status::Ok);
        assert_eq!(samples(&decoder), 384 - 232);
        assert_eq!(decoder.tell(), 1152);

        // seeking to the current position changes nothing
        assert_eq!(decoder.seek(SeekFrom::Current(0))?, 1152);

        assert_eq!(decoder.seek(SeekFrom::Current(-500))?, 652);
        assert_eq!(decoder.tell(), 652);

        assert_eq!(decoder.seek(SeekFrom::End(-100))?, 3740);
        assert_eq!(decoder.track_frames(), 10);
        assert_eq!(decoder.decode_frame()?, Status::Ok);
        assert_eq!(samples(&decoder), 100);
        assert_eq!(decoder.decode_frame()?, Status::Done);
        Ok(())
    }

    #[test]
    fn seek_then_decode_matches_linear_decode() -> anyhow::Result<()> {
        let params = DecoderParams {
            gapless: false,
            ..Default::default()
        };
        let mut linear = seekable(silent_stream(L3_STEREO, 8), params.clone())?;
        linear.format()?;
        let mut total = 0;
        while linear.decode_frame()? == Status::Ok {
            total += linear.output().len() / 4;
        }

        let mut seeking = seekable(silent_stream(L3_STEREO, 8), params)?;
        seeking.format()?;
        assert_eq!(seeking.seek(SeekFrom::Start(5000))?, 5000);
        let mut rest = 0;
        while seeking.decode_frame()? == Status::Ok {
            rest += seeking.output().len() / 4;
        }
        assert_eq!(rest, total - 5000);
        Ok(())
    }

    #[test]
    fn frame_seek() -> anyhow::Result<()> {
        let mut decoder = seekable(silent_stream(L3_STEREO, 10), DecoderParams::default())?;
        decoder.format()?;

        assert_eq!(decoder.seek_frame(SeekFrom::Start(4))?, 4);
        // Layer III decodes two frames early to fill the reservoir
        assert_eq!(decoder.window.ignoreframe, 2);
        assert_eq!(decoder.decode_frame()?, Status::Ok);
        assert_eq!(samples(&decoder), 1152);
        assert_eq!(decoder.tellframe(), 5);

        assert_eq!(decoder.seek_frame(SeekFrom::End(-1))?, 9);
        assert_eq!(decoder.seek_frame(SeekFrom::Current(-9))?, 0);
        assert_eq!(decoder.decode_frame()?, Status::Ok);
        assert_eq!(samples(&decoder), 1152 - 529);

        assert_eq!(decoder.seek_frame(SeekFrom::Start(50))?, 10);
        assert_eq!(decoder.decode_frame()?, Status::Done);
        Ok(())
    }

    #[test]
    fn forward_only_readers() -> anyhow::Result<()> {
        let data = silent_stream(L1_MONO, 10);
        let mut decoder = Decoder::new(StreamReader::new(Cursor::new(data)), DecoderParams::default())?;
        decoder.format()?;

        assert_eq!(decoder.seek_frame(SeekFrom::Start(5))?, 5);
        assert_eq!(decoder.decode_frame()?, Status::Ok);
        assert_eq!(
            decoder.seek_frame(SeekFrom::Start(1)),
            Err(DecodeError::Read(ReadError::NotSeekable))
        );
        Ok(())
    }

    #[test]
    fn end_needs_a_length() -> anyhow::Result<()> {
        let data = silent_stream(L1_MONO, 4);
        let mut decoder = Decoder::new(StreamReader::new(Cursor::new(data)), DecoderParams::default())?;
        assert_eq!(decoder.seek(SeekFrom::End(0)), Err(DecodeError::NoSeekFromEnd));
        Ok(())
    }

    #[test]
    fn feed_seek_within_and_outside_the_buffer() -> anyhow::Result<()> {
        let stream = silent_stream(L1_MONO, 10);
        let mut decoder = FeedDecoder::new_feed(DecoderParams::default())?;
        assert_eq!(decoder.feed_seek(SeekFrom::Start(0))?, None);

        decoder.feed(&stream);
        decoder.format()?;
        assert_eq!(decoder.decode_frame()?, Status::Ok);
        assert_eq!(decoder.decode_frame()?, Status::Ok);

        // frame 2 is next anyway
        assert_eq!(decoder.feed_seek(SeekFrom::Start(1000))?, Some((1000, 480)));
        assert_eq!(decoder.decode_frame()?, Status::Ok);
        assert_eq!(samples(&decoder), 384 - 232);

        // frame 0 was dropped from the buffer: the caller refeeds from byte 0
        assert_eq!(decoder.feed_seek(SeekFrom::Start(0))?, Some((0, 0)));
        assert_eq!(decoder.decode_frame()?, Status::NeedMore);
        decoder.feed(&stream);
        assert_eq!(decoder.decode_frame()?, Status::Ok);
        assert_eq!(samples(&decoder), 384);
        assert_eq!(decoder.tellframe(), 1);
        Ok(())
    }
}
