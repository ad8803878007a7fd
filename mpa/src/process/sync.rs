//! Frame synchronization: finding the next frame and reading its body.
//!
//! ## Before the first frame
//!
//! - **ID3v2** tags are skipped by their syncsafe size
//! - **RIFF/WAVE** wrappers are skipped up to their `data` chunk
//! - anything else is junk and searched byte by byte, up to 64 KiB
//!
//! A candidate first header is only accepted when the header one frame later
//! agrees with it (seekable and buffered readers).
//!
//! ## Inside the stream
//!
//! ID3v1 and ID3v2 tags are skipped. Any other invalid header starts a
//! resync that shifts one byte at a time up to the configured limit, after
//! which the next header is verified again like a first header.

use log::{debug, error, info, trace, warn};

use crate::process::decode::Decoder;
use crate::process::gapless::GAPLESS_DELAY;
use crate::process::reader::Reader;
use crate::structs::header::{FrameHeader, HDR_CMP_MASK, Layer, head_check, header_change, is_free_format};
use crate::structs::info_tag::InfoTag;
use crate::utils::errors::{DecodeError, ReadError};

/// Bytes searched for the first header before giving up.
pub const JUNK_LIMIT: u32 = 65536;

const ID3V2: u32 = 0x0049_4433;
const ID3V1: u32 = 0x0054_4147;
const RIFF: u32 = 0x5249_4646;
const DATA: u32 = 0x6461_7461;

/// Why [`Decoder::read_frame`] stopped without a frame.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub(crate) enum Interrupt {
    #[error("More input data is required")]
    NeedMore,
    #[error("End of stream")]
    End,
    #[error(transparent)]
    Fatal(DecodeError),
}

impl From<ReadError> for Interrupt {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::NeedMore => Interrupt::NeedMore,
            ReadError::Eof => Interrupt::End,
            err => Interrupt::Fatal(err.into()),
        }
    }
}

/// A header that passes the quick check and decodes.
fn valid(head: u32) -> Option<FrameHeader> {
    if head_check(head) {
        FrameHeader::parse(head).ok()
    } else {
        None
    }
}

/// Skipped bytes, committed once a frame is accepted so interrupted reads
/// are not counted twice.
#[derive(Debug, Default)]
struct SyncStats {
    junk: u64,
    resyncs: u64,
}

impl<R: Reader> Decoder<R> {
    fn read_head(&mut self) -> Result<u32, Interrupt> {
        let mut b = [0u8; 4];
        self.reader.read_exact(&mut b)?;
        Ok(u32::from_be_bytes(b))
    }

    fn shift_head(&mut self, head: u32) -> Result<u32, Interrupt> {
        let mut b = [0u8; 1];
        self.reader.read_exact(&mut b)?;
        Ok(head << 8 | b[0] as u32)
    }

    /// Reads the next frame into the frame buffers and makes it current.
    pub(crate) fn read_frame(&mut self) -> Result<(), Interrupt> {
        let mut stats = SyncStats::default();
        // a resynced header is verified like a first one, but `firsthead`
        // only changes once its frame is loaded
        let mut resynced = false;

        'read_again: loop {
            let mut head = self.read_head()?;

            let header = 'sync: loop {
                if self.state.firsthead.is_none() && !is_free_format(head) && valid(head).is_none() {
                    match self.skip_leading(head, &mut stats)? {
                        Some(found) => head = found,
                        None => continue 'read_again,
                    }
                }

                if let Some(header) = valid(head) {
                    if (self.state.firsthead.is_none() || resynced)
                        && (self.reader.is_seekable() || self.reader.is_buffered())
                    {
                        let head_pos = self.reader.tell() - 4;
                        if !self.lookahead(&header)? {
                            debug!("Header {head:#010X} at {head_pos} is not followed by a matching one");
                            self.state.oldhead = None;
                            self.reader.seek(head_pos + 1)?;
                            continue 'read_again;
                        }
                    }
                    break 'sync header;
                }

                if is_free_format(head) && self.state.firsthead.is_none() {
                    error!("Free format stream at offset {}, header {head:#010X}", self.reader.tell() - 4);
                    continue 'read_again;
                }

                if head >> 8 == ID3V1 {
                    info!("Skipping ID3v1 tag at offset {}", self.reader.tell() - 4);
                    self.reader.skip(124)?;
                    self.flag_id3();
                    continue 'read_again;
                }

                if head >> 8 == ID3V2 {
                    self.skip_id3v2()?;
                    continue 'read_again;
                }

                let pos = self.reader.tell() - 4;
                warn!("Illegal Audio-MPEG-Header {head:#010X} at offset {pos}");
                if self.params.no_resync {
                    return Err(Interrupt::Fatal(DecodeError::OutOfSync(pos)));
                }

                head = self.resync(head, &mut stats)?;
                if !resynced {
                    stats.resyncs += 1;
                    resynced = true;
                }
            };

            let frame_pos = self.reader.tell() - 4;
            self.buffers.load(&header, &mut self.reader)?;
            if resynced {
                self.state.firsthead = None;
                resynced = false;
            }

            if self.state.firsthead.is_none() && header.layer == Layer::III {
                if self.params.gapless && self.window.begin_s == 0 {
                    self.window.init(GAPLESS_DELAY, 0);
                }

                match InfoTag::parse(&header, self.buffers.pending_body()) {
                    Ok(Some(tag)) => {
                        self.apply_info_tag(&header, tag);
                        self.reader.forget();
                        self.state.oldhead = None;
                        continue 'read_again;
                    }
                    Ok(None) => {}
                    Err(err) => debug!("Ignoring unreadable Info tag: {err}"),
                }
            }

            self.commit_frame(header, frame_pos, stats);
            return Ok(());
        }
    }

    fn commit_frame(&mut self, header: FrameHeader, frame_pos: u64, stats: SyncStats) {
        let state = &mut self.state;
        self.buffers.commit();

        state.header_change = header_change(state.oldhead, header.raw);
        state.oldhead = Some(header.raw);
        if state.firsthead.is_none() {
            state.firsthead = Some(header.raw);
        }
        if state.num < 0 {
            state.audio_start = frame_pos;
        }

        state.mean_frames += 1;
        state.mean_framesize += (header.frame_bytes() as f64 - state.mean_framesize) / state.mean_frames as f64;
        state.num += 1;
        if self.reader.is_seekable() || self.reader.is_buffered() {
            self.index.insert(state.num, frame_pos);
        }

        state.junk_bytes += stats.junk;
        state.resyncs += stats.resyncs;
        state.frame_pos = frame_pos;
        state.header = Some(header);
        state.to_decode = true;
        state.to_ignore = true;
        self.reader.forget();

        trace!(
            "Frame {}: {} {}, {} kbit/s, {} Hz, {}, {} bytes at {frame_pos}",
            state.num,
            header.version,
            header.layer,
            header.bitrate(),
            header.sample_rate(),
            header.mode,
            header.frame_bytes(),
        );
    }

    fn apply_info_tag(&mut self, header: &FrameHeader, tag: InfoTag) {
        if let Some(frames) = tag.frames {
            self.state.track_frames = frames as i64;
        }
        self.state.vbr = tag.vbr_mode();
        self.state.abr_rate = tag.abr_rate();

        if self.params.gapless {
            if let Some((begin, end)) = tag.gapless_range(header.spf()) {
                self.window.init(begin, end);
            }
        }

        debug!(
            "{:?} tag: {} frames, {}",
            tag.kind,
            self.state.track_frames,
            self.state.vbr
        );
        self.state.info_tag = Some(tag);
    }

    /// Checks that a matching header follows one frame after `header`.
    /// The reader is left at the start of `header`'s body.
    fn lookahead(&mut self, header: &FrameHeader) -> Result<bool, Interrupt> {
        let body_start = self.reader.tell();

        let next = match self
            .reader
            .skip(header.framesize as u64)
            .map_err(Interrupt::from)
            .and_then(|_| self.read_head())
        {
            Ok(next) => next,
            Err(Interrupt::End) => {
                warn!("Cannot read the header after the first frame, assuming a one-frame stream");
                self.reader.seek(body_start)?;
                return Ok(true);
            }
            Err(err) => return Err(err),
        };

        self.reader.seek(body_start)?;
        Ok(head_check(next) && (next & HDR_CMP_MASK) == (header.raw & HDR_CMP_MASK))
    }

    /// Handles what precedes the first frame. Returns the next candidate
    /// header, or `None` when a tag or wrapper was skipped and reading restarts.
    fn skip_leading(&mut self, mut head: u32, stats: &mut SyncStats) -> Result<Option<u32>, Interrupt> {
        if head >> 8 == ID3V2 {
            self.skip_id3v2()?;
            return Ok(None);
        }

        if head == RIFF {
            self.skip_riff()?;
            return Ok(None);
        }

        for shifted in 1..=JUNK_LIMIT {
            head = self.shift_head(head)?;
            stats.junk += 1;
            if valid(head).is_some() {
                info!("Skipped {shifted} bytes of junk before the first frame");
                return Ok(Some(head));
            }
        }

        error!("Giving up searching valid MPEG header after {JUNK_LIMIT} bytes of junk");
        Err(Interrupt::End)
    }

    /// Skips an ID3v2 tag; the reader is past "ID3" and the major version.
    fn skip_id3v2(&mut self) -> Result<(), Interrupt> {
        let mut rest = [0u8; 6];
        self.reader.read_exact(&mut rest)?;
        let flags = rest[1];
        let size_bytes = &rest[2..6];

        if size_bytes.iter().any(|&b| b & 0x80 != 0) {
            warn!("ID3v2 tag with invalid size {size_bytes:02X?}, skipping its header only");
            return Ok(());
        }

        let mut size = size_bytes.iter().fold(0u64, |acc, &b| acc << 7 | b as u64);
        if flags & 0x10 != 0 {
            size += 10;
        }

        info!("Skipping ID3v2 tag of {} bytes", size + 10);
        self.reader.skip(size)?;
        self.flag_id3();
        Ok(())
    }

    /// Skips a RIFF/WAVE header up to and including the `data` chunk size.
    fn skip_riff(&mut self) -> Result<(), Interrupt> {
        let mut head = self.read_head()?;
        let mut shifted = 0;
        while head != DATA {
            if shifted == JUNK_LIMIT {
                error!("No data chunk within {JUNK_LIMIT} bytes of the RIFF header");
                return Err(Interrupt::End);
            }
            head = self.shift_head(head)?;
            shifted += 1;
        }
        self.read_head()?;

        info!("Skipped RIFF header, audio data starts at {}", self.reader.tell());
        self.state.oldhead = None;
        Ok(())
    }

    fn flag_id3(&mut self) {
        self.state.meta.id3 = true;
        self.state.meta.new_id3 = true;
        self.state.oldhead = None;
    }

    /// Shifts through the input until a valid header shows up.
    fn resync(&mut self, mut head: u32, stats: &mut SyncStats) -> Result<u32, Interrupt> {
        let limit = self.params.resync_limit;
        let mut tries: i64 = 0;

        loop {
            tries += 1;
            if limit >= 0 && tries >= limit {
                error!("Giving up resync after {tries} bytes");
                return Err(Interrupt::Fatal(DecodeError::ResyncFail(tries as u64)));
            }

            head = self.shift_head(head)?;
            stats.junk += 1;
            if valid(head).is_some() {
                info!("Resynced after skipping {tries} bytes");
                return Ok(head);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::process::decode::{Decoder, FeedDecoder};
    use crate::process::params::DecoderParams;
    use crate::process::reader::SeekableReader;
    use crate::process::testing::{L1_MONO, L3_STEREO, id3v1, id3v2, junk, riff_header, silent_frame, silent_stream};

    fn seekable(data: Vec<u8>, params: DecoderParams) -> Decoder<SeekableReader<Cursor<Vec<u8>>>> {
        let reader = SeekableReader::new(Cursor::new(data)).expect("cursor");
        Decoder::new(reader, params).expect("valid params")
    }

    /// Reads frames until the stream ends, returning their offsets.
    fn frame_offsets<R: Reader>(decoder: &mut Decoder<R>) -> Result<Vec<u64>, Interrupt> {
        let mut offsets = Vec::new();
        loop {
            match decoder.read_frame() {
                Ok(()) => offsets.push(decoder.state.frame_pos),
                Err(Interrupt::End) => return Ok(offsets),
                Err(err) => return Err(err),
            }
        }
    }

    #[test]
    fn leading_junk_is_skipped() -> anyhow::Result<()> {
        let mut data = junk(50);
        data.extend(silent_stream(L3_STEREO, 3));
        let mut decoder = seekable(data, DecoderParams::default());

        assert_eq!(frame_offsets(&mut decoder), Ok(vec![50, 467, 884]));
        assert_eq!(decoder.stats().junk_bytes, 50);
        assert_eq!(decoder.state.firsthead, Some(L3_STEREO));
        assert_eq!(decoder.state.audio_start, 50);
        Ok(())
    }

    #[test]
    fn lookahead_rejects_false_sync() -> anyhow::Result<()> {
        // a lone header followed by zeros, then the real stream
        let mut data = junk(10);
        data.extend(L3_STEREO.to_be_bytes());
        data.extend([0u8; 100]);
        data.extend(silent_stream(L3_STEREO, 2));
        let mut decoder = seekable(data, DecoderParams::default());

        assert_eq!(frame_offsets(&mut decoder), Ok(vec![114, 531]));
        Ok(())
    }

    #[test]
    fn one_frame_stream_is_accepted() -> anyhow::Result<()> {
        let mut decoder = seekable(silent_frame(L1_MONO), DecoderParams::default());
        assert_eq!(frame_offsets(&mut decoder), Ok(vec![0]));
        Ok(())
    }

    #[test]
    fn tags_and_wrappers() -> anyhow::Result<()> {
        let stream = silent_stream(L1_MONO, 4);

        let mut data = id3v2(300);
        data.extend(&stream);
        let mut decoder = seekable(data, DecoderParams::default());
        assert_eq!(frame_offsets(&mut decoder)?.first(), Some(&310));
        assert!(decoder.meta_check().id3);
        assert!(decoder.meta_check().new_id3);
        decoder.meta_clear_new();
        assert!(!decoder.meta_check().new_id3);

        let mut data = riff_header(stream.len() as u32);
        data.extend(&stream);
        let mut decoder = seekable(data, DecoderParams::default());
        assert_eq!(frame_offsets(&mut decoder)?, vec![44, 92, 140, 188]);
        assert!(!decoder.meta_check().id3);

        let mut data = stream.clone();
        data.extend(id3v1());
        let mut decoder = seekable(data, DecoderParams::default());
        assert_eq!(frame_offsets(&mut decoder)?.len(), 4);
        assert!(decoder.meta_check().id3);
        assert_eq!(decoder.stats().resyncs, 0);
        Ok(())
    }

    #[test]
    fn resync_within_limit() -> anyhow::Result<()> {
        let mut data = silent_stream(L1_MONO, 3);
        data.extend(junk(20));
        data.extend(silent_stream(L1_MONO, 3));
        let mut decoder = seekable(data, DecoderParams::default());

        let offsets = frame_offsets(&mut decoder)?;
        assert_eq!(offsets, vec![0, 48, 96, 164, 212, 260]);
        assert_eq!(decoder.stats().resyncs, 1);
        assert_eq!(decoder.stats().junk_bytes, 20);
        Ok(())
    }

    #[test]
    fn resync_limit_and_no_resync() -> anyhow::Result<()> {
        let mut data = silent_stream(L1_MONO, 2);
        data.extend(junk(40));
        data.extend(silent_stream(L1_MONO, 2));

        let params = DecoderParams {
            resync_limit: 10,
            ..Default::default()
        };
        let mut decoder = seekable(data.clone(), params);
        assert_eq!(
            frame_offsets(&mut decoder),
            Err(Interrupt::Fatal(DecodeError::ResyncFail(10)))
        );

        let params = DecoderParams {
            no_resync: true,
            ..Default::default()
        };
        let mut decoder = seekable(data.clone(), params);
        assert_eq!(
            frame_offsets(&mut decoder),
            Err(Interrupt::Fatal(DecodeError::OutOfSync(96)))
        );

        let params = DecoderParams {
            resync_limit: -1,
            ..Default::default()
        };
        let mut decoder = seekable(data, params);
        assert_eq!(frame_offsets(&mut decoder)?.len(), 4);
        Ok(())
    }

    #[test]
    fn giving_up_on_junk_ends_the_stream() -> anyhow::Result<()> {
        let mut data = junk(JUNK_LIMIT as usize + 100);
        data.extend(silent_stream(L1_MONO, 2));
        let mut decoder = seekable(data, DecoderParams::default());
        assert_eq!(decoder.read_frame(), Err(Interrupt::End));
        Ok(())
    }

    #[test]
    fn feed_waits_for_lookahead() -> anyhow::Result<()> {
        let stream = silent_stream(L3_STEREO, 2);
        let mut decoder = FeedDecoder::new_feed(DecoderParams::default())?;

        // header and body alone are not enough before the next header is seen
        decoder.feed(&stream[..417]);
        assert_eq!(decoder.read_frame(), Err(Interrupt::NeedMore));
        assert_eq!(decoder.state.num, -1);

        decoder.feed(&stream[417..]);
        assert_eq!(decoder.read_frame(), Ok(()));
        assert_eq!(decoder.read_frame(), Ok(()));
        assert_eq!(decoder.state.num, 1);
        assert_eq!(decoder.read_frame(), Err(Interrupt::NeedMore));

        decoder.finish();
        assert_eq!(decoder.read_frame(), Err(Interrupt::End));
        Ok(())
    }

    #[test]
    fn feed_split_inside_resync_lookahead() -> anyhow::Result<()> {
        let mut data = silent_stream(L1_MONO, 3);
        data.extend(junk(20));
        data.extend(silent_stream(L1_MONO, 3));
        let mut decoder = FeedDecoder::new_feed(DecoderParams::default())?;

        // the resynced header at 164 is found, the one after it is not fed yet
        decoder.feed(&data[..200]);
        for _ in 0..3 {
            decoder.read_frame()?;
        }
        assert_eq!(decoder.read_frame(), Err(Interrupt::NeedMore));
        assert_eq!(decoder.state.firsthead, Some(L1_MONO));

        decoder.feed(&data[200..]);
        decoder.finish();
        assert_eq!(frame_offsets(&mut decoder)?, vec![164, 212, 260]);
        assert_eq!(decoder.stats().resyncs, 1);
        assert_eq!(decoder.stats().junk_bytes, 20);
        Ok(())
    }
}
