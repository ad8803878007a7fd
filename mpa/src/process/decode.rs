//! The frame decode state machine.
//!
//! [`Decoder`] pulls frames through [`sync`](crate::process::sync), hands
//! their bodies to the layer decoders, runs the subband rows through the
//! synthesis filter and the optional rate converter, and trims the result to
//! the decode window.
//!
//! Every call reports one of:
//!
//! - [`Status::Ok`]: a frame was decoded (its output may be empty after trimming)
//! - [`Status::NewFormat`]: the output format changed; query [`Decoder::format`]
//! - [`Status::NeedMore`]: a feed decoder ran out of input
//! - [`Status::Done`]: the stream ended
//!
//! Errors are sticky. Once a call failed, every later call returns
//! [`DecodeError::Failed`] until [`Decoder::reset`].

use log::{Level, debug, info, trace};

use crate::log_or_err;
use crate::process::buffers::FrameBuffers;
use crate::process::gapless::DecodeWindow;
use crate::process::layer::{FrameContext, LayerDecoders, SubbandRows, rows_per_frame};
use crate::process::ntom::{DownSample, RateConverter, SampleScale};
use crate::process::params::{DecoderParams, Encoding, MonoMode};
use crate::process::pcm;
use crate::process::reader::{FeedReader, Reader};
use crate::process::sync::Interrupt;
use crate::process::synth::{Real, SBLIMIT, SynthesisFilter};
use crate::structs::header::{FrameHeader, FrameInfo, Layer, VbrMode};
use crate::structs::index::FrameIndex;
use crate::structs::info_tag::InfoTag;
use crate::utils::errors::{DecodeError, ReadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Done,
    NeedMore,
    NewFormat,
}

/// Shape of the decoded PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub rate: u32,
    pub channels: usize,
    pub encoding: Encoding,
}

impl OutputFormat {
    /// Bytes of one sample across all channels.
    pub fn sample_bytes(&self) -> usize {
        self.channels * self.encoding.bytes_per_sample()
    }
}

/// Tags seen in the stream. Their contents are not parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetaFlags {
    pub id3: bool,
    /// Set when a tag was seen since the last [`Decoder::meta_clear_new`].
    pub new_id3: bool,
}

/// Bytes that were not part of any frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub junk_bytes: u64,
    pub resyncs: u64,
}

/// Playback position in frames and seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub frame: i64,
    pub frames_left: i64,
    pub seconds: f64,
    pub seconds_left: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct DecoderState {
    pub fail_level: Level,
    /// Number of the current frame, -1 before the first one.
    pub num: i64,
    pub header: Option<FrameHeader>,
    pub firsthead: Option<u32>,
    pub oldhead: Option<u32>,
    pub header_change: u8,
    /// The current frame has not been decoded yet.
    pub to_decode: bool,
    /// The current frame may be decoded to prime the filter.
    pub to_ignore: bool,
    /// The decode window has not been set up for this track yet.
    pub fresh: bool,
    pub decoder_change: bool,
    pub new_format_pending: bool,
    pub format: Option<OutputFormat>,
    pub scale: SampleScale,
    pub outblock: usize,
    pub track_frames: i64,
    pub track_samples: i64,
    pub mean_frames: i64,
    pub mean_framesize: f64,
    pub audio_start: u64,
    pub frame_pos: u64,
    pub vbr: VbrMode,
    pub abr_rate: u32,
    pub info_tag: Option<InfoTag>,
    pub meta: MetaFlags,
    pub clip: u64,
    pub junk_bytes: u64,
    pub resyncs: u64,
    pub error: Option<DecodeError>,
}

impl Default for DecoderState {
    fn default() -> Self {
        Self {
            fail_level: Level::Error,
            num: -1,
            header: None,
            firsthead: None,
            oldhead: None,
            header_change: 0,
            to_decode: false,
            to_ignore: false,
            fresh: true,
            decoder_change: true,
            new_format_pending: false,
            format: None,
            scale: SampleScale::default(),
            outblock: 0,
            track_frames: 0,
            track_samples: 0,
            mean_frames: 0,
            mean_framesize: 0.0,
            audio_start: 0,
            frame_pos: 0,
            vbr: VbrMode::Cbr,
            abr_rate: 0,
            info_tag: None,
            meta: MetaFlags::default(),
            clip: 0,
            junk_bytes: 0,
            resyncs: 0,
            error: None,
        }
    }
}

/// Decodes MPEG audio frames from a [`Reader`] to PCM.
///
/// ```rust,no_run
/// use std::fs::File;
/// use mpa::process::decode::{Decoder, Status};
/// use mpa::process::params::DecoderParams;
/// use mpa::process::reader::SeekableReader;
///
/// let reader = SeekableReader::new(File::open("track.mp3")?)?;
/// let mut decoder = Decoder::new(reader, DecoderParams::default())?;
/// loop {
///     match decoder.decode_frame()? {
///         Status::Ok => { /* use decoder.output() */ }
///         Status::NewFormat => println!("{:?}", decoder.format()?),
///         Status::NeedMore | Status::Done => break,
///     }
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Decoder<R: Reader = FeedReader> {
    pub(crate) reader: R,
    pub(crate) params: DecoderParams,
    pub(crate) state: DecoderState,
    pub(crate) buffers: FrameBuffers,
    pub(crate) layers: LayerDecoders,
    pub(crate) synth: SynthesisFilter,
    pub(crate) ntom: RateConverter,
    pub(crate) window: DecodeWindow,
    pub(crate) index: FrameIndex,
    pub(crate) rows: SubbandRows,
    pub(crate) samples: [Vec<Real>; 2],
    /// Output of the last decoded frame.
    pub(crate) pcm: Vec<u8>,
    /// Bytes of `pcm` already handed out by [`Decoder::read`].
    pub(crate) pcm_read: usize,
}

/// A decoder the caller feeds with input bytes.
pub type FeedDecoder = Decoder<FeedReader>;

impl<R: Reader> Decoder<R> {
    pub fn new(reader: R, params: DecoderParams) -> Result<Self, DecodeError> {
        params.validate()?;

        Ok(Self {
            reader,
            state: DecoderState::default(),
            buffers: FrameBuffers::default(),
            layers: LayerDecoders::default(),
            synth: SynthesisFilter::default(),
            ntom: RateConverter::default(),
            window: DecodeWindow::new(params.gapless),
            index: FrameIndex::new(params.index_size),
            rows: SubbandRows::default(),
            samples: [Vec::new(), Vec::new()],
            pcm: Vec::new(),
            pcm_read: 0,
            params,
        })
    }

    /// Sets the failure level for frame errors.
    ///
    /// - `log::Level::Error`: broken frames are logged and output as silence (default)
    /// - `log::Level::Warn`: broken frames end the stream (strict mode)
    pub fn set_fail_level(&mut self, level: Level) {
        self.state.fail_level = level;
    }

    /// Forgets the track and any sticky error. The reader is kept as it is.
    pub fn reset(&mut self) {
        let fail_level = self.state.fail_level;
        self.state = DecoderState {
            fail_level,
            ..Default::default()
        };
        self.buffers.reset();
        self.synth.reset();
        self.layers.reset();
        self.window.reset();
        self.index.reset();
        self.pcm.clear();
        self.pcm_read = 0;
    }

    pub fn params(&self) -> &DecoderParams {
        &self.params
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn into_reader(self) -> R {
        self.reader
    }

    /// Runs `f` unless an earlier call failed, and remembers its error.
    pub(crate) fn sticky<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        if let Some(err) = &self.state.error {
            return Err(DecodeError::Failed(Box::new(err.clone())));
        }
        let result = f(self);
        if let Err(err) = &result {
            self.state.error = Some(err.clone());
        }
        result
    }

    /// Decodes the next frame. Its PCM is available from [`Decoder::output`].
    pub fn decode_frame(&mut self) -> Result<Status, DecodeError> {
        self.sticky(|d| d.next_output())
    }

    /// Decodes the next frame into `out`, which must hold [`Decoder::outblock`]
    /// bytes. Returns the status and the number of bytes written.
    pub fn decode_frame_into(&mut self, out: &mut [u8]) -> Result<(Status, usize), DecodeError> {
        self.sticky(|d| {
            d.pcm.clear();
            d.pcm_read = 0;
            if let Some(status) = d.pending_frame()? {
                return Ok((status, 0));
            }

            // the frame is read, so `outblock` is that of its format
            if out.len() < d.state.outblock {
                return Err(DecodeError::NoSpace {
                    needed: d.state.outblock,
                    available: out.len(),
                });
            }

            d.render_pending()?;
            let n = d.pcm.len();
            let Some(dest) = out.get_mut(..n) else {
                return Err(DecodeError::NoSpace {
                    needed: n,
                    available: out.len(),
                });
            };
            dest.copy_from_slice(&d.pcm);
            Ok((Status::Ok, n))
        })
    }

    /// PCM of the frame decoded by the last [`Decoder::decode_frame`].
    pub fn output(&self) -> &[u8] {
        &self.pcm
    }

    /// Fills `out` with decoded bytes, decoding as many frames as needed.
    ///
    /// Stops early on [`Status::NewFormat`], [`Status::NeedMore`] and
    /// [`Status::Done`]; the byte count is valid with every status.
    pub fn read(&mut self, out: &mut [u8]) -> Result<(Status, usize), DecodeError> {
        self.sticky(|d| d.copy_out(out))
    }

    /// Output format of the stream, reading the first frame if needed.
    ///
    /// Returns `None` while a feed decoder lacks the data for the first
    /// frame, or for an empty stream. Clears a pending [`Status::NewFormat`].
    pub fn format(&mut self) -> Result<Option<OutputFormat>, DecodeError> {
        self.sticky(|d| {
            if d.init_track()? != Status::Ok {
                return Ok(None);
            }
            d.state.new_format_pending = false;
            Ok(d.state.format)
        })
    }

    /// Number of clipped samples since the last call.
    pub fn clip(&mut self) -> u64 {
        std::mem::take(&mut self.state.clip)
    }

    /// Properties of the current frame.
    pub fn info(&self) -> Option<FrameInfo> {
        self.state
            .header
            .as_ref()
            .map(|h| FrameInfo::new(h, self.state.vbr, self.state.abr_rate))
    }

    pub fn info_tag(&self) -> Option<&InfoTag> {
        self.state.info_tag.as_ref()
    }

    pub fn meta_check(&self) -> MetaFlags {
        self.state.meta
    }

    pub fn meta_clear_new(&mut self) {
        self.state.meta.new_id3 = false;
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            junk_bytes: self.state.junk_bytes,
            resyncs: self.state.resyncs,
        }
    }

    pub fn index(&self) -> &FrameIndex {
        &self.index
    }

    /// Bytes one decoded frame can take in the current format.
    pub fn outblock(&self) -> usize {
        self.state.outblock
    }

    /// Bytes that hold one decoded frame in any format.
    pub fn safe_buffer() -> usize {
        std::mem::size_of::<Real>() * 2 * 1152 * crate::process::ntom::NTOM_MAX as usize
    }

    /// Frames in the track; 0 when unknown.
    pub fn track_frames(&self) -> i64 {
        self.state.track_frames
    }

    /// Track length in output samples, if it can be known or estimated.
    pub fn length(&mut self) -> Result<Option<i64>, DecodeError> {
        self.sticky(|d| {
            if d.init_track()? != Status::Ok {
                return Ok(None);
            }
            let spf = d.state.scale.spf;
            let length = if d.state.track_samples > 0 {
                d.state.track_samples
            } else if d.state.track_frames > 0 {
                d.state.track_frames * spf
            } else if let Some(len) = d.reader.len().filter(|_| d.state.mean_framesize > 0.0) {
                let bytes = len.saturating_sub(d.state.audio_start) as f64;
                (bytes / d.state.mean_framesize * spf as f64) as i64
            } else {
                return Ok(None);
            };

            let outs = d.state.scale.ins2outs(&d.ntom, length);
            Ok(Some(d.window.adjust(outs)))
        })
    }

    /// Reads the whole stream to count frames and samples exactly, then
    /// returns to the current position. Needs a seekable reader.
    pub fn scan(&mut self) -> Result<(), DecodeError> {
        self.sticky(|d| d.scan_track())
    }

    pub(crate) fn scan_track(&mut self) -> Result<(), DecodeError> {
        if !self.reader.is_seekable() {
            return Err(ReadError::NotSeekable.into());
        }
        if self.init_track()? != Status::Ok {
            return Ok(());
        }

        let oldpos = self.tell();
        self.seek_reader_to_frame(0)?;
        let mut frames = 0;
        let mut samples = 0;
        if self.state.num == 0 {
            loop {
                if let Some(header) = &self.state.header {
                    frames += 1;
                    samples += header.spf() as i64;
                }
                match self.read_frame() {
                    Ok(()) => {}
                    Err(Interrupt::End | Interrupt::NeedMore) => break,
                    Err(Interrupt::Fatal(err)) => return Err(err),
                }
            }
        }

        debug!("Scanned {frames} frames, {samples} samples");
        self.state.track_frames = frames;
        self.state.track_samples = samples;
        self.window
            .update_end(samples, &self.state.scale, &self.ntom);
        self.seek_to(oldpos)?;
        Ok(())
    }

    /// Current position in output samples.
    pub fn tell(&self) -> i64 {
        if self.state.num < 0 {
            return 0;
        }

        let scale = &self.state.scale;
        let window = &self.window;
        let remaining = self.remaining_samples();
        let outs = if self.state.num < window.firstframe
            || (self.state.num == window.firstframe && self.state.to_decode)
        {
            scale.frame_outs(&self.ntom, window.firstframe) + window.firstoff
        } else if self.state.to_decode {
            scale.frame_outs(&self.ntom, self.state.num) - remaining
        } else {
            scale.frame_outs(&self.ntom, self.state.num + 1) - remaining
        };

        window.adjust(outs)
    }

    /// Frame that the next output belongs to.
    pub fn tellframe(&self) -> i64 {
        if self.state.num < self.window.firstframe {
            self.window.firstframe
        } else if self.state.to_decode || self.remaining_samples() > 0 {
            self.state.num
        } else {
            self.state.num + 1
        }
    }

    fn remaining_samples(&self) -> i64 {
        match self.state.format {
            Some(format) if format.sample_bytes() > 0 => {
                ((self.pcm.len() - self.pcm_read) / format.sample_bytes()) as i64
            }
            _ => 0,
        }
    }

    /// Seconds per frame.
    pub fn tpf(&self) -> Option<f64> {
        self.state
            .header
            .as_ref()
            .map(|h| h.spf() as f64 / h.sample_rate() as f64)
    }

    /// Frame that starts at `seconds`.
    pub fn timeframe(&self, seconds: f64) -> Option<i64> {
        self.tpf().map(|tpf| (seconds / tpf) as i64)
    }

    pub fn position(&self) -> Option<Position> {
        let tpf = self.tpf()?;
        let frame = self.tellframe();
        let total = if self.state.track_frames > 0 {
            self.state.track_frames
        } else {
            match self.reader.len() {
                Some(len) if self.state.mean_framesize > 0.0 => {
                    (len.saturating_sub(self.state.audio_start) as f64 / self.state.mean_framesize) as i64
                }
                _ => frame,
            }
        };
        let frames_left = (total - frame).max(0);

        Some(Position {
            frame,
            frames_left,
            seconds: frame as f64 * tpf,
            seconds_left: frames_left as f64 * tpf,
        })
    }

    /// Reads the first frame of the track if that has not happened yet.
    pub(crate) fn init_track(&mut self) -> Result<Status, DecodeError> {
        if self.state.num < 0 {
            return self.get_next_frame();
        }
        Ok(Status::Ok)
    }

    fn next_output(&mut self) -> Result<Status, DecodeError> {
        self.pcm.clear();
        self.pcm_read = 0;

        if let Some(status) = self.pending_frame()? {
            return Ok(status);
        }
        self.render_pending()?;
        Ok(Status::Ok)
    }

    /// Reads up to a frame that is ready to render. Returns the status to
    /// report instead when there is none, or its format is new.
    fn pending_frame(&mut self) -> Result<Option<Status>, DecodeError> {
        loop {
            if self.state.to_decode {
                if self.state.new_format_pending {
                    self.state.new_format_pending = false;
                    return Ok(Some(Status::NewFormat));
                }
                return Ok(None);
            }

            match self.get_next_frame()? {
                Status::Ok => {}
                status => return Ok(Some(status)),
            }
        }
    }

    fn render_pending(&mut self) -> Result<(), DecodeError> {
        self.render(true)?;
        self.state.to_decode = false;
        self.state.to_ignore = false;
        self.pcm_read = self.pcm.len();
        Ok(())
    }

    fn copy_out(&mut self, out: &mut [u8]) -> Result<(Status, usize), DecodeError> {
        let mut done = 0;

        loop {
            if self.state.to_decode {
                if self.state.new_format_pending {
                    self.state.new_format_pending = false;
                    return Ok((Status::NewFormat, done));
                }
                self.pcm.clear();
                self.pcm_read = 0;
                self.render(true)?;
                self.state.to_decode = false;
                self.state.to_ignore = false;
            }

            if self.pcm_read < self.pcm.len() {
                let n = (self.pcm.len() - self.pcm_read).min(out.len() - done);
                out[done..done + n].copy_from_slice(&self.pcm[self.pcm_read..self.pcm_read + n]);
                self.pcm_read += n;
                done += n;
                if done == out.len() {
                    return Ok((Status::Ok, done));
                }
            } else {
                match self.get_next_frame()? {
                    Status::Ok => {}
                    status => return Ok((status, done)),
                }
            }
        }
    }

    /// Advances to the next frame that should be decoded.
    pub(crate) fn get_next_frame(&mut self) -> Result<Status, DecodeError> {
        loop {
            loop {
                if self.state.to_ignore
                    && self.state.num < self.window.firstframe
                    && self.state.num >= self.window.ignoreframe
                {
                    trace!("Frame {}: decoding to prime the filter", self.state.num);
                    self.render(false)?;
                    self.state.to_ignore = false;
                }
                self.state.to_ignore = false;
                self.state.to_decode = false;

                match self.read_frame() {
                    Ok(()) => {}
                    Err(Interrupt::NeedMore) => return Ok(Status::NeedMore),
                    Err(Interrupt::End) => {
                        self.state.track_frames = self.state.num + 1;
                        debug!("End of stream after {} frames", self.state.track_frames);
                        return Ok(Status::Done);
                    }
                    Err(Interrupt::Fatal(err)) => return Err(err),
                }

                let spf = self.state.header.as_ref().map_or(0, |h| h.spf() as i64);
                if self.state.header_change > 1 || spf != self.state.scale.spf {
                    self.state.decoder_change = true;
                }
                if self.state.num >= self.window.firstframe {
                    break;
                }
            }

            if self.state.decoder_change {
                self.decode_update()?;
                self.state.decoder_change = false;

                if self.state.fresh {
                    self.state.fresh = false;
                    self.window.realinit(&self.state.scale, &self.ntom);
                    let layer3 = self.is_layer3();
                    self.window
                        .set_frameseek(self.state.num, &self.state.scale, &self.ntom, layer3);
                    if self.state.num < self.window.firstframe {
                        self.state.to_decode = false;
                        continue;
                    }
                }
            }
            break;
        }

        if self.window.lastframe >= 0 && self.state.num > self.window.lastframe {
            self.state.to_decode = false;
            self.state.to_ignore = false;
            return Ok(Status::Done);
        }

        Ok(Status::Ok)
    }

    pub(crate) fn is_layer3(&self) -> bool {
        self.state.header.as_ref().is_some_and(|h| h.layer == Layer::III)
    }

    /// Chooses the output format and configures the synthesis path for the
    /// current header.
    pub(crate) fn decode_update(&mut self) -> Result<(), DecodeError> {
        let Some(header) = self.state.header else {
            return Ok(());
        };

        let native = header.sample_rate();
        let rate = self.params.output_rate(native);
        let format = OutputFormat {
            rate,
            channels: self.params.output_channels(header.channels()),
            encoding: self.params.encoding,
        };

        let mode = if rate == native {
            DownSample::Native
        } else if rate == native >> 1 {
            DownSample::Half
        } else if rate == native >> 2 {
            DownSample::Quarter
        } else {
            self.ntom
                .set_step(native, rate, header.spf(), self.state.num.max(0))?;
            DownSample::NtoM
        };

        let band_limit = match mode {
            DownSample::Native => SBLIMIT,
            DownSample::Half => SBLIMIT / 2,
            DownSample::Quarter => SBLIMIT / 4,
            DownSample::NtoM if native > rate => (SBLIMIT as u64 * rate as u64 / native as u64) as usize,
            DownSample::NtoM => SBLIMIT,
        };
        self.synth.set_band_limit(band_limit);

        self.state.scale = SampleScale {
            mode,
            spf: header.spf() as i64,
        };
        let frame_outs = match mode {
            DownSample::NtoM => self.ntom.max_frame_outs(),
            mode => header.spf() >> mode.shift(),
        };
        self.state.outblock = frame_outs * format.sample_bytes();

        if self.state.format != Some(format) {
            if let Some(old) = self.state.format {
                info!(
                    "Output format changes from {} Hz/{} ch to {} Hz/{} ch at frame {}",
                    old.rate, old.channels, format.rate, format.channels, self.state.num
                );
            }
            self.state.format = Some(format);
            self.state.new_format_pending = true;
        }

        debug!(
            "{} {} {} Hz {}: output {} Hz, {} ch, {:?}, {mode:?}, {band_limit} subbands",
            header.version,
            header.layer,
            native,
            header.mode,
            format.rate,
            format.channels,
            format.encoding,
        );
        Ok(())
    }

    /// Decodes the current frame. With `keep` the result is encoded into
    /// `pcm` and trimmed; otherwise only the filter state advances.
    fn render(&mut self, keep: bool) -> Result<(), DecodeError> {
        let (Some(header), Some(format)) = (self.state.header, self.state.format) else {
            return Ok(());
        };
        let num = self.state.num;
        let ctx = FrameContext {
            fail_level: self.state.fail_level,
            frame: num,
        };

        self.rows.clear();
        let view = self.buffers.current(&header);
        if let Err(err) = self.layers.get(header.layer).decode(&ctx, &view, &mut self.rows) {
            self.rows.clear();
            self.rows.push_silence(rows_per_frame(&header));
            log_or_err!(self.state, Level::Warn, DecodeError::frame(num, err));
        }

        let mode = self.state.scale.mode;
        let [first, second] = &mut self.samples;
        first.clear();
        second.clear();

        let stereo = header.channels() == 2;
        for row in self.rows.rows() {
            match (stereo, self.params.mono) {
                (true, None) => {
                    self.synth.synth(0, &row[0], mode, &mut self.ntom, first);
                    self.synth.synth(1, &row[1], mode, &mut self.ntom, second);
                }
                (true, Some(MonoMode::Mix)) => {
                    let mut mixed = [0.0; SBLIMIT];
                    for (m, (l, r)) in mixed.iter_mut().zip(row[0].iter().zip(row[1].iter())) {
                        *m = (l + r) * 0.5;
                    }
                    self.synth.synth(0, &mixed, mode, &mut self.ntom, first);
                }
                (true, Some(MonoMode::Right)) => {
                    self.synth.synth(0, &row[1], mode, &mut self.ntom, first);
                }
                _ => self.synth.synth(0, &row[0], mode, &mut self.ntom, first),
            }
        }

        if !keep {
            return Ok(());
        }

        let rendered = [first.as_slice(), second.as_slice()];
        let synthesized = if second.is_empty() { 1 } else { 2 };
        self.state.clip += pcm::encode(
            &rendered[..synthesized],
            format.channels,
            format.encoding,
            &mut self.pcm,
        );
        self.window.trim(num, &mut self.pcm, format.sample_bytes());
        Ok(())
    }
}

impl FeedDecoder {
    /// A decoder that takes its input from [`FeedDecoder::feed`].
    pub fn new_feed(params: DecoderParams) -> Result<Self, DecodeError> {
        Decoder::new(FeedReader::new(), params)
    }

    pub fn feed(&mut self, input: &[u8]) {
        self.reader.feed(input);
    }

    /// Declares the end of input, so the decoder reports [`Status::Done`]
    /// instead of [`Status::NeedMore`].
    pub fn finish(&mut self) {
        self.reader.finish();
    }

    /// Feeds `input` and fills `out` like [`Decoder::read`].
    pub fn decode(&mut self, input: &[u8], out: &mut [u8]) -> Result<(Status, usize), DecodeError> {
        self.feed(input);
        self.read(out)
    }
}
