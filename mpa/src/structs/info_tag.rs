//! Xing/Info header and LAME extension carried in the first Layer III frame.
//!
//! The tag sits where the side information would start, after a run of zero
//! bytes whose length depends on version and channel count. The frame holding
//! it carries no audio.
//!
//! ## Layout after the magic
//!
//! - **Flags** (32 bits): frames, bytes, TOC, quality
//! - **Frames**, **Bytes** (32 bits each), **TOC** (100 bytes), **Quality** (32 bits)
//! - **LAME extension** (optional): encoder string, revision/VBR method, lowpass,
//!   peak, radio/audiophile replay gain, flags, ABR rate, delay/padding (12+12 bits)

use anyhow::Result;
use log::{debug, trace};

use crate::process::gapless::GAPLESS_DELAY;
use crate::structs::header::{FrameHeader, VbrMode};
use crate::utils::bitstream_io::BsIoSliceReader;

/// Frame counts above this are treated as garbage.
const TRACK_MAX_FRAMES: u32 = u32::MAX / 4 / 1152;

/// Classic Xing header length that must fit after the offset.
const XING_MIN_BYTES: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// "Xing", always VBR.
    Xing,
    /// "Info", written for CBR files.
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LameExtension {
    pub encoder: String,
    pub revision: u8,
    pub vbr_method: u8,
    /// Lowpass frequency in Hz.
    pub lowpass: u32,
    pub peak: u32,
    pub radio_gain: Option<f32>,
    pub audiophile_gain: Option<f32>,
    pub flags: u8,
    pub abr_rate: u8,
    /// Encoder delay in samples.
    pub delay: u16,
    /// Encoder padding in samples.
    pub padding: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoTag {
    pub kind: TagKind,
    pub frames: Option<u32>,
    pub bytes: Option<u32>,
    pub toc: Option<Vec<u8>>,
    pub quality: Option<u32>,
    pub lame: Option<LameExtension>,
}

impl InfoTag {
    /// Byte offset of the magic inside the frame body: right after the side information.
    pub fn offset(header: &FrameHeader) -> usize {
        header.side_info_size()
    }

    /// Looks for a tag in the body of a Layer III frame.
    pub fn parse(header: &FrameHeader, body: &[u8]) -> Result<Option<Self>> {
        let offset = Self::offset(header);
        if body.len() < XING_MIN_BYTES + offset {
            return Ok(None);
        }
        // Only the CRC word may be non-zero before the magic.
        let crc = if header.protected { 2 } else { 0 };
        if body[crc..offset].iter().any(|&b| b != 0) {
            return Ok(None);
        }

        let kind = match &body[offset..offset + 4] {
            b"Xing" => TagKind::Xing,
            b"Info" => TagKind::Info,
            _ => return Ok(None),
        };

        let mut reader = BsIoSliceReader::from_slice(&body[offset + 4..]);
        let flags: u32 = reader.get_n(32)?;
        trace!("Xing flags {flags:#010X}");

        let frames = if flags & 1 != 0 {
            let frames: u32 = reader.get_n(32)?;
            (frames <= TRACK_MAX_FRAMES).then_some(frames)
        } else {
            None
        };
        let bytes = if flags & 2 != 0 {
            Some(reader.get_n::<u32>(32)?)
        } else {
            None
        };
        let toc = if flags & 4 != 0 {
            let mut toc = Vec::with_capacity(100);
            for _ in 0..100 {
                toc.push(reader.get_n::<u8>(8)?);
            }
            Some(toc)
        } else {
            None
        };
        let quality = if flags & 8 != 0 {
            Some(reader.get_n::<u32>(32)?)
        } else {
            None
        };

        let lame = LameExtension::read(&mut reader)?;

        Ok(Some(Self {
            kind,
            frames,
            bytes,
            toc,
            quality,
            lame,
        }))
    }

    pub fn vbr_mode(&self) -> VbrMode {
        match self.lame.as_ref().map(|l| l.vbr_method) {
            Some(1 | 8) => VbrMode::Cbr,
            Some(2 | 9) => VbrMode::Abr,
            Some(_) => VbrMode::Vbr,
            None if self.kind == TagKind::Xing => VbrMode::Vbr,
            None => VbrMode::Cbr,
        }
    }

    pub fn abr_rate(&self) -> u32 {
        match (&self.lame, self.vbr_mode()) {
            (Some(lame), VbrMode::Abr) => lame.abr_rate as u32,
            _ => 0,
        }
    }

    /// Gapless window `(begin, end)` in native samples, given the samples per frame.
    pub fn gapless_range(&self, spf: usize) -> Option<(i64, i64)> {
        let length = self.frames.map_or(0, |f| f as i64 * spf as i64);
        if length <= 1 {
            return None;
        }

        match &self.lame {
            Some(lame) => {
                let begin = GAPLESS_DELAY + lame.delay as i64;
                let skip_end = lame.padding as i64 - GAPLESS_DELAY;
                let end = if skip_end < length {
                    length - skip_end
                } else {
                    length
                };
                debug!("Gapless from LAME tag: delay {}, padding {}", lame.delay, lame.padding);
                Some((begin, end))
            }
            None => Some((GAPLESS_DELAY, length + GAPLESS_DELAY)),
        }
    }
}

impl LameExtension {
    fn read(reader: &mut BsIoSliceReader) -> Result<Option<Self>> {
        // 9 encoder bytes + 27 bytes of fields up to and including delay/padding
        if reader.available()? < 36 * 8 {
            return Ok(None);
        }

        let mut encoder = [0u8; 9];
        for b in encoder.iter_mut() {
            *b = reader.get_n(8)?;
        }
        if encoder[0] == 0 {
            return Ok(None);
        }
        let encoder = String::from_utf8_lossy(&encoder)
            .trim_end_matches(['\0', ' '])
            .to_string();

        let revision = reader.get_n(4)?;
        let vbr_method = reader.get_n(4)?;
        let lowpass = reader.get_n::<u32>(8)? * 100;
        let peak = reader.get_n(32)?;
        let radio_gain = read_replay_gain(reader, 1)?;
        let audiophile_gain = read_replay_gain(reader, 2)?;
        let flags = reader.get_n(8)?;
        let abr_rate = reader.get_n(8)?;
        let delay = reader.get_n(12)?;
        let padding = reader.get_n(12)?;

        Ok(Some(Self {
            encoder,
            revision,
            vbr_method,
            lowpass,
            peak,
            radio_gain,
            audiophile_gain,
            flags,
            abr_rate,
            delay,
            padding,
        }))
    }
}

/// 3 bits name, 3 bits originator, sign, 9 bits of tenths of a dB.
fn read_replay_gain(reader: &mut BsIoSliceReader, expect_name: u8) -> Result<Option<f32>> {
    let name: u8 = reader.get_n(3)?;
    let origin: u8 = reader.get_n(3)?;
    let negative = reader.get()?;
    let value: u16 = reader.get_n(9)?;

    if name != expect_name || origin == 0 {
        return Ok(None);
    }
    let db = value as f32 / 10.0;
    Ok(Some(if negative { -db } else { db }))
}
