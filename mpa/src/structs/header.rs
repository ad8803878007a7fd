//! Frame header decoding and derived frame geometry.
//!
//! ## Layout
//!
//! ```text
//! AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
//! ```
//!
//! **A** sync (11 bits), **B** version, **C** layer, **D** protection (0 = CRC
//! follows), **E** bitrate index, **F** sampling frequency index, **G**
//! padding, **H** private, **I** channel mode, **J** mode extension, **K**
//! copyright, **L** original, **M** emphasis.
//!
//! ## Frame Size
//!
//! `framesize` is the body length after the 4-byte header:
//!
//! - Layer I: `((bitrate*12000/rate)+padding)*4 - 4`
//! - Layer II: `bitrate*144000/rate + padding - 4`
//! - Layer III: `bitrate*144000/(rate<<lsf) + padding - 4`

use std::fmt::{Display, Formatter};

use crate::utils::errors::HeaderError;

/// Largest accepted frame body. Bigger values only come from corrupt headers.
pub const MAX_FRAME_SIZE: usize = 1792;

pub const HDR_SYNC: u32 = 0xFFE0_0000;

/// Fields that must agree between a candidate header and the one following it:
/// sync, version, layer, sampling frequency and the private bit.
pub const HDR_CMP_MASK: u32 = 0xFFFE_0D00;

const HDR_SAMPLERATE: u32 = 0x0000_0C00;

/// Sampling frequencies indexed by `sampling_index`.
pub const FREQS: [u32; 9] = [44100, 48000, 32000, 22050, 24000, 16000, 11025, 12000, 8000];

/// Bitrates in kbit/s, `[lsf][layer - 1][bitrate_index]`.
pub const BITRATES: [[[u16; 16]; 3]; 2] = [
    [
        [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0],
        [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0],
        [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0],
    ],
    [
        [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0],
        [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
        [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
    ],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    I = 1,
    II = 2,
    III = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::Mpeg1 => write!(f, "MPEG-1"),
            Version::Mpeg2 => write!(f, "MPEG-2"),
            Version::Mpeg25 => write!(f, "MPEG-2.5"),
        }
    }
}

impl Display for Layer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::I => write!(f, "Layer I"),
            Layer::II => write!(f, "Layer II"),
            Layer::III => write!(f, "Layer III"),
        }
    }
}

impl Display for ChannelMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelMode::Stereo => write!(f, "Stereo"),
            ChannelMode::JointStereo => write!(f, "Joint Stereo"),
            ChannelMode::DualChannel => write!(f, "Dual Channel"),
            ChannelMode::Mono => write!(f, "Mono"),
        }
    }
}

/// Cheap validity test applied while hunting for sync.
#[inline]
pub fn head_check(head: u32) -> bool {
    (head & HDR_SYNC) == HDR_SYNC
        && (head >> 19) & 3 != 1
        && (head >> 17) & 3 != 0
        && (head >> 12) & 0xF != 0xF
        && (head >> 12) & 0xF != 0
        && (head >> 10) & 3 != 3
}

/// Bitrate index 0 with otherwise sane fields.
#[inline]
pub fn is_free_format(head: u32) -> bool {
    (head & HDR_SYNC) == HDR_SYNC && (head >> 12) & 0xF == 0
}

/// Classifies how much the stream layout changed between two headers.
///
/// Returns 1 when sampling frequency and the mono/stereo split agree, 2
/// otherwise (including when there is no previous header).
pub fn header_change(old: Option<u32>, new: u32) -> u8 {
    match old {
        Some(old)
            if (old & HDR_SAMPLERATE) == (new & HDR_SAMPLERATE)
                && (((old >> 6) & 3) == 3) == (((new >> 6) & 3) == 3) =>
        {
            1
        }
        _ => 2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub raw: u32,
    pub version: Version,
    pub layer: Layer,
    /// CRC word follows the header.
    pub protected: bool,
    pub bitrate_index: u8,
    /// Index into [`FREQS`].
    pub sampling_index: u8,
    pub padding: bool,
    pub private: bool,
    pub mode: ChannelMode,
    pub mode_ext: u8,
    pub copyright: bool,
    pub original: bool,
    pub emphasis: u8,
    /// Body bytes following the 4-byte header.
    pub framesize: usize,
}

impl FrameHeader {
    pub fn parse(head: u32) -> Result<Self, HeaderError> {
        if head & HDR_SYNC != HDR_SYNC || (head >> 19) & 3 == 1 {
            return Err(HeaderError::InvalidSync(head));
        }

        let layer = match (head >> 17) & 3 {
            3 => Layer::I,
            2 => Layer::II,
            1 => Layer::III,
            _ => return Err(HeaderError::ReservedLayer(head)),
        };

        let bitrate_index = ((head >> 12) & 0xF) as u8;
        match bitrate_index {
            0 => return Err(HeaderError::FreeFormat),
            15 => return Err(HeaderError::InvalidBitrate(head)),
            _ => {}
        }

        let sf = (head >> 10) & 3;
        if sf == 3 {
            return Err(HeaderError::ReservedSamplingFrequency(head));
        }

        let version = match (head >> 19) & 3 {
            3 => Version::Mpeg1,
            2 => Version::Mpeg2,
            _ => Version::Mpeg25,
        };
        let sampling_index = match version {
            Version::Mpeg1 => sf,
            Version::Mpeg2 => sf + 3,
            Version::Mpeg25 => sf + 6,
        } as u8;

        let mode = match (head >> 6) & 3 {
            0 => ChannelMode::Stereo,
            1 => ChannelMode::JointStereo,
            2 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        };

        let mut header = Self {
            raw: head,
            version,
            layer,
            protected: (head >> 16) & 1 == 0,
            bitrate_index,
            sampling_index,
            padding: (head >> 9) & 1 == 1,
            private: (head >> 8) & 1 == 1,
            mode,
            mode_ext: ((head >> 4) & 3) as u8,
            copyright: (head >> 3) & 1 == 1,
            original: (head >> 2) & 1 == 1,
            emphasis: (head & 3) as u8,
            framesize: 0,
        };

        let framesize = header.compute_framesize();
        if framesize > MAX_FRAME_SIZE {
            return Err(HeaderError::FrameTooLarge(framesize));
        }
        header.framesize = framesize;

        Ok(header)
    }

    fn compute_framesize(&self) -> usize {
        let bitrate = self.bitrate() as usize;
        let rate = self.sample_rate() as usize;
        let padding = self.padding as usize;

        match self.layer {
            Layer::I => ((bitrate * 12000 / rate + padding) << 2) - 4,
            Layer::II => bitrate * 144000 / rate + padding - 4,
            Layer::III => bitrate * 144000 / (rate << self.lsf() as usize) + padding - 4,
        }
    }

    /// MPEG-2 and MPEG-2.5 use the low sampling frequency tables.
    #[inline]
    pub fn lsf(&self) -> bool {
        self.version != Version::Mpeg1
    }

    #[inline]
    pub fn channels(&self) -> usize {
        if self.mode == ChannelMode::Mono { 1 } else { 2 }
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        FREQS[self.sampling_index as usize]
    }

    /// Bitrate in kbit/s.
    #[inline]
    pub fn bitrate(&self) -> u32 {
        BITRATES[self.lsf() as usize][self.layer as usize - 1][self.bitrate_index as usize] as u32
    }

    /// Samples per frame and channel.
    #[inline]
    pub fn spf(&self) -> usize {
        match self.layer {
            Layer::I => 384,
            Layer::II => 1152,
            Layer::III if self.lsf() => 576,
            Layer::III => 1152,
        }
    }

    /// Layer III side information length in bytes, including the CRC word.
    pub fn side_info_size(&self) -> usize {
        let base = match (self.lsf(), self.channels()) {
            (true, 1) => 9,
            (true, _) => 17,
            (false, 1) => 17,
            (false, _) => 32,
        };
        base + if self.protected { 2 } else { 0 }
    }

    /// First subband shared by both channels in intensity/joint stereo (Layer I/II).
    pub fn jsbound(&self) -> usize {
        match self.mode {
            ChannelMode::JointStereo if self.layer != Layer::III => {
                ((self.mode_ext as usize) << 2) + 4
            }
            _ => 32,
        }
    }

    /// Whole frame length in bytes including the header.
    #[inline]
    pub fn frame_bytes(&self) -> usize {
        self.framesize + 4
    }

    /// Last two header bytes, the start of the CRC-protected region.
    #[inline]
    pub fn crc_prefix(&self) -> [u8; 2] {
        [(self.raw >> 8) as u8, self.raw as u8]
    }
}

/// Snapshot of the current frame's header properties.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
    pub version: Version,
    pub layer: Layer,
    pub rate: u32,
    pub mode: ChannelMode,
    pub mode_ext: u8,
    /// Whole frame length including the header.
    pub framesize: usize,
    pub crc: bool,
    pub copyright: bool,
    pub private: bool,
    pub original: bool,
    pub emphasis: u8,
    /// kbit/s of the current frame.
    pub bitrate: u32,
    /// Target rate of ABR encodes, 0 if unknown.
    pub abr_rate: u32,
    pub vbr: VbrMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VbrMode {
    #[default]
    Cbr,
    Vbr,
    Abr,
}

impl Display for VbrMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VbrMode::Cbr => write!(f, "CBR"),
            VbrMode::Vbr => write!(f, "VBR"),
            VbrMode::Abr => write!(f, "ABR"),
        }
    }
}

impl FrameInfo {
    pub(crate) fn new(header: &FrameHeader, vbr: VbrMode, abr_rate: u32) -> Self {
        Self {
            version: header.version,
            layer: header.layer,
            rate: header.sample_rate(),
            mode: header.mode,
            mode_ext: header.mode_ext,
            framesize: header.frame_bytes(),
            crc: header.protected,
            copyright: header.copyright,
            private: header.private,
            original: header.original,
            emphasis: header.emphasis,
            bitrate: header.bitrate(),
            abr_rate,
            vbr,
        }
    }
}
