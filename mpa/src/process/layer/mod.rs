//! Layer bit unpacking: frame body to subband samples.
//!
//! Each layer decoder reads the body of one frame and appends rows of 32
//! subband samples per channel to [`SubbandRows`]. The rows are then fed to
//! the synthesis filter in order.
//!
//! - **Layer I**: 12 rows per frame
//! - **Layer II**: 36 rows per frame (12 granules of 3 samples)
//! - **Layer III**: 18 rows per granule, 2 granules (MPEG-1) or 1 (MPEG-2/2.5)

use anyhow::{Result, bail};
use log::Level;

use crate::process::synth::{Real, SBLIMIT};
use crate::structs::header::{FrameHeader, Layer};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::crc::MPEG_CRC;
use crate::utils::errors::FrameError;

pub mod layer1;
pub mod layer2;
pub mod layer3;
pub mod tables;

/// One row of subband samples for both channels.
pub type SubbandRow = [[Real; SBLIMIT]; 2];

/// What the layer decoders need to know about the frame being decoded.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub header: &'a FrameHeader,
    /// Main data carried over from earlier frames, oldest byte first.
    pub reservoir: &'a [u8],
    /// Frame bytes after the 4-byte header.
    pub body: &'a [u8],
}

/// Error policy for the frame being decoded.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    pub fail_level: Level,
    pub frame: i64,
}

#[derive(Debug, Clone, Default)]
pub struct SubbandRows {
    rows: Vec<SubbandRow>,
}

impl SubbandRows {
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Appends a zeroed row and returns it.
    pub fn push(&mut self) -> &mut SubbandRow {
        self.rows.push([[0.0; SBLIMIT]; 2]);
        let last = self.rows.len() - 1;
        &mut self.rows[last]
    }

    pub fn push_silence(&mut self, count: usize) {
        self.rows
            .extend(std::iter::repeat_n([[0.0; SBLIMIT]; 2], count));
    }

    pub fn row_mut(&mut self, index: usize) -> &mut SubbandRow {
        &mut self.rows[index]
    }

    pub fn rows(&self) -> &[SubbandRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub trait LayerDecoder {
    /// Appends the subband rows of one frame.
    fn decode(
        &mut self,
        ctx: &FrameContext,
        frame: &FrameView,
        rows: &mut SubbandRows,
    ) -> Result<()>;
}

/// Subband rows a frame of this header yields.
pub fn rows_per_frame(header: &FrameHeader) -> usize {
    header.spf() / SBLIMIT
}

/// The decoders for all three layers.
#[derive(Debug, Default)]
pub struct LayerDecoders {
    layer1: layer1::Layer1Decoder,
    layer2: layer2::Layer2Decoder,
    layer3: layer3::Layer3Decoder,
}

impl LayerDecoders {
    pub fn get(&mut self, layer: Layer) -> &mut dyn LayerDecoder {
        match layer {
            Layer::I => &mut self.layer1,
            Layer::II => &mut self.layer2,
            Layer::III => &mut self.layer3,
        }
    }

    /// Forgets state carried between frames.
    pub fn reset(&mut self) {
        self.layer3.reset();
    }
}

/// Verifies the CRC word of a protected frame. A mismatch fails the frame,
/// which is then output as silence or ends the stream in strict mode.
///
/// `bits` protected bits follow the CRC word in `reader`'s slice, which must
/// start at the first body byte.
pub(crate) fn check_crc(header: &FrameHeader, reader: &mut BsIoSliceReader, bits: u64) -> Result<()> {
    if !header.protected {
        return Ok(());
    }

    let position = reader.position()?;
    reader.seek(-(position as i64))?;
    let stored: u16 = reader.get_n(16)?;
    reader.seek(position as i64 - 16)?;

    let prefix = MPEG_CRC.update(MPEG_CRC.init, &header.crc_prefix());
    let calculated = reader.crc16_check(&MPEG_CRC, prefix, 16, bits)?;
    if stored != calculated {
        bail!(FrameError::CrcMismatch { stored, calculated });
    }

    Ok(())
}
