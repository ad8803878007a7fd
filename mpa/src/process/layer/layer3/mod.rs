//! Layer III decoding.
//!
//! Per granule and channel:
//!
//! 1. **Main data**: side information locates the granule in the bit
//!    reservoir, which may reach back up to 511 bytes into earlier frames
//! 2. **Spectrum**: scale factors and Huffman coded values are read and
//!    requantized into 576 frequency lines ([`spectrum`])
//! 3. **Stereo**: joint stereo frames undo M/S and intensity coding
//! 4. **Hybrid filterbank**: short blocks are reordered, then alias
//!    reduction and the IMDCT give 18 samples per subband ([`hybrid`])
//!
//! The result is written as 18 subband rows for the synthesis filter.

use anyhow::{Result, bail};
use log::{Level, debug, trace};

use crate::log_or_err;
use crate::process::layer::{FrameContext, FrameView, LayerDecoder, SubbandRows, check_crc};
use crate::process::synth::SBLIMIT;
use crate::structs::header::{ChannelMode, FrameHeader, MAX_FRAME_SIZE};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::FrameError;

pub mod huffman;
pub mod hybrid;
pub mod scalefactors;
pub mod spectrum;
pub mod tables;

use hybrid::{Hybrid, antialias};
use scalefactors::{ScaleFactors, read_lsf, read_mpeg1};
use spectrum::{Band, LINES, Spectrum, bands, joint_stereo, read_values, reorder, requantize};

/// Largest `main_data_begin` (9 bits), and so the most main data kept between frames.
pub const MAX_RESERVOIR: usize = 511;

const ROWS_PER_GRANULE: usize = 18;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GranuleChannel {
    pub part2_3_length: u16,
    pub big_values: u16,
    pub global_gain: u8,
    pub scalefac_compress: u16,
    pub window_switching: bool,
    pub block_type: u8,
    pub mixed_block: bool,
    pub table_select: [u8; 3],
    pub subblock_gain: [u8; 3],
    pub region0_count: u8,
    pub region1_count: u8,
    pub preflag: bool,
    pub scalefac_scale: bool,
    pub count1table_select: bool,
}

impl GranuleChannel {
    fn read(reader: &mut BsIoSliceReader, lsf: bool, gr: usize, ch: usize) -> Result<Self> {
        let mut gc = Self {
            part2_3_length: reader.get_n(12)?,
            big_values: reader.get_n(9)?,
            global_gain: reader.get_n(8)?,
            scalefac_compress: reader.get_n(if lsf { 9 } else { 4 })?,
            window_switching: reader.get()?,
            ..Default::default()
        };

        if gc.big_values > 288 {
            bail!(FrameError::BigValuesTooLarge(gc.big_values as u32));
        }

        if gc.window_switching {
            gc.block_type = reader.get_n(2)?;
            if gc.block_type == 0 {
                bail!(FrameError::ReservedBlockType { gr, ch });
            }
            gc.mixed_block = reader.get()?;
            for t in gc.table_select.iter_mut().take(2) {
                *t = reader.get_n(5)?;
            }
            for g in gc.subblock_gain.iter_mut() {
                *g = reader.get_n(3)?;
            }
            // implicit region boundaries
            gc.region0_count = if gc.block_type == 2 && !gc.mixed_block { 8 } else { 7 };
            gc.region1_count = 36;
        } else {
            for t in gc.table_select.iter_mut() {
                *t = reader.get_n(5)?;
            }
            gc.region0_count = reader.get_n(4)?;
            gc.region1_count = reader.get_n(3)?;
        }

        gc.preflag = if lsf {
            gc.scalefac_compress >= 500
        } else {
            reader.get()?
        };
        gc.scalefac_scale = reader.get()?;
        gc.count1table_select = reader.get()?;

        Ok(gc)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideInfo {
    /// Bytes of main data taken from before this frame's side information.
    pub main_data_begin: usize,
    pub private_bits: u8,
    pub scfsi: [[bool; 4]; 2],
    pub granules: Vec<[GranuleChannel; 2]>,
}

impl SideInfo {
    /// Reads the side information. `reader` starts after the CRC word, if any.
    pub fn read(header: &FrameHeader, reader: &mut BsIoSliceReader) -> Result<Self> {
        let lsf = header.lsf();
        let channels = header.channels();

        let main_data_begin = reader.get_n::<u16>(if lsf { 8 } else { 9 })? as usize;
        let private_bits = reader.get_n(match (lsf, channels) {
            (false, 1) => 5,
            (false, _) => 3,
            (true, 1) => 1,
            (true, _) => 2,
        })?;

        let mut scfsi = [[false; 4]; 2];
        if !lsf {
            for band in scfsi.iter_mut().take(channels) {
                for flag in band.iter_mut() {
                    *flag = reader.get()?;
                }
            }
        }

        let granule_count = if lsf { 1 } else { 2 };
        let mut granules = Vec::with_capacity(granule_count);
        for gr in 0..granule_count {
            let mut granule = [GranuleChannel::default(); 2];
            for (ch, gc) in granule.iter_mut().enumerate().take(channels) {
                *gc = GranuleChannel::read(reader, lsf, gr, ch)?;
            }
            granules.push(granule);
        }

        Ok(Self {
            main_data_begin,
            private_bits,
            scfsi,
            granules,
        })
    }

    /// Main data bits the granules claim.
    pub fn main_data_bits(&self, channels: usize) -> u64 {
        self.granules
            .iter()
            .flat_map(|g| g.iter().take(channels))
            .map(|gc| gc.part2_3_length as u64)
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct Layer3Decoder {
    side_info: SideInfo,
    main_data: Vec<u8>,
    /// Last granule's scale factors per channel.
    scalefactors: [ScaleFactors; 2],
    values: Box<[[i32; LINES]; 2]>,
    spectrum: Box<[Spectrum; 2]>,
    hybrid: Hybrid,
}

impl Default for Layer3Decoder {
    fn default() -> Self {
        Self {
            side_info: SideInfo::default(),
            main_data: Vec::with_capacity(MAX_RESERVOIR + MAX_FRAME_SIZE),
            scalefactors: [ScaleFactors::default(); 2],
            values: Box::new([[0; LINES]; 2]),
            spectrum: Box::new([[0.0; LINES]; 2]),
            hybrid: Hybrid::new(),
        }
    }
}

impl Layer3Decoder {
    pub fn side_info(&self) -> &SideInfo {
        &self.side_info
    }

    /// Drops the IMDCT overlap, as after a seek.
    pub fn reset(&mut self) {
        self.hybrid.reset();
    }

    /// Decodes one granule from `reader`, positioned at its main data, and
    /// appends its 18 rows.
    fn decode_granule(
        &mut self,
        header: &FrameHeader,
        gr: usize,
        reader: &mut BsIoSliceReader,
        rows: &mut SubbandRows,
    ) -> Result<()> {
        let channels = header.channels();
        let joint = channels == 2 && header.mode == ChannelMode::JointStereo;
        let granule = self.side_info.granules[gr];
        let mut layouts: [Vec<Band>; 2] = Default::default();

        for (ch, gc) in granule.iter().enumerate().take(channels) {
            let end = reader.position()? + gc.part2_3_length as u64;
            self.scalefactors[ch] = if header.lsf() {
                read_lsf(reader, gc, ch == 1 && joint && header.mode_ext & 1 != 0)?
            } else {
                read_mpeg1(reader, gc, &self.side_info.scfsi[ch], gr, &self.scalefactors[ch])?
            };

            let position = reader.position()?;
            if position > end {
                bail!(FrameError::HuffmanOverrun { bits: position - end });
            }

            let nonzero = read_values(reader, header, gc, end, &mut self.values[ch])?;
            layouts[ch] = bands(header.sampling_index as usize, gc);
            requantize(
                gc,
                &self.scalefactors[ch],
                &layouts[ch],
                &self.values[ch],
                nonzero,
                &mut self.spectrum[ch],
            );
        }

        if joint {
            joint_stereo(header, &layouts[1], &self.scalefactors[1], &mut self.spectrum);
        }

        let base = rows.len();
        rows.push_silence(ROWS_PER_GRANULE);
        for (ch, gc) in granule.iter().enumerate().take(channels) {
            let xr = &mut self.spectrum[ch];
            reorder(&layouts[ch], xr);
            antialias(gc, xr);
            self.hybrid.transform(ch, gc, xr);

            for t in 0..ROWS_PER_GRANULE {
                let row = rows.row_mut(base + t);
                for sb in 0..SBLIMIT {
                    row[ch][sb] = xr[sb * ROWS_PER_GRANULE + t];
                }
            }
        }
        Ok(())
    }
}

impl LayerDecoder for Layer3Decoder {
    fn decode(
        &mut self,
        ctx: &FrameContext,
        frame: &FrameView,
        rows: &mut SubbandRows,
    ) -> Result<()> {
        let header = frame.header;
        let channels = header.channels();
        let side_info_size = header.side_info_size();
        if frame.body.len() < side_info_size {
            bail!(FrameError::MainDataOverrun {
                needed: side_info_size as u64 * 8,
                available: frame.body.len() as u64 * 8,
            });
        }

        let mut reader = BsIoSliceReader::from_slice(frame.body);
        let crc_bits = if header.protected { 16 } else { 0 };
        reader.skip_n(crc_bits)?;
        let side_info = SideInfo::read(header, &mut reader)?;
        check_crc(header, &mut reader, (side_info_size as u64 * 8) - crc_bits as u64)?;
        trace!("Frame {}: {:?}", ctx.frame, side_info);

        let granules = side_info.granules.len();
        let main_data_begin = side_info.main_data_begin;
        let own = &frame.body[side_info_size..];
        let needed = side_info.main_data_bits(channels);
        self.side_info = side_info;

        if main_data_begin > frame.reservoir.len() {
            // expected for the first frames after a seek or resync
            debug!(
                "Frame {}: {}",
                ctx.frame,
                FrameError::ReservoirUnderflow {
                    wanted: main_data_begin,
                    available: frame.reservoir.len(),
                }
            );
            rows.push_silence(granules * ROWS_PER_GRANULE);
            return Ok(());
        }

        let available = ((main_data_begin + own.len()) * 8) as u64;
        if needed > available {
            log_or_err!(
                ctx,
                Level::Warn,
                FrameError::MainDataOverrun { needed, available }
            );
            rows.push_silence(granules * ROWS_PER_GRANULE);
            return Ok(());
        }

        let mut main_data = std::mem::take(&mut self.main_data);
        main_data.clear();
        main_data.extend_from_slice(&frame.reservoir[frame.reservoir.len() - main_data_begin..]);
        main_data.extend_from_slice(own);

        let mut reader = BsIoSliceReader::from_slice(&main_data);
        let decoded = (0..granules).try_for_each(|gr| self.decode_granule(header, gr, &mut reader, rows));
        self.main_data = main_data;
        decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::{BitWriter, L3_LSF_MONO, L3_MONO};
    use std::f64::consts::PI;

    fn ctx(fail_level: Level) -> FrameContext {
        FrameContext {
            fail_level,
            frame: 3,
        }
    }

    fn write_granule(w: &mut BitWriter, part2_3_length: u32, big_values: u32, lsf: bool) {
        w.put(part2_3_length, 12);
        w.put(big_values, 9);
        w.put(210, 8);
        w.put(0, if lsf { 9 } else { 4 });
        w.put(0, 1); // no window switching
        w.put(0, 15 + 4 + 3);
        w.put(0, if lsf { 2 } else { 3 });
    }

    fn stereo_frame(main_data_begin: u32, part2_3_length: u32, big_values: u32) -> (FrameHeader, Vec<u8>) {
        let header = FrameHeader::parse(0xFFFB_9044).expect("valid header");
        let mut w = BitWriter::default();
        w.put(main_data_begin, 9);
        w.put(0, 3);
        w.put(0, 8);
        for _ in 0..4 {
            write_granule(&mut w, part2_3_length, big_values, false);
        }
        (header, w.finish(header.framesize))
    }

    #[test]
    fn side_info_fields() -> anyhow::Result<()> {
        let (header, body) = stereo_frame(100, 500, 120);
        let mut reader = BsIoSliceReader::from_slice(&body);
        let si = SideInfo::read(&header, &mut reader)?;

        assert_eq!(reader.position()?, 256);
        assert_eq!(si.main_data_begin, 100);
        assert_eq!(si.granules.len(), 2);
        assert_eq!(si.granules[1][1].big_values, 120);
        assert_eq!(si.granules[0][0].global_gain, 210);
        assert_eq!(si.main_data_bits(2), 2000);
        Ok(())
    }

    #[test]
    fn lsf_mono_side_info_size() -> anyhow::Result<()> {
        let header = FrameHeader::parse(0xFFF3_80C4)?;
        let mut w = BitWriter::default();
        w.put(0, 8);
        w.put(0, 1);
        write_granule(&mut w, 0, 0, true);
        let body = w.finish(header.framesize);

        let mut reader = BsIoSliceReader::from_slice(&body);
        let si = SideInfo::read(&header, &mut reader)?;
        assert_eq!(reader.position()?, 72);
        assert_eq!(si.granules.len(), 1);
        Ok(())
    }

    #[test]
    fn rejects_invalid_side_info() -> anyhow::Result<()> {
        let (header, body) = stereo_frame(0, 0, 300);
        let mut reader = BsIoSliceReader::from_slice(&body);
        let err = SideInfo::read(&header, &mut reader).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FrameError>(),
            Some(&FrameError::BigValuesTooLarge(300))
        );

        let mut w = BitWriter::default();
        w.put(0, 9 + 3 + 8 + 12 + 9 + 8 + 4);
        w.put(1, 1); // window switching
        w.put(0, 2); // block_type 0
        let body = w.finish(header.framesize);
        let mut reader = BsIoSliceReader::from_slice(&body);
        let err = SideInfo::read(&header, &mut reader).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FrameError>(),
            Some(&FrameError::ReservedBlockType { gr: 0, ch: 0 })
        );
        Ok(())
    }

    #[test]
    fn reservoir_accounting() -> anyhow::Result<()> {
        let mut decoder = Layer3Decoder::default();
        let mut rows = SubbandRows::default();

        // needs 100 bytes from earlier frames, none kept
        let (header, body) = stereo_frame(100, 0, 0);
        let view = FrameView {
            header: &header,
            reservoir: &[],
            body: &body,
        };
        decoder.decode(&ctx(Level::Warn), &view, &mut rows)?;
        assert_eq!(rows.len(), 36);
        assert!(rows.rows().iter().flatten().flatten().all(|&x| x == 0.0));

        // 4 * 1000 bits do not fit into 417 - 36 bytes
        let (header, body) = stereo_frame(0, 1000, 0);
        let view = FrameView {
            header: &header,
            reservoir: &[],
            body: &body,
        };
        rows.clear();
        decoder.decode(&ctx(Level::Error), &view, &mut rows)?;
        assert_eq!(rows.len(), 36);
        assert!(decoder.decode(&ctx(Level::Warn), &view, &mut rows).is_err());

        // with enough reservoir it is fine
        let reservoir = [0u8; 200];
        let view = FrameView {
            header: &header,
            reservoir: &reservoir,
            body: &body,
        };
        let (header2, body2) = stereo_frame(200, 1000, 0);
        let view2 = FrameView {
            header: &header2,
            body: &body2,
            ..view
        };
        rows.clear();
        decoder.decode(&ctx(Level::Warn), &view2, &mut rows)?;
        assert_eq!(decoder.side_info().main_data_begin, 200);
        Ok(())
    }

    /// A mono frame whose first granule holds the single line `xr[0] = 1.0`.
    fn impulse_frame(head: u32) -> anyhow::Result<(FrameHeader, Vec<u8>)> {
        let header = FrameHeader::parse(head)?;
        let lsf = header.lsf();
        // MPEG-2: scalefac_compress 507 reads 11 two-bit and 10 one-bit scale factors
        let (sfc, sf_bits) = if lsf { (507, 32) } else { (0, 0) };

        let mut w = BitWriter::default();
        w.put(0, if lsf { 8 + 1 } else { 9 + 5 + 4 });
        for gr in 0..if lsf { 1 } else { 2 } {
            let first = gr == 0;
            w.put(if first { sf_bits + 3 } else { 0 }, 12);
            w.put(first as u32, 9); // big_values
            w.put(210, 8);
            w.put(if first { sfc } else { 0 }, if lsf { 9 } else { 4 });
            w.put(0, 1);
            w.put(1, 5); // table 1 for region 0
            w.put(0, 10 + 4 + 3);
            w.put(0, if lsf { 2 } else { 3 });
        }
        w.put(0, sf_bits);
        w.put(0b01, 2); // (1, 0)
        w.put(0, 1);
        Ok((header, w.finish(header.framesize)))
    }

    fn decode_impulse(head: u32) -> anyhow::Result<SubbandRows> {
        let (header, body) = impulse_frame(head)?;
        let view = FrameView {
            header: &header,
            reservoir: &[],
            body: &body,
        };
        let mut rows = SubbandRows::default();
        Layer3Decoder::default().decode(&ctx(Level::Warn), &view, &mut rows)?;
        Ok(rows)
    }

    #[test]
    fn decodes_a_spectral_line() -> anyhow::Result<()> {
        let rows = decode_impulse(L3_MONO)?;
        assert_eq!(rows.len(), 36);

        // IMDCT of line 0 under the normal window
        let expected = |i: usize| {
            let x = (PI / 72.0 * (2 * i + 19) as f64).cos() * (PI / 36.0 * (i as f64 + 0.5)).sin();
            x as f32
        };
        for (t, row) in rows.rows().iter().enumerate() {
            assert!((row[0][0] - expected(t)).abs() < 1e-5, "row {t}");
            assert!(row[0][1..].iter().all(|&x| x == 0.0));
        }
        Ok(())
    }

    #[test]
    fn lsf_granule_matches_mpeg1() -> anyhow::Result<()> {
        let lsf = decode_impulse(L3_LSF_MONO)?;
        let mpeg1 = decode_impulse(L3_MONO)?;
        assert_eq!(lsf.len(), 18);
        for (a, b) in lsf.rows().iter().zip(&mpeg1.rows()[..18]) {
            assert!((a[0][0] - b[0][0]).abs() < 1e-6);
        }
        assert!(lsf.rows().iter().any(|row| row[0][0] != 0.0));
        Ok(())
    }

    #[test]
    fn reserved_table_fails_the_frame() -> anyhow::Result<()> {
        let (header, mut body) = impulse_frame(L3_MONO)?;
        // table_select[0] of granule 0 becomes 4
        let mut w = BitWriter::default();
        w.put(0, 18 + 12 + 9 + 8 + 4 + 1);
        w.put(4, 5);
        let patched = w.finish(8);
        body[6] = (body[6] & 0xF0) | (patched[6] & 0x0F);
        body[7] = (body[7] & 0x0F) | (patched[7] & 0xF0);

        let view = FrameView {
            header: &header,
            reservoir: &[],
            body: &body,
        };
        let mut rows = SubbandRows::default();
        let err = Layer3Decoder::default()
            .decode(&ctx(Level::Error), &view, &mut rows)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<FrameError>(),
            Some(&FrameError::ReservedHuffmanTable(4))
        );
        Ok(())
    }
}
