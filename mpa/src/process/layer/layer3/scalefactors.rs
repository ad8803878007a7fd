//! Layer III scale factors (part 2 of the main data).

use anyhow::Result;

use super::GranuleChannel;
use super::tables::{LSF_SFB_COUNTS, SCFSI_BANDS, SLEN};
use crate::utils::bitstream_io::BsIoSliceReader;

/// Intensity position that never occurs in MPEG-1, so every band can be intensity coded.
const MPEG1_ILLEGAL_POSITION: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFactors {
    pub long: [u8; 22],
    /// Per band, per window.
    pub short: [[u8; 3]; 13],
    /// Intensity position that marks a band as not intensity coded.
    pub long_illegal: [u8; 22],
    pub short_illegal: [u8; 13],
    pub preflag: bool,
    /// MPEG-2 intensity stereo ratio selector.
    pub intensity_scale: u8,
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self {
            long: [0; 22],
            short: [[0; 3]; 13],
            long_illegal: [MPEG1_ILLEGAL_POSITION; 22],
            short_illegal: [MPEG1_ILLEGAL_POSITION; 13],
            preflag: false,
            intensity_scale: 0,
        }
    }
}

fn get_bits(reader: &mut BsIoSliceReader, bits: u32) -> Result<u8> {
    Ok(if bits == 0 { 0 } else { reader.get_n(bits)? })
}

fn short_blocks(gc: &GranuleChannel) -> bool {
    gc.window_switching && gc.block_type == 2
}

/// MPEG-1 scale factors. Long bands of granule 1 flagged in `scfsi` are
/// taken from `previous`, the same channel's granule 0.
pub fn read_mpeg1(
    reader: &mut BsIoSliceReader,
    gc: &GranuleChannel,
    scfsi: &[bool; 4],
    gr: usize,
    previous: &ScaleFactors,
) -> Result<ScaleFactors> {
    let (slen1, slen2) = SLEN[gc.scalefac_compress as usize & 15];
    let mut sf = ScaleFactors {
        preflag: gc.preflag,
        ..Default::default()
    };

    if short_blocks(gc) {
        let first_short = if gc.mixed_block {
            for value in sf.long.iter_mut().take(8) {
                *value = get_bits(reader, slen1)?;
            }
            3
        } else {
            0
        };
        for sfb in first_short..12 {
            let bits = if sfb < 6 { slen1 } else { slen2 };
            for value in sf.short[sfb].iter_mut() {
                *value = get_bits(reader, bits)?;
            }
        }
    } else {
        for (group, bands) in SCFSI_BANDS.iter().enumerate() {
            let bits = if group < 2 { slen1 } else { slen2 };
            for sfb in bands.clone() {
                sf.long[sfb] = if gr == 1 && scfsi[group] {
                    previous.long[sfb]
                } else {
                    get_bits(reader, bits)?
                };
            }
        }
    }

    Ok(sf)
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Long(usize),
    Short(usize, usize),
}

/// Bands in transmission order for a block type.
fn slots(gc: &GranuleChannel) -> impl Iterator<Item = Slot> {
    let (long, short) = match (short_blocks(gc), gc.mixed_block) {
        (false, _) => (0..21, 0..0),
        (true, true) => (0..6, 3..12),
        (true, false) => (0..0, 0..12),
    };
    long.map(Slot::Long)
        .chain(short.flat_map(|sfb| (0..3).map(move |w| Slot::Short(sfb, w))))
}

/// MPEG-2/2.5 scale factors. `intensity_right` selects the intensity stereo
/// coding of the right channel, which has no preflag.
pub fn read_lsf(
    reader: &mut BsIoSliceReader,
    gc: &GranuleChannel,
    intensity_right: bool,
) -> Result<ScaleFactors> {
    let sfc = gc.scalefac_compress as u32;
    let mut sf = ScaleFactors::default();

    let (slen, table) = if intensity_right {
        sf.intensity_scale = (sfc & 1) as u8;
        let isc = sfc >> 1;
        if isc < 180 {
            ([isc / 36, (isc % 36) / 6, isc % 6, 0], 3)
        } else if isc < 244 {
            let isc = isc - 180;
            ([(isc % 64) >> 4, (isc % 16) >> 2, isc % 4, 0], 4)
        } else {
            let isc = isc - 244;
            ([isc / 3, isc % 3, 0, 0], 5)
        }
    } else if sfc < 400 {
        ([(sfc >> 4) / 5, (sfc >> 4) % 5, (sfc & 15) >> 2, sfc & 3], 0)
    } else if sfc < 500 {
        let sfc = sfc - 400;
        ([(sfc >> 2) / 5, (sfc >> 2) % 5, sfc & 3, 0], 1)
    } else {
        sf.preflag = true;
        let sfc = sfc - 500;
        ([sfc / 3, sfc % 3, 0, 0], 2)
    };

    let block = match (short_blocks(gc), gc.mixed_block) {
        (false, _) => 0,
        (true, false) => 1,
        (true, true) => 2,
    };

    let mut slots = slots(gc);
    for (&count, &bits) in LSF_SFB_COUNTS[table][block].iter().zip(slen.iter()) {
        let illegal = ((1u32 << bits) - 1) as u8;
        for slot in slots.by_ref().take(count as usize) {
            let value = get_bits(reader, bits)?;
            match slot {
                Slot::Long(sfb) => {
                    sf.long[sfb] = value;
                    sf.long_illegal[sfb] = illegal;
                }
                Slot::Short(sfb, w) => {
                    sf.short[sfb][w] = value;
                    sf.short_illegal[sfb] = illegal;
                }
            }
        }
    }

    Ok(sf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::BitWriter;

    #[test]
    fn mpeg1_long_with_scfsi() -> anyhow::Result<()> {
        let gc = GranuleChannel {
            scalefac_compress: 5, // slen 1, 1
            ..Default::default()
        };
        let mut w = BitWriter::default();
        for sfb in 0..21 {
            w.put(sfb as u32 & 1, 1);
        }
        w.put(0, 11); // granule 1: only groups 0 and 1
        let data = w.finish(8);

        let mut reader = BsIoSliceReader::from_slice(&data);
        let first = read_mpeg1(&mut reader, &gc, &[false; 4], 0, &ScaleFactors::default())?;
        assert_eq!(first.long[..4], [0, 1, 0, 1]);
        assert_eq!(first.long[21], 0);
        assert_eq!(reader.position()?, 21);

        let scfsi = [false, false, true, true];
        let second = read_mpeg1(&mut reader, &gc, &scfsi, 1, &first)?;
        assert_eq!(second.long[..11], [0; 11]);
        assert_eq!(second.long[11..21], first.long[11..21]);
        assert_eq!(reader.position()?, 32);
        Ok(())
    }

    #[test]
    fn mpeg1_mixed_blocks() -> anyhow::Result<()> {
        let gc = GranuleChannel {
            scalefac_compress: 15, // slen 4, 3
            window_switching: true,
            block_type: 2,
            mixed_block: true,
            ..Default::default()
        };
        let mut w = BitWriter::default();
        w.put(9, 4 * 8);
        for _ in 0..9 {
            w.put(0xF, 4);
        }
        for _ in 0..18 {
            w.put(5, 3);
        }
        let data = w.finish(16);

        let mut reader = BsIoSliceReader::from_slice(&data);
        let sf = read_mpeg1(&mut reader, &gc, &[true; 4], 1, &ScaleFactors::default())?;
        assert_eq!(sf.long[7], 9);
        assert_eq!(sf.short[3], [15; 3]);
        assert_eq!(sf.short[11], [5; 3]);
        assert_eq!(sf.short[0], [0; 3]);
        assert_eq!(reader.position()?, 32 + 36 + 54);
        Ok(())
    }

    #[test]
    fn lsf_partitions() -> anyhow::Result<()> {
        // scalefac_compress 500 + 3 * 2 + 1: slen 2, 1 and preflag
        let gc = GranuleChannel {
            scalefac_compress: 507,
            ..Default::default()
        };
        let mut w = BitWriter::default();
        for _ in 0..11 {
            w.put(3, 2);
        }
        for _ in 0..10 {
            w.put(1, 1);
        }
        let data = w.finish(8);

        let mut reader = BsIoSliceReader::from_slice(&data);
        let sf = read_lsf(&mut reader, &gc, false)?;
        assert!(sf.preflag);
        assert_eq!(sf.long[10], 3);
        assert_eq!(sf.long[11], 1);
        assert_eq!(sf.long[20], 1);
        assert_eq!(sf.long_illegal[0], 3);
        assert_eq!(reader.position()?, 32);
        Ok(())
    }

    #[test]
    fn lsf_intensity_right_channel() -> anyhow::Result<()> {
        // isc 37: slen 1, 0, 1; intensity_scale 1
        let gc = GranuleChannel {
            scalefac_compress: 75,
            preflag: false,
            ..Default::default()
        };
        let mut w = BitWriter::default();
        for _ in 0..7 {
            w.put(1, 1);
        }
        for _ in 0..7 {
            w.put(0, 1);
        }
        let data = w.finish(4);

        let mut reader = BsIoSliceReader::from_slice(&data);
        let sf = read_lsf(&mut reader, &gc, true)?;
        assert!(!sf.preflag);
        assert_eq!(sf.intensity_scale, 1);
        assert_eq!(sf.long[6], 1);
        assert_eq!(sf.long_illegal[6], 1);
        assert_eq!(sf.long_illegal[7], 0);
        assert_eq!(sf.long[14], 0);
        assert_eq!(reader.position()?, 14);
        Ok(())
    }
}
