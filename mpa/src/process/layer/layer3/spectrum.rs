//! Layer III spectrum: Huffman decoding, requantization, stereo processing
//! and short block reordering.

use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::sync::OnceLock;

use anyhow::{Result, bail};

use super::GranuleChannel;
use super::huffman::{read_pair, read_quad};
use super::scalefactors::ScaleFactors;
use super::tables::{LONG_WIDTHS, PRETAB, SHORT_WIDTHS, long_starts};
use crate::process::synth::Real;
use crate::structs::header::{FrameHeader, Version};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::FrameError;

/// Frequency lines per granule and channel.
pub const LINES: usize = 576;

pub type Spectrum = [Real; LINES];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKind {
    Long(usize),
    /// Band and window.
    Short(usize, usize),
}

/// A scale factor band in Huffman (transmission) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub start: usize,
    pub end: usize,
    pub kind: BandKind,
}

/// Band layout of a granule channel. Short bands are listed window by
/// window; mixed blocks start with the long bands below line 36.
pub fn bands(sampling_index: usize, gc: &GranuleChannel) -> Vec<Band> {
    let mut out = Vec::with_capacity(40);
    let mut start = 0;

    if !(gc.window_switching && gc.block_type == 2) {
        for (sfb, &width) in LONG_WIDTHS[sampling_index].iter().enumerate() {
            let end = start + width as usize;
            out.push(Band { start, end, kind: BandKind::Long(sfb) });
            start = end;
        }
        return out;
    }

    let first_short = if gc.mixed_block {
        for (sfb, &width) in LONG_WIDTHS[sampling_index].iter().enumerate() {
            if start >= 36 {
                break;
            }
            let end = start + width as usize;
            out.push(Band { start, end, kind: BandKind::Long(sfb) });
            start = end;
        }
        3
    } else {
        0
    };

    for sfb in first_short..13 {
        let width = SHORT_WIDTHS[sampling_index][sfb] as usize;
        for w in 0..3 {
            let end = (start + width).min(LINES);
            out.push(Band { start, end, kind: BandKind::Short(sfb, w) });
            start = end;
        }
    }
    out
}

/// Start lines of Huffman regions 1 and 2.
fn regions(header: &FrameHeader, gc: &GranuleChannel) -> (usize, usize) {
    let starts = long_starts(header.sampling_index as usize);
    if !gc.window_switching {
        let r1 = (gc.region0_count as usize + 1).min(22);
        let r2 = (gc.region0_count as usize + gc.region1_count as usize + 2).min(22);
        return (starts[r1], starts[r2]);
    }

    let r1 = match (gc.block_type, gc.mixed_block, header.version) {
        (2, false, Version::Mpeg25) => starts[6],
        (2, _, _) => 36,
        _ => starts[8],
    };
    (r1, LINES)
}

/// Reads the Huffman coded values of part 3, ending at bit `end` of
/// `reader`. Returns the count of lines that may be nonzero.
pub fn read_values(
    reader: &mut BsIoSliceReader,
    header: &FrameHeader,
    gc: &GranuleChannel,
    end: u64,
    values: &mut [i32; LINES],
) -> Result<usize> {
    let big_end = (gc.big_values as usize * 2).min(LINES);
    let (region1, region2) = regions(header, gc);
    let (region1, region2) = (region1.min(big_end), region2.min(big_end));

    let mut i = 0;
    while i < big_end {
        let table = if i < region1 {
            gc.table_select[0]
        } else if i < region2 {
            gc.table_select[1]
        } else {
            gc.table_select[2]
        };
        let [x, y] = read_pair(reader, table)?;
        values[i] = x;
        values[i + 1] = y;
        i += 2;
    }

    let position = reader.position()?;
    if position > end {
        bail!(FrameError::HuffmanOverrun { bits: position - end });
    }

    while i + 4 <= LINES && reader.position()? < end {
        // a quad running past `end` is padding
        match read_quad(reader, gc.count1table_select) {
            Ok(quad) if reader.position()? <= end => {
                values[i..i + 4].copy_from_slice(&quad);
                i += 4;
            }
            _ => break,
        }
    }
    values[i..].fill(0);

    let position = reader.position()?;
    reader.seek(end as i64 - position as i64)?;
    Ok(i)
}

fn pow43_table() -> &'static [Real] {
    static TABLE: OnceLock<Vec<Real>> = OnceLock::new();
    TABLE.get_or_init(|| {
        (0..8207)
            .map(|i| (i as f64).powf(4.0 / 3.0) as Real)
            .collect()
    })
}

fn pow43(value: i32) -> Real {
    let magnitude = value.unsigned_abs() as usize;
    let x = pow43_table()
        .get(magnitude)
        .copied()
        .unwrap_or_else(|| (magnitude as f64).powf(4.0 / 3.0) as Real);
    if value < 0 { -x } else { x }
}

/// Scales the Huffman values of the first `nonzero` lines into `xr`.
pub fn requantize(
    gc: &GranuleChannel,
    sf: &ScaleFactors,
    bands: &[Band],
    values: &[i32; LINES],
    nonzero: usize,
    xr: &mut Spectrum,
) {
    xr.fill(0.0);
    let gain = gc.global_gain as i32 - 210;
    let shift = if gc.scalefac_scale { 4 } else { 2 };

    for band in bands.iter().take_while(|band| band.start < nonzero) {
        let quarters = match band.kind {
            BandKind::Long(sfb) => {
                let pre = if sf.preflag { PRETAB[sfb] } else { 0 };
                gain - shift * (sf.long[sfb] as i32 + pre as i32)
            }
            BandKind::Short(sfb, w) => {
                gain - 8 * gc.subblock_gain[w] as i32 - shift * sf.short[sfb][w] as i32
            }
        };
        let scale = (2.0f64).powf(quarters as f64 / 4.0) as Real;
        let end = band.end.min(nonzero);
        for (x, &v) in xr[band.start..end].iter_mut().zip(&values[band.start..end]) {
            if v != 0 {
                *x = pow43(v) * scale;
            }
        }
    }
}

/// Left and right gains of an intensity coded band, or `None` when `pos`
/// is the illegal position.
fn intensity_gains(lsf: bool, pos: u8, illegal: u8, intensity_scale: u8) -> Option<(Real, Real)> {
    if pos >= illegal {
        return None;
    }
    if lsf {
        let io = (2.0f64).powf(-0.25 * (1 + intensity_scale) as f64);
        let gains = if pos % 2 == 1 {
            (io.powi((pos as i32 + 1) / 2), 1.0)
        } else {
            (1.0, io.powi(pos as i32 / 2))
        };
        return Some((gains.0 as Real, gains.1 as Real));
    }
    if pos == 6 {
        return Some((1.0, 0.0));
    }
    let ratio = (pos as f64 * PI / 12.0).tan();
    Some(((ratio / (1.0 + ratio)) as Real, (1.0 / (1.0 + ratio)) as Real))
}

fn mid_side(left: &mut [Real], right: &mut [Real]) {
    let scale = FRAC_1_SQRT_2 as Real;
    for (l, r) in left.iter_mut().zip(right.iter_mut()) {
        let (m, s) = (*l, *r);
        *l = (m + s) * scale;
        *r = (m - s) * scale;
    }
}

/// Joint stereo processing of both channels. `bands` and `sf` describe the
/// right channel, whose scale factors carry the intensity positions.
pub fn joint_stereo(
    header: &FrameHeader,
    bands: &[Band],
    sf: &ScaleFactors,
    xr: &mut [Spectrum; 2],
) {
    let ms = header.mode_ext & 2 != 0;
    let intensity = header.mode_ext & 1 != 0;
    let [left, right] = xr;

    if !intensity {
        if ms {
            mid_side(left, right);
        }
        return;
    }

    // intensity coding starts above the last nonzero right band
    let mut long_bound = 0;
    let mut short_bound = [0usize; 3];
    for band in bands {
        if right[band.start..band.end].iter().any(|&x| x != 0.0) {
            match band.kind {
                BandKind::Long(sfb) => long_bound = sfb + 1,
                BandKind::Short(sfb, w) => short_bound[w] = sfb + 1,
            }
        }
    }
    if short_bound.iter().any(|&b| b > 0) {
        long_bound = usize::MAX;
    }

    let lsf = header.lsf();
    for band in bands {
        let gains = match band.kind {
            BandKind::Long(sfb) if sfb >= long_bound => {
                let sfb = sfb.min(20);
                intensity_gains(lsf, sf.long[sfb], sf.long_illegal[sfb], sf.intensity_scale)
            }
            BandKind::Short(sfb, w) if sfb >= short_bound[w] => {
                let sfb = sfb.min(11);
                intensity_gains(lsf, sf.short[sfb][w], sf.short_illegal[sfb], sf.intensity_scale)
            }
            _ => None,
        };

        let range = band.start..band.end;
        match gains {
            Some((gl, gr)) => {
                for (l, r) in left[range.clone()].iter_mut().zip(right[range].iter_mut()) {
                    *r = *l * gr;
                    *l *= gl;
                }
            }
            None if ms => mid_side(&mut left[range.clone()], &mut right[range]),
            None => {}
        }
    }
}

/// Interleaves the windows of each short band, so that line `f` of window
/// `w` lands at `3 * f + w` within the short region.
pub fn reorder(bands: &[Band], xr: &mut Spectrum) {
    let mut scratch = [0.0; LINES];
    for band in bands {
        let BandKind::Short(_, 0) = band.kind else {
            continue;
        };
        let width = band.end - band.start;
        let end = (band.start + 3 * width).min(LINES);
        let group = &mut xr[band.start..end];
        scratch[..group.len()].copy_from_slice(group);
        for (i, x) in group.iter_mut().enumerate() {
            let (j, w) = (i / 3, i % 3);
            *x = scratch[w * width + j];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::{BitWriter, L3_STEREO};

    fn short_gc(mixed: bool) -> GranuleChannel {
        GranuleChannel {
            window_switching: true,
            block_type: 2,
            mixed_block: mixed,
            ..Default::default()
        }
    }

    #[test]
    fn band_layouts() {
        let long = bands(0, &GranuleChannel::default());
        assert_eq!(long.len(), 22);
        assert_eq!(long[21].end, LINES);

        let short = bands(0, &short_gc(false));
        assert_eq!(short.len(), 39);
        assert_eq!(short[3], Band { start: 12, end: 16, kind: BandKind::Short(1, 0) });
        assert_eq!(short[38].end, LINES);

        let mixed = bands(0, &short_gc(true));
        assert_eq!(mixed[7].end, 36);
        assert_eq!(mixed[8], Band { start: 36, end: 40, kind: BandKind::Short(3, 0) });
        assert_eq!(mixed.last().map(|b| b.end), Some(LINES));
    }

    #[test]
    fn values_and_count1_region() -> anyhow::Result<()> {
        let header = FrameHeader::parse(L3_STEREO)?;
        let gc = GranuleChannel {
            big_values: 2,
            table_select: [1, 1, 1],
            ..Default::default()
        };
        let mut w = BitWriter::default();
        w.put(0b01, 2); // (1, 0)
        w.put(0, 1);
        w.put(0b001, 3); // (0, 1)
        w.put(1, 1);
        w.put(0b1, 1); // quad 0000
        w.put(0b0101, 4); // quad 0001, then a sign bit past the end
        let data = w.finish(4);

        let mut reader = BsIoSliceReader::from_slice(&data);
        let mut values = [7; LINES];
        let nonzero = read_values(&mut reader, &header, &gc, 12, &mut values)?;
        assert_eq!(nonzero, 8);
        assert_eq!(values[..8], [1, 0, 0, -1, 0, 0, 0, 0]);
        assert!(values[8..].iter().all(|&v| v == 0));
        assert_eq!(reader.position()?, 12);
        Ok(())
    }

    #[test]
    fn big_values_past_the_granule() -> anyhow::Result<()> {
        let header = FrameHeader::parse(L3_STEREO)?;
        let gc = GranuleChannel {
            big_values: 4,
            table_select: [1, 1, 1],
            ..Default::default()
        };
        // four (1, 1) pairs of five bits each
        let data = [0u8; 4];
        let mut reader = BsIoSliceReader::from_slice(&data);
        let mut values = [0; LINES];
        let err = read_values(&mut reader, &header, &gc, 6, &mut values).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FrameError>(),
            Some(&FrameError::HuffmanOverrun { bits: 14 })
        );
        Ok(())
    }

    #[test]
    fn requantization_follows_gain_and_scale_factors() {
        let gc = GranuleChannel {
            global_gain: 214,
            ..Default::default()
        };
        let mut sf = ScaleFactors::default();
        sf.long[1] = 2;
        let mut values = [0; LINES];
        values[0] = 8;
        values[4] = -1;
        let mut xr = [0.0; LINES];
        requantize(&gc, &sf, &bands(0, &gc), &values, 8, &mut xr);

        assert!((xr[0] - 32.0).abs() < 1e-3);
        assert!((xr[4] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn mid_side_and_intensity() -> anyhow::Result<()> {
        // joint stereo with M/S and intensity
        let header = FrameHeader::parse(L3_STEREO | 0x30)?;
        let gc = GranuleChannel::default();
        let layout = bands(0, &gc);
        let mut sf = ScaleFactors::default();
        sf.long[2] = 6;
        sf.long[3] = 7;

        let mut xr = [[0.0; LINES]; 2];
        xr[0][0] = 1.0;
        xr[1][0] = 1.0;
        xr[0][8] = 0.5;
        xr[0][12] = 0.25;
        joint_stereo(&header, &layout, &sf, &mut xr);

        let s = FRAC_1_SQRT_2 as Real;
        assert!((xr[0][0] - 2.0 * s).abs() < 1e-6);
        assert!(xr[1][0].abs() < 1e-6);
        // position 6: everything left
        assert_eq!((xr[0][8], xr[1][8]), (0.5, 0.0));
        // position 7 falls back to M/S
        assert!((xr[0][12] - 0.25 * s).abs() < 1e-6);
        assert!((xr[1][12] - 0.25 * s).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn short_windows_are_interleaved() {
        let gc = short_gc(false);
        let layout = bands(0, &gc);
        let mut xr = [0.0; LINES];
        for (i, x) in xr.iter_mut().enumerate().take(12) {
            *x = i as Real;
        }
        reorder(&layout, &mut xr);
        assert_eq!(xr[..6], [0.0, 4.0, 8.0, 1.0, 5.0, 9.0]);
        assert_eq!(xr[11], 11.0);
    }
}
