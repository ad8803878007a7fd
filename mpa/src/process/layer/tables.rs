//! Quantizer and bit allocation tables for Layer I and II.

use crate::process::synth::Real;
use crate::structs::header::FrameHeader;

/// Quantizer of one allocation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantClass {
    pub levels: u32,
    /// Bits per code. Grouped classes pack three samples into one code.
    pub bits: u32,
    pub grouped: bool,
}

const fn grouped(levels: u32, bits: u32) -> QuantClass {
    QuantClass {
        levels,
        bits,
        grouped: true,
    }
}

const fn plain(bits: u32) -> QuantClass {
    QuantClass {
        levels: (1 << bits) - 1,
        bits,
        grouped: false,
    }
}

pub const QUANT_CLASSES: [QuantClass; 17] = [
    grouped(3, 5),
    grouped(5, 7),
    plain(3),
    grouped(9, 10),
    plain(4),
    plain(5),
    plain(6),
    plain(7),
    plain(8),
    plain(9),
    plain(10),
    plain(11),
    plain(12),
    plain(13),
    plain(14),
    plain(15),
    plain(16),
];

// Class index for allocation values 1.. of a subband band.
const HIGH: [u8; 15] = [0, 2, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
const MID: [u8; 15] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 16];
const LOW3: [u8; 7] = [0, 1, 2, 3, 4, 5, 16];
const LOW2: [u8; 3] = [0, 1, 16];
const CD_HIGH: [u8; 15] = [0, 1, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
const CD_LOW: [u8; 7] = [0, 1, 3, 4, 5, 6, 7];
const LSF_HIGH: [u8; 15] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14];
const LSF_LOW: [u8; 3] = [0, 1, 3];

/// Runs of subbands sharing `nbal` and classes: `(subbands, nbal, classes)`.
type Band = (usize, u32, &'static [u8]);

const TABLE_27: &[Band] = &[(3, 4, &HIGH), (8, 4, &MID), (12, 3, &LOW3), (4, 2, &LOW2)];
const TABLE_30: &[Band] = &[(3, 4, &HIGH), (8, 4, &MID), (12, 3, &LOW3), (7, 2, &LOW2)];
const TABLE_8: &[Band] = &[(2, 4, &CD_HIGH), (6, 3, &CD_LOW)];
const TABLE_12: &[Band] = &[(2, 4, &CD_HIGH), (10, 3, &CD_LOW)];
const TABLE_LSF: &[Band] = &[(4, 4, &LSF_HIGH), (7, 3, &CD_LOW), (19, 2, &LSF_LOW)];

const TABLES: [&[Band]; 5] = [TABLE_27, TABLE_30, TABLE_8, TABLE_12, TABLE_LSF];

/// Bit allocation of one Layer II subband.
#[derive(Debug, Clone, Copy)]
pub struct SubbandAlloc {
    pub nbal: u32,
    pub classes: &'static [u8],
}

impl SubbandAlloc {
    /// Quantizer for a non-zero allocation value.
    pub fn class(&self, alloc: u8) -> Option<QuantClass> {
        self.classes
            .get(alloc as usize - 1)
            .map(|&c| QUANT_CLASSES[c as usize])
    }
}

/// Picks one of the five Layer II allocation tables.
pub fn select_table(header: &FrameHeader) -> usize {
    if header.lsf() {
        return 4;
    }

    let rate = header.sample_rate();
    let per_channel = header.bitrate() / header.channels() as u32;
    if (rate == 48000 && per_channel >= 56) || (56..=80).contains(&per_channel) {
        0
    } else if rate != 48000 && per_channel >= 96 {
        1
    } else if rate != 32000 && per_channel <= 48 {
        2
    } else {
        3
    }
}

/// Expands a table to one entry per coded subband.
pub fn allocations(table: usize) -> Vec<SubbandAlloc> {
    TABLES[table]
        .iter()
        .flat_map(|&(count, nbal, classes)| {
            std::iter::repeat_n(SubbandAlloc { nbal, classes }, count)
        })
        .collect()
}

/// Scale factor multipliers `2^(1 - i/3)`. Index 63 is invalid and maps to 0.
pub fn scale_factors() -> [Real; 64] {
    let mut table = [0.0; 64];
    for (i, v) in table.iter_mut().take(63).enumerate() {
        *v = 2f64.powf(1.0 - i as f64 / 3.0) as Real;
    }
    table
}

/// Uniform midtread requantization of `code` on a `levels`-step scale.
#[inline]
pub fn requantize(code: u32, levels: u32) -> Real {
    (2.0 * code as Real - (levels - 1) as Real) / levels as Real
}
