//! Layer III Huffman codes.
//!
//! Codes are stored as `length << 24 | code`, indexed by symbol. A pair
//! table of width `w` maps symbol `s` to `(s / w, s % w)`. The decode trees
//! are built from the code lists on first use.

use std::sync::OnceLock;

use anyhow::{Result, bail};

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::FrameError;

const LEAF: u16 = 0x8000;

#[derive(Debug, Clone, Copy)]
enum PairCode {
    /// Table 0: every value is zero and no bits are read.
    Zero,
    /// Tables 4 and 14.
    Reserved,
    /// Index into [`CODES`].
    Tree(usize),
}

const PAIR_CODES: [PairCode; 32] = {
    use PairCode::*;
    [
        Zero, Tree(0), Tree(1), Tree(2), Reserved, Tree(3), Tree(4), Tree(5),
        Tree(6), Tree(7), Tree(8), Tree(9), Tree(10), Tree(11), Reserved, Tree(12),
        Tree(13), Tree(13), Tree(13), Tree(13), Tree(13), Tree(13), Tree(13), Tree(13),
        Tree(14), Tree(14), Tree(14), Tree(14), Tree(14), Tree(14), Tree(14), Tree(14),
    ]
};

const LINBITS: [u32; 32] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    1, 2, 3, 4, 6, 8, 10, 13, 4, 5, 6, 7, 8, 9, 11, 13,
];

/// Code list and width of each distinct pair code.
const CODES: [(&[u32], usize); 15] = [
    (&TABLE_1, 2),
    (&TABLE_2, 3),
    (&TABLE_3, 3),
    (&TABLE_5, 4),
    (&TABLE_6, 4),
    (&TABLE_7, 6),
    (&TABLE_8, 6),
    (&TABLE_9, 6),
    (&TABLE_10, 8),
    (&TABLE_11, 8),
    (&TABLE_12, 8),
    (&TABLE_13, 16),
    (&TABLE_15, 16),
    (&TABLE_16, 16),
    (&TABLE_24, 16),
];

#[derive(Debug)]
struct Tree {
    /// Children per node: another node index, or `LEAF | symbol`. Zero is unused.
    nodes: Vec<[u16; 2]>,
}

impl Tree {
    fn build(codes: &[u32]) -> Self {
        let mut nodes = vec![[0u16; 2]];
        for (symbol, &packed) in codes.iter().enumerate() {
            let len = packed >> 24;
            let code = packed & 0x00FF_FFFF;
            let mut node = 0;
            for i in (0..len).rev() {
                let bit = ((code >> i) & 1) as usize;
                if i == 0 {
                    nodes[node][bit] = LEAF | symbol as u16;
                } else {
                    if nodes[node][bit] == 0 {
                        nodes.push([0; 2]);
                        nodes[node][bit] = (nodes.len() - 1) as u16;
                    }
                    node = nodes[node][bit] as usize;
                }
            }
        }
        Self { nodes }
    }

    fn decode(&self, reader: &mut BsIoSliceReader) -> Result<usize> {
        let mut node = 0;
        loop {
            let next = self.nodes[node][reader.get()? as usize];
            if next & LEAF != 0 {
                return Ok((next & !LEAF) as usize);
            }
            if next == 0 {
                bail!(FrameError::InvalidHuffmanCode);
            }
            node = next as usize;
        }
    }
}

#[derive(Debug)]
struct Trees {
    pairs: Vec<Tree>,
    quad_a: Tree,
}

fn trees() -> &'static Trees {
    static TREES: OnceLock<Trees> = OnceLock::new();
    TREES.get_or_init(|| Trees {
        pairs: CODES.iter().map(|(codes, _)| Tree::build(codes)).collect(),
        quad_a: Tree::build(&QUAD_A),
    })
}

fn apply_sign(reader: &mut BsIoSliceReader, value: i32) -> Result<i32> {
    Ok(if value != 0 && reader.get()? { -value } else { value })
}

/// Reads one big_values pair coded with `table` (0..=31).
pub fn read_pair(reader: &mut BsIoSliceReader, table: u8) -> Result<[i32; 2]> {
    let index = match PAIR_CODES[table as usize & 31] {
        PairCode::Zero => return Ok([0, 0]),
        PairCode::Reserved => bail!(FrameError::ReservedHuffmanTable(table)),
        PairCode::Tree(index) => index,
    };

    let symbol = trees().pairs[index].decode(reader)?;
    let width = CODES[index].1;
    let linbits = LINBITS[table as usize & 31];

    let mut pair = [(symbol / width) as i32, (symbol % width) as i32];
    for value in pair.iter_mut() {
        if linbits > 0 && *value == 15 {
            *value += reader.get_n::<u32>(linbits)? as i32;
        }
        *value = apply_sign(reader, *value)?;
    }
    Ok(pair)
}

/// Reads one count1 quadruple `[v, w, x, y]`, from table B when `table_b`.
pub fn read_quad(reader: &mut BsIoSliceReader, table_b: bool) -> Result<[i32; 4]> {
    let symbol = if table_b {
        reader.get_n::<u32>(4)? as usize ^ 15
    } else {
        trees().quad_a.decode(reader)?
    };

    let mut quad = [0; 4];
    for (i, value) in quad.iter_mut().enumerate() {
        *value = apply_sign(reader, ((symbol >> (3 - i)) & 1) as i32)?;
    }
    Ok(quad)
}

/// 2x2
const TABLE_1: [u32; 4] = [
    0x01000001, 0x03000001, 0x02000001, 0x03000000,
];

/// 3x3
const TABLE_2: [u32; 9] = [
    0x01000001, 0x03000002, 0x06000001, 0x03000003, 0x03000001, 0x05000001, 0x05000003, 0x05000002,
    0x06000000,
];

/// 3x3
const TABLE_3: [u32; 9] = [
    0x02000003, 0x02000002, 0x06000001, 0x03000001, 0x02000001, 0x05000001, 0x05000003, 0x05000002,
    0x06000000,
];

/// 4x4
const TABLE_5: [u32; 16] = [
    0x01000001, 0x03000002, 0x06000006, 0x07000005, 0x03000003, 0x03000001, 0x06000004, 0x07000004,
    0x06000007, 0x06000005, 0x07000007, 0x08000001, 0x07000006, 0x06000001, 0x07000001, 0x08000000,
];

/// 4x4
const TABLE_6: [u32; 16] = [
    0x03000007, 0x03000003, 0x05000005, 0x07000001, 0x03000006, 0x02000002, 0x04000003, 0x05000002,
    0x04000005, 0x04000004, 0x05000004, 0x06000001, 0x06000003, 0x05000003, 0x06000002, 0x07000000,
];

/// 6x6
const TABLE_7: [u32; 36] = [
    0x01000001, 0x03000002, 0x0600000A, 0x08000013, 0x08000010, 0x0900000A, 0x03000003, 0x04000003,
    0x06000007, 0x0700000A, 0x07000005, 0x08000003, 0x0600000B, 0x05000004, 0x0700000D, 0x08000011,
    0x08000008, 0x09000004, 0x0700000C, 0x0700000B, 0x08000012, 0x0900000F, 0x0900000B, 0x09000002,
    0x07000007, 0x07000006, 0x08000009, 0x0900000E, 0x09000003, 0x0A000001, 0x08000006, 0x08000004,
    0x09000005, 0x0A000003, 0x0A000002, 0x0A000000,
];

/// 6x6
const TABLE_8: [u32; 36] = [
    0x02000003, 0x03000004, 0x06000006, 0x08000012, 0x0800000C, 0x09000005, 0x03000005, 0x02000001,
    0x04000002, 0x08000010, 0x08000009, 0x08000003, 0x06000007, 0x04000003, 0x06000005, 0x0800000E,
    0x08000007, 0x09000003, 0x08000013, 0x08000011, 0x0800000F, 0x0900000D, 0x0900000A, 0x0A000004,
    0x0800000D, 0x07000005, 0x08000008, 0x0900000B, 0x0A000005, 0x0A000001, 0x0900000C, 0x08000004,
    0x09000004, 0x09000001, 0x0B000001, 0x0B000000,
];

/// 6x6
const TABLE_9: [u32; 36] = [
    0x03000007, 0x03000005, 0x05000009, 0x0600000E, 0x0800000F, 0x09000007, 0x03000006, 0x03000004,
    0x04000005, 0x05000005, 0x06000006, 0x08000007, 0x04000007, 0x04000006, 0x05000008, 0x06000008,
    0x07000008, 0x08000005, 0x0600000F, 0x05000006, 0x06000009, 0x0700000A, 0x07000005, 0x08000001,
    0x0700000B, 0x06000007, 0x07000009, 0x07000006, 0x08000004, 0x09000001, 0x0800000E, 0x07000004,
    0x08000006, 0x08000002, 0x09000006, 0x09000000,
];

/// 8x8
const TABLE_10: [u32; 64] = [
    0x01000001, 0x03000002, 0x0600000A, 0x08000017, 0x09000023, 0x0900001E, 0x0900000C, 0x0A000011,
    0x03000003, 0x04000003, 0x06000008, 0x0700000C, 0x08000012, 0x09000015, 0x0800000C, 0x08000007,
    0x0600000B, 0x06000009, 0x0700000F, 0x08000015, 0x09000020, 0x0A000028, 0x09000013, 0x09000006,
    0x0700000E, 0x0700000D, 0x08000016, 0x09000022, 0x0A00002E, 0x0A000017, 0x09000012, 0x0A000007,
    0x08000014, 0x08000013, 0x09000021, 0x0A00002F, 0x0A00001B, 0x0A000016, 0x0A000009, 0x0A000003,
    0x0900001F, 0x09000016, 0x0A000029, 0x0A00001A, 0x0B000015, 0x0B000014, 0x0A000005, 0x0B000003,
    0x0800000E, 0x0800000D, 0x0900000A, 0x0A00000B, 0x0A000010, 0x0A000006, 0x0B000005, 0x0B000001,
    0x09000009, 0x08000008, 0x09000007, 0x0A000008, 0x0A000004, 0x0B000004, 0x0B000002, 0x0B000000,
];

/// 8x8
const TABLE_11: [u32; 64] = [
    0x02000003, 0x03000004, 0x0500000A, 0x07000018, 0x08000022, 0x09000021, 0x08000015, 0x0900000F,
    0x03000005, 0x03000003, 0x04000004, 0x0600000A, 0x08000020, 0x08000011, 0x0700000B, 0x0800000A,
    0x0500000B, 0x05000007, 0x0600000D, 0x07000012, 0x0800001E, 0x0900001F, 0x08000014, 0x08000005,
    0x07000019, 0x0600000B, 0x07000013, 0x0900003B, 0x0800001B, 0x0A000012, 0x0800000C, 0x09000005,
    0x08000023, 0x08000021, 0x0800001F, 0x0900003A, 0x0900001E, 0x0A000010, 0x09000007, 0x0A000005,
    0x0800001C, 0x0800001A, 0x09000020, 0x0A000013, 0x0A000011, 0x0B00000F, 0x0A000008, 0x0B00000E,
    0x0800000E, 0x0700000C, 0x07000009, 0x0800000D, 0x0900000E, 0x0A000009, 0x0A000004, 0x0A000001,
    0x0800000B, 0x07000004, 0x08000006, 0x09000006, 0x0A000006, 0x0A000003, 0x0A000002, 0x0A000000,
];

/// 8x8
const TABLE_12: [u32; 64] = [
    0x04000009, 0x03000006, 0x05000010, 0x07000021, 0x08000029, 0x09000027, 0x09000026, 0x0900001A,
    0x03000007, 0x03000005, 0x04000006, 0x05000009, 0x07000017, 0x07000010, 0x0800001A, 0x0800000B,
    0x05000011, 0x04000007, 0x0500000B, 0x0600000E, 0x07000015, 0x0800001E, 0x0700000A, 0x08000007,
    0x06000011, 0x0500000A, 0x0600000F, 0x0600000C, 0x07000012, 0x0800001C, 0x0800000E, 0x08000005,
    0x07000020, 0x0600000D, 0x07000016, 0x07000013, 0x08000012, 0x08000010, 0x08000009, 0x09000005,
    0x08000028, 0x07000011, 0x0800001F, 0x0800001D, 0x08000011, 0x0900000D, 0x08000004, 0x09000002,
    0x0800001B, 0x0700000C, 0x0700000B, 0x0800000F, 0x0800000A, 0x09000007, 0x09000004, 0x0A000001,
    0x0900001B, 0x0800000C, 0x08000008, 0x0900000C, 0x09000006, 0x09000003, 0x09000001, 0x0A000000,
];

/// 16x16
const TABLE_13: [u32; 256] = [
    0x01000001, 0x04000005, 0x0600000E, 0x07000015, 0x08000022, 0x09000033, 0x0900002E, 0x0A000047,
    0x0900002A, 0x0A000034, 0x0B000044, 0x0B000034, 0x0C000043, 0x0C00002C, 0x0D00002B, 0x0D000013,
    0x03000003, 0x04000004, 0x0600000C, 0x07000013, 0x0800001F, 0x0800001A, 0x0900002C, 0x09000021,
    0x0900001F, 0x09000018, 0x0A000020, 0x0A000018, 0x0B00001F, 0x0C000023, 0x0C000016, 0x0C00000E,
    0x0600000F, 0x0600000D, 0x07000017, 0x08000024, 0x0900003B, 0x09000031, 0x0A00004D, 0x0A000041,
    0x0900001D, 0x0A000028, 0x0A00001E, 0x0B000028, 0x0B00001B, 0x0C000021, 0x0D00002A, 0x0D000010,
    0x07000016, 0x07000014, 0x08000025, 0x0900003D, 0x09000038, 0x0A00004F, 0x0A000049, 0x0A000040,
    0x0A00002B, 0x0B00004C, 0x0B000038, 0x0B000025, 0x0B00001A, 0x0C00001F, 0x0D000019, 0x0D00000E,
    0x08000023, 0x07000010, 0x0900003C, 0x09000039, 0x0A000061, 0x0A00004B, 0x0B000072, 0x0B00005B,
    0x0A000036, 0x0B000049, 0x0B000037, 0x0C000029, 0x0C000030, 0x0D000035, 0x0D000017, 0x0E000018,
    0x0900003A, 0x0800001B, 0x09000032, 0x0A000060, 0x0A00004C, 0x0A000046, 0x0B00005D, 0x0B000054,
    0x0B00004D, 0x0B00003A, 0x0C00004F, 0x0B00001D, 0x0D00004A, 0x0D000031, 0x0E000029, 0x0E000011,
    0x0900002F, 0x0900002D, 0x0A00004E, 0x0A00004A, 0x0B000073, 0x0B00005E, 0x0B00005A, 0x0B00004F,
    0x0B000045, 0x0C000053, 0x0C000047, 0x0C000032, 0x0D00003B, 0x0D000026, 0x0E000024, 0x0E00000F,
    0x0A000048, 0x09000022, 0x0A000038, 0x0B00005F, 0x0B00005C, 0x0B000055, 0x0C00005B, 0x0C00005A,
    0x0C000056, 0x0C000049, 0x0D00004D, 0x0D000041, 0x0D000033, 0x0E00002C, 0x1000002B, 0x1000002A,
    0x0900002B, 0x08000014, 0x0900001E, 0x0A00002C, 0x0A000037, 0x0B00004E, 0x0B000048, 0x0C000057,
    0x0C00004E, 0x0C00003D, 0x0C00002E, 0x0D000036, 0x0D000025, 0x0E00001E, 0x0F000014, 0x0F000010,
    0x0A000035, 0x09000019, 0x0A000029, 0x0A000025, 0x0B00002C, 0x0B00003B, 0x0B000036, 0x0D000051,
    0x0C000042, 0x0D00004C, 0x0D000039, 0x0E000036, 0x0E000025, 0x0E000012, 0x10000027, 0x0F00000B,
    0x0A000023, 0x0A000021, 0x0A00001F, 0x0B000039, 0x0B00002A, 0x0C000052, 0x0C000048, 0x0D000050,
    0x0C00002F, 0x0D00003A, 0x0E000037, 0x0D000015, 0x0E000016, 0x0F00001A, 0x10000026, 0x11000016,
    0x0B000035, 0x0A000019, 0x0A000017, 0x0B000026, 0x0C000046, 0x0C00003C, 0x0C000033, 0x0C000024,
    0x0D000037, 0x0D00001A, 0x0D000022, 0x0E000017, 0x0F00001B, 0x0F00000E, 0x0F000009, 0x10000007,
    0x0B000022, 0x0B000020, 0x0B00001C, 0x0C000027, 0x0C000031, 0x0D00004B, 0x0C00001E, 0x0D000034,
    0x0E000030, 0x0E000028, 0x0F000034, 0x0F00001C, 0x0F000012, 0x10000011, 0x10000009, 0x10000005,
    0x0C00002D, 0x0B000015, 0x0C000022, 0x0D000040, 0x0D000038, 0x0D000032, 0x0E000031, 0x0E00002D,
    0x0E00001F, 0x0E000013, 0x0E00000C, 0x0F00000F, 0x1000000A, 0x0F000007, 0x10000006, 0x10000003,
    0x0D000030, 0x0C000017, 0x0C000014, 0x0D000027, 0x0D000024, 0x0D000023, 0x0F000035, 0x0E000015,
    0x0E000010, 0x11000017, 0x0F00000D, 0x0F00000A, 0x0F000006, 0x11000001, 0x10000004, 0x10000002,
    0x0C000010, 0x0C00000F, 0x0D000011, 0x0E00001B, 0x0E000019, 0x0E000014, 0x0F00001D, 0x0E00000B,
    0x0F000011, 0x0F00000C, 0x10000010, 0x10000008, 0x13000001, 0x12000001, 0x13000000, 0x10000001,
];

/// 16x16
const TABLE_15: [u32; 256] = [
    0x03000007, 0x0400000C, 0x05000012, 0x07000035, 0x0700002F, 0x0800004C, 0x0900007C, 0x0900006C,
    0x09000059, 0x0A00007B, 0x0A00006C, 0x0B000077, 0x0B00006B, 0x0B000051, 0x0C00007A, 0x0D00003F,
    0x0400000D, 0x03000005, 0x05000010, 0x0600001B, 0x0700002E, 0x07000024, 0x0800003D, 0x08000033,
    0x0800002A, 0x09000046, 0x09000034, 0x0A000053, 0x0A000041, 0x0A000029, 0x0B00003B, 0x0B000024,
    0x05000013, 0x05000011, 0x0500000F, 0x06000018, 0x07000029, 0x07000022, 0x0800003B, 0x08000030,
    0x08000028, 0x09000040, 0x09000032, 0x0A00004E, 0x0A00003E, 0x0B000050, 0x0B000038, 0x0B000021,
    0x0600001D, 0x0600001C, 0x06000019, 0x0700002B, 0x07000027, 0x0800003F, 0x08000037, 0x0900005D,
    0x0900004C, 0x0900003B, 0x0A00005D, 0x0A000048, 0x0A000036, 0x0B00004B, 0x0B000032, 0x0B00001D,
    0x07000034, 0x06000016, 0x0700002A, 0x07000028, 0x08000043, 0x08000039, 0x0900005F, 0x0900004F,
    0x09000048, 0x09000039, 0x0A000059, 0x0A000045, 0x0A000031, 0x0B000042, 0x0B00002E, 0x0B00001B,
    0x0800004D, 0x07000025, 0x07000023, 0x08000042, 0x0800003A, 0x08000034, 0x0900005B, 0x0900004A,
    0x0900003E, 0x09000030, 0x0A00004F, 0x0A00003F, 0x0B00005A, 0x0B00003E, 0x0B000028, 0x0C000026,
    0x0900007D, 0x07000020, 0x0800003C, 0x08000038, 0x08000032, 0x0900005C, 0x0900004E, 0x09000041,
    0x09000037, 0x0A000057, 0x0A000047, 0x0A000033, 0x0B000049, 0x0B000033, 0x0C000046, 0x0C00001E,
    0x0900006D, 0x08000035, 0x08000031, 0x0900005E, 0x09000058, 0x0900004B, 0x09000042, 0x0A00007A,
    0x0A00005B, 0x0A000049, 0x0A000038, 0x0A00002A, 0x0B000040, 0x0B00002C, 0x0B000015, 0x0C000019,
    0x0900005A, 0x0800002B, 0x08000029, 0x0900004D, 0x09000049, 0x0900003F, 0x09000038, 0x0A00005C,
    0x0A00004D, 0x0A000042, 0x0A00002F, 0x0B000043, 0x0B000030, 0x0C000035, 0x0C000024, 0x0C000014,
    0x09000047, 0x08000022, 0x09000043, 0x0900003C, 0x0900003A, 0x09000031, 0x0A000058, 0x0A00004C,
    0x0A000043, 0x0B00006A, 0x0B000047, 0x0B000036, 0x0B000026, 0x0C000027, 0x0C000017, 0x0C00000F,
    0x0A00006D, 0x09000035, 0x09000033, 0x0900002F, 0x0A00005A, 0x0A000052, 0x0A00003A, 0x0A000039,
    0x0A000030, 0x0B000048, 0x0B000039, 0x0B000029, 0x0B000017, 0x0C00001B, 0x0D00003E, 0x0C000009,
    0x0A000056, 0x0900002A, 0x09000028, 0x09000025, 0x0A000046, 0x0A000040, 0x0A000034, 0x0A00002B,
    0x0B000046, 0x0B000037, 0x0B00002A, 0x0B000019, 0x0C00001D, 0x0C000012, 0x0C00000B, 0x0D00000B,
    0x0B000076, 0x0A000044, 0x0900001E, 0x0A000037, 0x0A000032, 0x0A00002E, 0x0B00004A, 0x0B000041,
    0x0B000031, 0x0B000027, 0x0B000018, 0x0B000010, 0x0C000016, 0x0C00000D, 0x0D00000E, 0x0D000007,
    0x0B00005B, 0x0A00002C, 0x0A000027, 0x0A000026, 0x0A000022, 0x0B00003F, 0x0B000034, 0x0B00002D,
    0x0B00001F, 0x0C000034, 0x0C00001C, 0x0C000013, 0x0C00000E, 0x0C000008, 0x0D000009, 0x0D000003,
    0x0C00007B, 0x0B00003C, 0x0B00003A, 0x0B000035, 0x0B00002F, 0x0B00002B, 0x0B000020, 0x0B000016,
    0x0C000025, 0x0C000018, 0x0C000011, 0x0C00000C, 0x0D00000F, 0x0D00000A, 0x0C000002, 0x0D000001,
    0x0C000047, 0x0B000025, 0x0B000022, 0x0B00001E, 0x0B00001C, 0x0B000014, 0x0B000011, 0x0C00001A,
    0x0C000015, 0x0C000010, 0x0C00000A, 0x0C000006, 0x0D000008, 0x0D000006, 0x0D000002, 0x0D000000,
];

/// 16x16, shared by tables 16-23
const TABLE_16: [u32; 256] = [
    0x01000001, 0x04000005, 0x0600000E, 0x0800002C, 0x0900004A, 0x0900003F, 0x0A00006E, 0x0A00005D,
    0x0B0000AC, 0x0B000095, 0x0B00008A, 0x0C0000F2, 0x0C0000E1, 0x0C0000C3, 0x0D000178, 0x09000011,
    0x03000003, 0x04000004, 0x0600000C, 0x07000014, 0x08000023, 0x0900003E, 0x09000035, 0x0900002F,
    0x0A000053, 0x0A00004B, 0x0A000044, 0x0B000077, 0x0C0000C9, 0x0B00006B, 0x0C0000CF, 0x08000009,
    0x0600000F, 0x0600000D, 0x07000017, 0x08000026, 0x09000043, 0x0900003A, 0x0A000067, 0x0A00005A,
    0x0B0000A1, 0x0A000048, 0x0B00007F, 0x0B000075, 0x0B00006E, 0x0C0000D1, 0x0C0000CE, 0x09000010,
    0x0800002D, 0x07000015, 0x08000027, 0x09000045, 0x09000040, 0x0A000072, 0x0A000063, 0x0A000057,
    0x0B00009E, 0x0B00008C, 0x0C0000FC, 0x0C0000D4, 0x0C0000C7, 0x0D000183, 0x0D00016D, 0x0A00001A,
    0x0900004B, 0x08000024, 0x09000044, 0x09000041, 0x0A000073, 0x0A000065, 0x0B0000B3, 0x0B0000A4,
    0x0B00009B, 0x0C000108, 0x0C0000F6, 0x0C0000E2, 0x0D00018B, 0x0D00017E, 0x0D00016A, 0x09000009,
    0x09000042, 0x0800001E, 0x0900003B, 0x09000038, 0x0A000066, 0x0B0000B9, 0x0B0000AD, 0x0C000109,
    0x0B00008E, 0x0C0000FD, 0x0C0000E8, 0x0D000190, 0x0D000184, 0x0D00017A, 0x0E0001BD, 0x0A000010,
    0x0A00006F, 0x09000036, 0x09000034, 0x0A000064, 0x0B0000B8, 0x0B0000B2, 0x0B0000A0, 0x0B000085,
    0x0C000101, 0x0C0000F4, 0x0C0000E4, 0x0C0000D9, 0x0D000181, 0x0D00016E, 0x0E0002CB, 0x0A00000A,
    0x0A000062, 0x09000030, 0x0A00005B, 0x0A000058, 0x0B0000A5, 0x0B00009D, 0x0B000094, 0x0C000105,
    0x0C0000F8, 0x0D000197, 0x0D00018D, 0x0D000174, 0x0D00017C, 0x0F000379, 0x0F000374, 0x0A000008,
    0x0A000055, 0x0A000054, 0x0A000051, 0x0B00009F, 0x0B00009C, 0x0B00008F, 0x0C000104, 0x0C0000F9,
    0x0D0001AB, 0x0D000191, 0x0D000188, 0x0D00017F, 0x0E0002D7, 0x0E0002C9, 0x0E0002C4, 0x0A000007,
    0x0B00009A, 0x0A00004C, 0x0A000049, 0x0B00008D, 0x0B000083, 0x0C000100, 0x0C0000F5, 0x0D0001AA,
    0x0D000196, 0x0D00018A, 0x0D000180, 0x0E0002DF, 0x0D000167, 0x0E0002C6, 0x0D000160, 0x0B00000B,
    0x0B00008B, 0x0B000081, 0x0A000043, 0x0B00007D, 0x0C0000F7, 0x0C0000E9, 0x0C0000E5, 0x0C0000DB,
    0x0D000189, 0x0E0002E7, 0x0E0002E1, 0x0E0002D0, 0x0F000375, 0x0F000372, 0x0E0001B7, 0x0A000004,
    0x0C0000F3, 0x0B000078, 0x0B000076, 0x0B000073, 0x0C0000E3, 0x0C0000DF, 0x0D00018C, 0x0E0002EA,
    0x0E0002E6, 0x0E0002E0, 0x0E0002D1, 0x0E0002C8, 0x0E0002C2, 0x0D0000DF, 0x0E0001B4, 0x0B000006,
    0x0C0000CA, 0x0C0000E0, 0x0C0000DE, 0x0C0000DA, 0x0C0000D8, 0x0D000185, 0x0D000182, 0x0D00017D,
    0x0D00016C, 0x0F000378, 0x0E0001BB, 0x0E0002C3, 0x0E0001B8, 0x0E0001B5, 0x100006C0, 0x0B000004,
    0x0E0002EB, 0x0C0000D3, 0x0C0000D2, 0x0C0000D0, 0x0D000172, 0x0D00017B, 0x0E0002DE, 0x0E0002D3,
    0x0E0002CA, 0x100006C7, 0x0F000373, 0x0F00036D, 0x0F00036C, 0x11000D83, 0x0F000361, 0x0B000002,
    0x0D000179, 0x0D000171, 0x0B000066, 0x0C0000BB, 0x0E0002D6, 0x0E0002D2, 0x0D000166, 0x0E0002C7,
    0x0E0002C5, 0x0F000362, 0x100006C6, 0x0F000367, 0x11000D82, 0x0F000366, 0x0E0001B2, 0x0B000000,
    0x0900000C, 0x0800000A, 0x08000007, 0x0900000B, 0x0900000A, 0x0A000011, 0x0A00000B, 0x0A000009,
    0x0B00000D, 0x0B00000C, 0x0B00000A, 0x0B000007, 0x0B000005, 0x0B000003, 0x0B000001, 0x08000003,
];

/// 16x16, shared by tables 24-31
const TABLE_24: [u32; 256] = [
    0x0400000F, 0x0400000D, 0x0600002E, 0x07000050, 0x08000092, 0x09000106, 0x090000F8, 0x0A0001B2,
    0x0A0001AA, 0x0B00029D, 0x0B00028D, 0x0B000289, 0x0B00026D, 0x0B000205, 0x0C000408, 0x09000058,
    0x0400000E, 0x0400000C, 0x05000015, 0x06000026, 0x07000047, 0x08000082, 0x0800007A, 0x090000D8,
    0x090000D1, 0x090000C6, 0x0A000147, 0x0A000159, 0x0A00013F, 0x0A000129, 0x0A000117, 0x0800002A,
    0x0600002F, 0x05000016, 0x06000029, 0x0700004A, 0x07000044, 0x08000080, 0x08000078, 0x090000DD,
    0x090000CF, 0x090000C2, 0x090000B6, 0x0A000154, 0x0A00013B, 0x0A000127, 0x0B00021D, 0x07000012,
    0x07000051, 0x06000027, 0x0700004B, 0x07000046, 0x08000086, 0x0800007D, 0x08000074, 0x090000DC,
    0x090000CC, 0x090000BE, 0x090000B2, 0x0A000145, 0x0A000137, 0x0A000125, 0x0A00010F, 0x07000010,
    0x08000093, 0x07000048, 0x07000045, 0x08000087, 0x0800007F, 0x08000076, 0x08000070, 0x090000D2,
    0x090000C8, 0x090000BC, 0x0A000160, 0x0A000143, 0x0A000132, 0x0A00011D, 0x0B00021C, 0x0700000E,
    0x09000107, 0x07000042, 0x08000081, 0x0800007E, 0x08000077, 0x08000072, 0x090000D6, 0x090000CA,
    0x090000C0, 0x090000B4, 0x0A000155, 0x0A00013D, 0x0A00012D, 0x0A000119, 0x0A000106, 0x0700000C,
    0x090000F9, 0x0800007B, 0x08000079, 0x08000075, 0x08000071, 0x090000D7, 0x090000CE, 0x090000C3,
    0x090000B9, 0x0A00015B, 0x0A00014A, 0x0A000134, 0x0A000123, 0x0A000110, 0x0B000208, 0x0700000A,
    0x0A0001B3, 0x08000073, 0x0800006F, 0x0800006D, 0x090000D3, 0x090000CB, 0x090000C4, 0x090000BB,
    0x0A000161, 0x0A00014C, 0x0A000139, 0x0A00012A, 0x0A00011B, 0x0B000213, 0x0B00017D, 0x08000011,
    0x0A0001AB, 0x090000D4, 0x090000D0, 0x090000CD, 0x090000C9, 0x090000C1, 0x090000BA, 0x090000B1,
    0x090000A9, 0x0A000140, 0x0A00012F, 0x0A00011E, 0x0A00010C, 0x0B000202, 0x0B000179, 0x08000010,
    0x0A00014F, 0x090000C7, 0x090000C5, 0x090000BF, 0x090000BD, 0x090000B5, 0x090000AE, 0x0A00014D,
    0x0A000141, 0x0A000131, 0x0A000121, 0x0A000113, 0x0B000209, 0x0B00017B, 0x0B000173, 0x0800000B,
    0x0B00029C, 0x090000B8, 0x090000B7, 0x090000B3, 0x090000AF, 0x0A000158, 0x0A00014B, 0x0A00013A,
    0x0A000130, 0x0A000122, 0x0A000115, 0x0B000212, 0x0B00017F, 0x0B000175, 0x0B00016E, 0x0800000A,
    0x0B00028C, 0x0A00015A, 0x090000AB, 0x090000A8, 0x090000A4, 0x0A00013E, 0x0A000135, 0x0A00012B,
    0x0A00011F, 0x0A000114, 0x0A000107, 0x0B000201, 0x0B000177, 0x0B000170, 0x0B00016A, 0x08000006,
    0x0B000288, 0x0A000142, 0x0A00013C, 0x0A000138, 0x0A000133, 0x0A00012E, 0x0A000124, 0x0A00011C,
    0x0A00010D, 0x0A000105, 0x0B000200, 0x0B000178, 0x0B000172, 0x0B00016C, 0x0B000167, 0x08000004,
    0x0B00026C, 0x0A00012C, 0x0A000128, 0x0A000126, 0x0A000120, 0x0A00011A, 0x0A000111, 0x0A00010A,
    0x0B000203, 0x0B00017C, 0x0B000176, 0x0B000171, 0x0B00016D, 0x0B000169, 0x0B000165, 0x08000002,
    0x0C000409, 0x0A000118, 0x0A000116, 0x0A000112, 0x0A00010B, 0x0A000108, 0x0A000103, 0x0B00017E,
    0x0B00017A, 0x0B000174, 0x0B00016F, 0x0B00016B, 0x0B000168, 0x0B000166, 0x0B000164, 0x08000000,
    0x0800002B, 0x07000014, 0x07000013, 0x07000011, 0x0700000F, 0x0700000D, 0x0700000B, 0x07000009,
    0x07000007, 0x07000006, 0x07000004, 0x08000007, 0x08000005, 0x08000003, 0x08000001, 0x04000003,
];

/// count1 table A, indexed by `vwxy`
const QUAD_A: [u32; 16] = [
    0x01000001, 0x04000005, 0x04000004, 0x05000005, 0x04000006, 0x06000005, 0x05000004, 0x06000004,
    0x04000007, 0x05000003, 0x05000006, 0x06000000, 0x05000007, 0x06000002, 0x06000003, 0x06000001,
];
