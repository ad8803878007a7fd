//! CRC-16 used by protected MPEG audio frames.
//!
//! The checksum covers the last two header bytes followed by the protected
//! part of the side information, which is not byte aligned for Layer I/II.
//! [`Crc16::update_bits`] handles the trailing partial byte.

/// CRC algorithm specification with polynomial and initial value.
pub struct Algorithm<T> {
    poly: T,
    init: T,
}

/// CRC-16 with generator x^16 + x^15 + x^2 + 1, register preset to all ones.
pub const CRC_MPEG_AUDIO_ALG: Algorithm<u16> = Algorithm {
    poly: 0x8005,
    init: 0xFFFF,
};

/// Shifts `len` message bits (MSB first, right aligned in `bits`) through the register.
#[inline(always)]
pub const fn crc16_bits(poly: u16, mut crc: u16, bits: u16, len: u32) -> u16 {
    let mut i = len;
    while i > 0 {
        i -= 1;
        let feedback = ((crc >> 15) ^ (bits >> i)) & 1;
        crc <<= 1;
        if feedback != 0 {
            crc ^= poly;
        }
    }

    crc
}

const fn crc16_table(poly: u16) -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < table.len() {
        table[i] = crc16_register(poly, (i as u16) << 8);
        i += 1;
    }

    table
}

const fn crc16_register(poly: u16, mut value: u16) -> u16 {
    let mut i = 0;
    while i < 8 {
        value = if value & 0x8000 != 0 {
            (value << 1) ^ poly
        } else {
            value << 1
        };
        i += 1;
    }

    value
}

#[derive(Debug)]
pub struct Crc16 {
    pub poly: u16,
    pub init: u16,
    table: [u16; 256],
}

impl Crc16 {
    pub const fn new(algorithm: &Algorithm<u16>) -> Self {
        Self {
            poly: algorithm.poly,
            init: algorithm.init,
            table: crc16_table(algorithm.poly),
        }
    }

    #[inline(always)]
    pub const fn update(&self, mut crc: u16, bytes: &[u8]) -> u16 {
        let mut i = 0;
        while i < bytes.len() {
            crc = (crc << 8) ^ self.table[((crc >> 8) as u8 ^ bytes[i]) as usize];
            i += 1;
        }

        crc
    }

    /// Feeds the first `len` bits of `bytes`.
    pub fn update_bits(&self, crc: u16, bytes: &[u8], len: usize) -> u16 {
        let whole = len >> 3;
        let crc = self.update(crc, &bytes[..whole]);

        match len & 7 {
            0 => crc,
            rest => {
                let bits = (bytes[whole] >> (8 - rest)) as u16;
                crc16_bits(self.poly, crc, bits, rest as u32)
            }
        }
    }
}

pub static MPEG_CRC: Crc16 = Crc16::new(&CRC_MPEG_AUDIO_ALG);
