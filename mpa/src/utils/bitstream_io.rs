//! Bit-granular reader over frame bodies.
//!
//! Wraps `bitstream_io`'s big-endian [`BitReader`] with bounds-checked
//! field extraction and the CRC helper used by protected frames.

use std::io;
use std::io::SeekFrom;

use bitstream_io::{BigEndian, BitRead, BitReader, UnsignedInteger};

use crate::utils::crc::{Crc16, crc16_bits};

const STACK_BUF_SIZE: usize = 64;

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, BigEndian>,
    len: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

fn out_of_bounds(what: &str, n: impl std::fmt::Display, at: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("{what}({n}): out of bounds bits at {at}"),
    )
}

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes << 3,
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> io::Result<bool> {
        self.bs.read_bit()
    }

    /// Reads an `n`-bit unsigned field, `n <= 32`.
    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        match self.bs.read_unsigned_var(n) {
            Ok(val) => Ok(val),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(out_of_bounds("get_n", n, self.bs.position_in_bits().unwrap_or(0)))
            }
            Err(e) => Err(e),
        }
    }

    #[inline(always)]
    pub fn seek(&mut self, offset: i64) -> io::Result<u64> {
        let position = self.position()?;
        if (offset < 0 && position as i64 + offset >= 0)
            || (offset >= 0 && self.available()? as i64 >= offset)
        {
            return self.bs.seek_bits(SeekFrom::Current(offset));
        }

        Err(out_of_bounds("seek", offset, position))
    }

    /// CRC over `len` bits starting at bit `start`, chained onto `crc`.
    /// The read position is left unchanged.
    pub fn crc16_check(&mut self, crc: &Crc16, init: u16, start: u64, len: u64) -> io::Result<u16> {
        if start + len > self.len {
            return Err(out_of_bounds("crc16_check", len, start));
        }
        let position = self.position()?;
        self.bs.seek_bits(SeekFrom::Start(start))?;

        let mut checksum = init;
        let mut remaining = len;
        let mut buf = [0u8; STACK_BUF_SIZE];
        while remaining >= 8 {
            let bytes = ((remaining >> 3) as usize).min(STACK_BUF_SIZE);
            for b in buf[..bytes].iter_mut() {
                *b = self.bs.read_unsigned_var(8)?;
            }
            checksum = crc.update(checksum, &buf[..bytes]);
            remaining -= (bytes as u64) << 3;
        }
        if remaining > 0 {
            let tail: u16 = self.bs.read_unsigned_var(remaining as u32)?;
            checksum = crc16_bits(crc.poly, checksum, tail, remaining as u32);
        }

        self.bs.seek_bits(SeekFrom::Start(position))?;

        Ok(checksum)
    }

    #[inline(always)]
    pub fn available(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits().map(|pos| self.len.saturating_sub(pos))
    }

    #[inline(always)]
    pub fn skip_n(&mut self, n: u32) -> io::Result<()> {
        if n as u64 > self.available()? {
            return Err(out_of_bounds("skip_n", n, self.position()?));
        }
        self.bs.skip(n)
    }

    #[inline(always)]
    pub fn position(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits()
    }

    pub fn len_bits(&self) -> u64 {
        self.len
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = buf.len() as u64;
        let read = io::Cursor::new(buf);

        Self::new(read, len)
    }
}

impl Default for BsIoSliceReader<'_> {
    fn default() -> Self {
        Self::from_slice(&[])
    }
}
