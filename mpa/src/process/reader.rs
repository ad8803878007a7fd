//! Byte sources for the decoder.
//!
//! The core never opens files itself. It pulls bytes through [`Reader`]:
//!
//! - [`SeekableReader`]: any `Read + Seek` (files, cursors). Enables header
//!   lookahead, indexing and random access.
//! - [`StreamReader`]: forward-only `Read` (pipes, sockets).
//! - [`FeedReader`]: the caller pushes bytes. A read that cannot be satisfied
//!   rewinds to the last [`Reader::forget`] point and reports
//!   [`ReadError::NeedMore`], so an interrupted frame is re-read from its
//!   start once more data arrives.

use std::collections::VecDeque;
use std::io::{self, Read, Seek, SeekFrom};

use crate::utils::errors::ReadError;

pub trait Reader {
    /// Reads up to `buf.len()` bytes. Fewer bytes are returned only at end of stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError>;

    /// Absolute byte position of the next read.
    fn tell(&self) -> u64;

    /// Moves to an absolute position.
    fn seek(&mut self, pos: u64) -> Result<u64, ReadError>;

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ReadError> {
        if self.read(buf)? < buf.len() {
            return Err(ReadError::Eof);
        }
        Ok(())
    }

    fn skip(&mut self, n: u64) -> Result<(), ReadError> {
        let mut scratch = [0u8; 512];
        let mut left = n;
        while left > 0 {
            let chunk = left.min(scratch.len() as u64) as usize;
            self.read_exact(&mut scratch[..chunk])?;
            left -= chunk as u64;
        }
        Ok(())
    }

    fn back(&mut self, n: u64) -> Result<(), ReadError> {
        let pos = self.tell();
        if n > pos {
            return Err(ReadError::OutOfRange(pos as i64 - n as i64));
        }
        self.seek(pos - n).map(|_| ())
    }

    /// Total stream length, if known.
    fn len(&self) -> Option<u64> {
        None
    }

    fn is_seekable(&self) -> bool {
        false
    }

    /// Keeps data since the last `forget`, so short lookbacks work without seeking.
    fn is_buffered(&self) -> bool {
        false
    }

    /// Drops data before the current position.
    fn forget(&mut self) {}
}

/// Random access over any `Read + Seek`.
#[derive(Debug)]
pub struct SeekableReader<R: Read + Seek> {
    inner: R,
    pos: u64,
    len: u64,
}

impl<R: Read + Seek> SeekableReader<R> {
    pub fn new(mut inner: R) -> io::Result<Self> {
        let pos = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(pos))?;

        Ok(Self { inner, pos, len })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

fn read_full(inner: &mut impl Read, buf: &mut [u8]) -> Result<usize, ReadError> {
    let mut got = 0;
    while got < buf.len() {
        match inner.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(got)
}

impl<R: Read + Seek> Reader for SeekableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        let n = read_full(&mut self.inner, buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn seek(&mut self, pos: u64) -> Result<u64, ReadError> {
        if pos > self.len {
            return Err(ReadError::OutOfRange(pos as i64));
        }
        self.pos = self.inner.seek(SeekFrom::Start(pos))?;
        Ok(self.pos)
    }

    fn skip(&mut self, n: u64) -> Result<(), ReadError> {
        if self.pos + n > self.len {
            self.seek(self.len)?;
            return Err(ReadError::Eof);
        }
        self.seek(self.pos + n).map(|_| ())
    }

    fn len(&self) -> Option<u64> {
        Some(self.len)
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

/// Forward-only source such as a pipe.
#[derive(Debug)]
pub struct StreamReader<R: Read> {
    inner: R,
    pos: u64,
}

impl<R: Read> StreamReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }
}

impl<R: Read> Reader for StreamReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        let n = read_full(&mut self.inner, buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn seek(&mut self, pos: u64) -> Result<u64, ReadError> {
        if pos == self.pos {
            return Ok(pos);
        }
        Err(ReadError::NotSeekable)
    }
}

/// Caller-fed buffer. Bytes are kept from the last `forget` on.
#[derive(Debug, Default)]
pub struct FeedReader {
    buffer: VecDeque<u8>,
    /// Stream offset of `buffer[0]`.
    offset: u64,
    pos: usize,
    finished: bool,
}

impl FeedReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend(data);
    }

    /// Declares that no more data will come. Short reads then report end of stream.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Bytes fed but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buffer.len() - self.pos
    }

    /// Stream offset just past the last fed byte.
    pub fn end(&self) -> u64 {
        self.offset + self.buffer.len() as u64
    }

    /// Discards everything and declares `pos` as the offset of the next fed byte.
    pub fn reset_to(&mut self, pos: u64) {
        self.buffer.clear();
        self.offset = pos;
        self.pos = 0;
        self.finished = false;
    }

    fn shortfall(&mut self) -> ReadError {
        if self.finished {
            self.pos = self.buffer.len();
            ReadError::Eof
        } else {
            self.pos = 0;
            ReadError::NeedMore
        }
    }
}

impl Reader for FeedReader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        let available = self.buffer.len() - self.pos;
        if available < buf.len() && !self.finished {
            return Err(self.shortfall());
        }

        let n = available.min(buf.len());
        for (dst, src) in buf.iter_mut().zip(self.buffer.range(self.pos..self.pos + n)) {
            *dst = *src;
        }
        self.pos += n;
        Ok(n)
    }

    fn tell(&self) -> u64 {
        self.offset + self.pos as u64
    }

    fn seek(&mut self, pos: u64) -> Result<u64, ReadError> {
        if pos < self.offset || pos > self.offset + self.buffer.len() as u64 {
            return Err(ReadError::OutOfRange(pos as i64));
        }
        self.pos = (pos - self.offset) as usize;
        Ok(pos)
    }

    fn skip(&mut self, n: u64) -> Result<(), ReadError> {
        if ((self.buffer.len() - self.pos) as u64) < n {
            return Err(self.shortfall());
        }
        self.pos += n as usize;
        Ok(())
    }

    fn is_buffered(&self) -> bool {
        true
    }

    fn forget(&mut self) {
        self.buffer.drain(..self.pos);
        self.offset += self.pos as u64;
        self.pos = 0;
    }
}
