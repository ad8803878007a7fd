use std::io::{self, BufWriter, Seek, SeekFrom, Write};

use mpa::process::params::Encoding;
use mpad_macros::{ToBytes, riff_chunk};

use crate::byteorder::WriteBytesLe;

pub const WAVE_FORMAT_PCM: u16 = 1;
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 3;

pub trait RiffChunk {
    fn chunk_id(&self) -> &[u8; 4];
    fn chunk_data(&self) -> Vec<u8>;

    /// Writes id, size and data, padded to an even length.
    fn write_all<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let data = self.chunk_data();
        writer.write_all(self.chunk_id())?;
        writer.write_all(&(data.len() as u32).to_le_bytes())?;
        writer.write_all(&data)?;
        if data.len() % 2 == 1 {
            writer.write_all(&[0])?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, ToBytes)]
#[riff_chunk(b"fmt ")]
pub struct FormatChunk {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl FormatChunk {
    pub fn new(sample_rate: u32, channels: u16, encoding: Encoding) -> Self {
        let bytes = encoding.bytes_per_sample() as u16;
        let format_tag = match encoding {
            Encoding::Float32 => WAVE_FORMAT_IEEE_FLOAT,
            Encoding::Signed16 | Encoding::Unsigned8 => WAVE_FORMAT_PCM,
        };
        let block_align = channels * bytes;

        Self {
            format_tag,
            channels,
            sample_rate,
            byte_rate: sample_rate * block_align as u32,
            block_align,
            bits_per_sample: bytes * 8,
        }
    }
}

/// RIFF/WAVE writer for interleaved little-endian PCM.
pub struct WAVWriter<W: Write + Seek> {
    writer: BufWriter<W>,
    format: Option<FormatChunk>,
    riff_size_position: u64,
    data_size_position: u64,
    data_written: u64,
}

impl<W: Write + Seek> WAVWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            format: None,
            riff_size_position: 0,
            data_size_position: 0,
            data_written: 0,
        }
    }

    pub fn configure_audio_format(
        &mut self,
        sample_rate: u32,
        channels: u16,
        encoding: Encoding,
    ) -> io::Result<()> {
        if self.data_written > 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot change format after writing data",
            ));
        }

        self.format = Some(FormatChunk::new(sample_rate, channels, encoding));
        Ok(())
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        let format = self.format.as_ref().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "Audio format must be configured before writing the header",
            )
        })?;

        self.writer.write_all(b"RIFF")?;
        self.riff_size_position = self.writer.stream_position()?;
        self.writer.write_all(&0u32.to_le_bytes())?;
        self.writer.write_all(b"WAVE")?;

        format.write_all(&mut self.writer)?;

        self.writer.write_all(b"data")?;
        self.data_size_position = self.writer.stream_position()?;
        self.writer.write_all(&0u32.to_le_bytes())?;
        Ok(())
    }

    pub fn write_data(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.data_written += data.len() as u64;
        Ok(())
    }

    /// Pads the data chunk and fills in the chunk sizes. Sizes beyond 4 GiB are clamped.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.data_written % 2 == 1 {
            self.writer.write_all(&[0])?;
        }
        self.writer.flush()?;

        let end = self.writer.stream_position()?;
        let data_size = self.data_written.min(u32::MAX as u64) as u32;
        let riff_size = (end - 8).min(u32::MAX as u64) as u32;

        self.writer.seek(SeekFrom::Start(self.data_size_position))?;
        self.writer.write_all(&data_size.to_le_bytes())?;
        self.writer.seek(SeekFrom::Start(self.riff_size_position))?;
        self.writer.write_all(&riff_size.to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }

    pub fn data_written(&self) -> u64 {
        self.data_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// RIFF header, `fmt ` chunk and `data` chunk header.
    const HEADER_SIZE: u64 = 12 + 8 + 16 + 8;

    fn u32_at(buf: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
    }

    #[test]
    fn wave_header_and_sizes() -> io::Result<()> {
        let mut writer = WAVWriter::new(Cursor::new(Vec::new()));
        writer.configure_audio_format(44100, 2, Encoding::Signed16)?;
        writer.write_header()?;
        writer.write_data(&[1, 2, 3, 4, 5, 6, 7, 8])?;
        assert_eq!(writer.data_written(), 8);
        writer.finish()?;

        let buf = writer.into_inner()?.into_inner();
        assert_eq!(buf.len() as u64, HEADER_SIZE + 8);
        assert_eq!(&buf[0..4], b"RIFF");
        assert_eq!(u32_at(&buf, 4), 44);
        assert_eq!(&buf[8..16], b"WAVEfmt ");
        assert_eq!(u32_at(&buf, 16), 16);
        // format tag, channels
        assert_eq!(&buf[20..24], &[1, 0, 2, 0]);
        assert_eq!(u32_at(&buf, 24), 44100);
        assert_eq!(u32_at(&buf, 28), 44100 * 4);
        assert_eq!(&buf[32..36], &[4, 0, 16, 0]);
        assert_eq!(&buf[36..40], b"data");
        assert_eq!(u32_at(&buf, 40), 8);
        Ok(())
    }

    #[test]
    fn float_and_odd_length() -> io::Result<()> {
        let chunk = FormatChunk::new(48000, 1, Encoding::Float32);
        assert_eq!(chunk.format_tag, WAVE_FORMAT_IEEE_FLOAT);
        assert_eq!(chunk.bits_per_sample, 32);

        let mut writer = WAVWriter::new(Cursor::new(Vec::new()));
        writer.configure_audio_format(8000, 1, Encoding::Unsigned8)?;
        writer.write_header()?;
        writer.write_data(&[128, 129, 130])?;
        writer.finish()?;
        assert!(writer.configure_audio_format(8000, 2, Encoding::Unsigned8).is_err());

        let buf = writer.into_inner()?.into_inner();
        assert_eq!(u32_at(&buf, 40), 3);
        // pad byte is counted in the RIFF size but not in the data size
        assert_eq!(buf.len() as u64, HEADER_SIZE + 4);
        assert_eq!(u32_at(&buf, 4), buf.len() as u32 - 8);
        Ok(())
    }
}
