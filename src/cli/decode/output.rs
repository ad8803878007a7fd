use crate::wav::WAVWriter;
use anyhow::{Context, Result};
use mpa::process::decode::OutputFormat;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::super::command::AudioFormat;

pub fn create_path_with_extension(base_path: &Path, expected_ext: &str) -> PathBuf {
    match (base_path.extension(), base_path.file_name()) {
        (Some(existing_ext), _) if existing_ext == expected_ext => base_path.to_path_buf(),
        (Some(_), Some(name)) => {
            let mut path = base_path.to_path_buf();
            path.set_file_name(format!("{}.{expected_ext}", name.to_string_lossy()));
            path
        }
        _ => base_path.with_extension(expected_ext),
    }
}

/// Output file for a segment. A stream that changes format mid-way gets one
/// file per format, numbered from the second onwards: `out.wav`, `out.1.wav`.
pub fn segment_path(base_path: &Path, format: AudioFormat, segment: usize) -> PathBuf {
    let ext = match format {
        AudioFormat::Wav => "wav",
        AudioFormat::Pcm => "pcm",
    };

    let path = create_path_with_extension(base_path, ext);
    if segment == 0 {
        return path;
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}.{segment}.{ext}"))
}

pub enum AudioWriter {
    Pcm(BufWriter<File>),
    Wav(WAVWriter<File>),
}

impl AudioWriter {
    pub fn create(path: &Path, container: AudioFormat, format: &OutputFormat) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        match container {
            AudioFormat::Pcm => Ok(AudioWriter::Pcm(BufWriter::new(file))),
            AudioFormat::Wav => {
                let channels = u16::try_from(format.channels)
                    .context("Channel count does not fit a WAVE header")?;
                let mut wav_writer = WAVWriter::new(file);
                wav_writer.configure_audio_format(format.rate, channels, format.encoding)?;
                wav_writer.write_header()?;
                Ok(AudioWriter::Wav(wav_writer))
            }
        }
    }

    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        match self {
            AudioWriter::Pcm(pcm_writer) => pcm_writer.write_all(data)?,
            AudioWriter::Wav(wav_writer) => wav_writer.write_data(data)?,
        }
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        match self {
            AudioWriter::Pcm(pcm_writer) => pcm_writer.flush()?,
            AudioWriter::Wav(wav_writer) => wav_writer.finish()?,
        }
        Ok(())
    }
}
