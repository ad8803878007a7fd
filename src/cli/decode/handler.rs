use super::output::{AudioWriter, segment_path};
use crate::cli::command::AudioFormat;
use crate::timestamp::{samples_to_secs, time_str};
use anyhow::Result;
use indicatif::ProgressBar;
use mpa::process::decode::OutputFormat;
use std::path::PathBuf;

/// What the decoder thread hands to the writing side.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeEvent {
    /// Output format for all PCM that follows.
    Format(OutputFormat),
    /// Interleaved samples in the last announced format.
    Pcm(Vec<u8>),
}

#[derive(Default)]
pub struct DecodeHandler {
    pub audio_writer: Option<AudioWriter>,
    pub current_audio_path: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    /// Number of format changes seen so far.
    pub segments: usize,
    pub decoded_chunks: u64,
    pub decoded_samples: u64,
    pub final_sample_rate: u32,
}

pub struct FrameHandlerContext<'a> {
    pub base_path: &'a Option<PathBuf>,
    pub format: AudioFormat,
    pub pb: &'a Option<ProgressBar>,
    pub start_time: std::time::Instant,
}

impl DecodeHandler {
    pub fn handle_event(&mut self, event: DecodeEvent, ctx: &FrameHandlerContext) -> Result<()> {
        match event {
            DecodeEvent::Format(format) => self.handle_format(format, ctx),
            DecodeEvent::Pcm(data) => self.handle_pcm(&data, ctx),
        }
    }

    fn handle_format(&mut self, format: OutputFormat, ctx: &FrameHandlerContext) -> Result<()> {
        if self.format == Some(format) {
            return Ok(());
        }

        log::info!(
            "Output format: {} Hz, {} channel(s), {:?}",
            format.rate,
            format.channels,
            format.encoding
        );

        if let Some(mut writer) = self.audio_writer.take() {
            writer.finish()?;
            if let Some(path) = &self.current_audio_path {
                log::debug!("Closed {}", path.display());
            }
        }

        if let Some(base_path) = ctx.base_path {
            let path = segment_path(base_path, ctx.format, self.segments);
            if self.segments > 0 {
                log::warn!("Format changed mid-stream, continuing in {}", path.display());
            }
            log::info!("Creating audio file: {}", path.display());
            self.audio_writer = Some(AudioWriter::create(&path, ctx.format, &format)?);
            self.current_audio_path = Some(path);
        }

        self.segments += 1;
        self.format = Some(format);
        self.final_sample_rate = format.rate;
        Ok(())
    }

    fn handle_pcm(&mut self, data: &[u8], ctx: &FrameHandlerContext) -> Result<()> {
        let Some(format) = self.format else {
            anyhow::bail!("Received audio before its format");
        };

        if let Some(writer) = &mut self.audio_writer {
            writer.write(data)?;
        }

        self.decoded_chunks += 1;
        self.decoded_samples += (data.len() / format.sample_bytes().max(1)) as u64;
        self.update_progress_display(ctx.start_time, ctx.pb);
        Ok(())
    }

    fn update_progress_display(&self, start_time: std::time::Instant, pb: &Option<ProgressBar>) {
        if !self.decoded_chunks.is_multiple_of(30) {
            return;
        }
        if let Some(pb) = pb {
            let audio_duration_secs = samples_to_secs(self.decoded_samples, self.final_sample_rate);
            let realtime_multiplier = audio_duration_secs / start_time.elapsed().as_secs_f64();
            pb.set_message(format!(
                "speed: {realtime_multiplier:.1}x | timestamp: {}",
                time_str(audio_duration_secs)
            ));
        }
    }

    pub fn finalize(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.audio_writer {
            writer.finish()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpa::process::params::Encoding;
    use std::fs;

    fn mono(rate: u32) -> OutputFormat {
        OutputFormat {
            rate,
            channels: 1,
            encoding: Encoding::Signed16,
        }
    }

    #[test]
    fn format_change_starts_a_new_file() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("mpad-handler-{}", std::process::id()));
        fs::create_dir_all(&dir)?;
        let base_path = Some(dir.join("out"));
        let ctx = FrameHandlerContext {
            base_path: &base_path,
            format: AudioFormat::Pcm,
            pb: &None,
            start_time: std::time::Instant::now(),
        };

        let mut handler = DecodeHandler::default();
        handler.handle_event(DecodeEvent::Format(mono(32000)), &ctx)?;
        handler.handle_event(DecodeEvent::Pcm(vec![0; 4]), &ctx)?;
        // a repeated announcement keeps the file
        handler.handle_event(DecodeEvent::Format(mono(32000)), &ctx)?;
        handler.handle_event(DecodeEvent::Pcm(vec![0; 4]), &ctx)?;
        handler.handle_event(DecodeEvent::Format(mono(44100)), &ctx)?;
        handler.handle_event(DecodeEvent::Pcm(vec![0; 6]), &ctx)?;
        handler.finalize()?;
        drop(handler.audio_writer.take());

        assert_eq!(handler.segments, 2);
        assert_eq!(handler.decoded_samples, 7);
        assert_eq!(handler.final_sample_rate, 44100);
        assert_eq!(fs::metadata(dir.join("out.pcm"))?.len(), 8);
        assert_eq!(fs::metadata(dir.join("out.1.pcm"))?.len(), 6);

        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn pcm_needs_a_format() {
        let ctx = FrameHandlerContext {
            base_path: &None,
            format: AudioFormat::Wav,
            pb: &None,
            start_time: std::time::Instant::now(),
        };
        let mut handler = DecodeHandler::default();
        assert!(handler.handle_event(DecodeEvent::Pcm(vec![0; 2]), &ctx).is_err());
    }
}
