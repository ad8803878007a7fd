use super::handler::DecodeEvent;
use super::processor::{ProcessFramesContext, process_frames};
use crate::input::{InputReader, is_pipe};
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use log::Level;
use mpa::process::decode::{Decoder, FeedDecoder};
use mpa::process::params::DecoderParams;
use mpa::process::reader::SeekableReader;
use std::fs::File;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

pub struct DecoderThreadConfig {
    pub input_path: PathBuf,
    pub params: DecoderParams,
    pub fail_level: Level,
    pub start_frame: Option<u64>,
    pub max_frames: Option<u64>,
    pub repeat: u32,
    pub tx: mpsc::Sender<Result<DecodeEvent>>,
    pub pb_clone: Option<ProgressBar>,
}

pub fn spawn_decoder_thread(config: DecoderThreadConfig) -> thread::JoinHandle<Result<()>> {
    thread::spawn(move || -> Result<()> {
        let DecoderThreadConfig {
            input_path,
            params,
            fail_level,
            start_frame,
            max_frames,
            repeat,
            tx,
            pb_clone,
        } = config;

        let mut ctx = ProcessFramesContext {
            tx: &tx,
            pb_clone: &pb_clone,
            frames_decoded: 0,
            clipped: 0,
            max_frames,
            repeat,
        };

        match start_frame {
            Some(start) => {
                if is_pipe(&input_path) {
                    anyhow::bail!("--start-frame needs a seekable file, not a pipe");
                }

                let file = File::open(&input_path)
                    .with_context(|| format!("Failed to open {}", input_path.display()))?;
                let mut decoder = Decoder::new(SeekableReader::new(file)?, params)?;
                decoder.set_fail_level(fail_level);

                let landed = decoder.seek_frame(SeekFrom::Start(start))?;
                log::info!("Starting at frame {landed}");
                process_frames(&mut decoder, &mut ctx)?;
            }
            None => {
                let mut decoder = FeedDecoder::new_feed(params)?;
                decoder.set_fail_level(fail_level);

                let mut input_reader = InputReader::new(&input_path)?;
                let mut stopped = false;
                input_reader.process_chunks(64 * 1024, |chunk| {
                    decoder.feed(chunk);
                    stopped = process_frames(&mut decoder, &mut ctx)?;
                    Ok(!stopped)
                })?;

                if !stopped {
                    decoder.finish();
                    process_frames(&mut decoder, &mut ctx)?;
                }

                let stats = decoder.stats();
                if stats.junk_bytes > 0 {
                    log::info!(
                        "Skipped {} bytes of junk in {} resync(s)",
                        stats.junk_bytes,
                        stats.resyncs
                    );
                }
            }
        }

        if ctx.clipped > 0 {
            log::warn!("{} samples were clipped", ctx.clipped);
        }
        log::info!("Processing complete: {} frames", ctx.frames_decoded);
        Ok(())
    })
}
