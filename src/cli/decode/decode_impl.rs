use super::decoder_thread::{DecoderThreadConfig, spawn_decoder_thread};
use super::handler::{DecodeHandler, FrameHandlerContext};
use super::progress::{create_progress_bar, estimate_total_frames};
use crate::cli::command::{Cli, DecodeArgs};
use crate::cli::config::resolve;
use crate::input::is_pipe;
use crate::timestamp::{samples_to_secs, time_str};
use anyhow::Result;
use indicatif::{MultiProgress, ProgressStyle};
use log::Level;
use std::sync::mpsc;

pub fn cmd_decode(args: &DecodeArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let settings = resolve(args)?;

    log::info!(
        "Decoding MPEG audio stream: {} (strict mode: {}, gapless: {})",
        args.input.display(),
        cli.strict,
        settings.params.gapless
    );

    let is_pipe = is_pipe(&args.input);
    let base_path = args.output_path.clone();

    if let Some(ref path) = base_path {
        log::info!("Output path specified: {}", path.display());
    }

    // Estimate total frames if needed
    let should_estimate = !args.no_estimate_progress && !is_pipe && multi.is_some();
    let total_frames = if should_estimate {
        estimate_total_frames(&args.input, &settings.params)?.map(|total| {
            let remaining = total.saturating_sub(args.start_frame.unwrap_or(0));
            args.frames.map_or(remaining, |max| remaining.min(max))
        })
    } else {
        if is_pipe {
            log::debug!("Skipping progress estimation for pipe input");
        } else if args.no_estimate_progress {
            log::debug!("Progress estimation disabled by --no-estimate-progress flag");
        }
        None
    };

    let pb = if let Some(multi) = multi {
        Some(create_progress_bar(multi, total_frames)?)
    } else {
        None
    };

    let fail_level = if cli.strict {
        Level::Warn
    } else {
        Level::Error
    };

    let (tx, rx) = mpsc::channel();
    let decode_thread = spawn_decoder_thread(DecoderThreadConfig {
        input_path: args.input.clone(),
        params: settings.params.clone(),
        fail_level,
        start_frame: args.start_frame,
        max_frames: args.frames,
        repeat: settings.repeat,
        tx,
        pb_clone: pb.clone(),
    });

    let mut handler = DecodeHandler::default();
    let start_time = std::time::Instant::now();

    while let Ok(result) = rx.recv() {
        match result {
            Ok(event) => {
                let ctx = FrameHandlerContext {
                    base_path: &base_path,
                    format: settings.format,
                    pb: &pb,
                    start_time,
                };
                handler.handle_event(event, &ctx)?;
            }
            Err(e) => {
                if let Some(pb) = pb {
                    pb.finish_with_message("decode failed");
                }
                return Err(e);
            }
        }
    }

    handler.finalize()?;

    match decode_thread.join() {
        Ok(Ok(())) => {
            finalize_progress_bar(
                &pb,
                total_frames,
                handler.decoded_samples,
                handler.final_sample_rate,
                start_time,
            );
            if handler.segments == 0 {
                log::warn!("No MPEG audio frame found");
            }
            log::info!(
                "Decoding completed successfully: {} samples ({})",
                handler.decoded_samples,
                time_str(samples_to_secs(
                    handler.decoded_samples,
                    handler.final_sample_rate
                ))
            );
        }
        Ok(Err(e)) => {
            if let Some(pb) = pb {
                pb.finish_with_message("decode failed");
            }
            return Err(e);
        }
        Err(_) => {
            if let Some(pb) = pb {
                pb.finish_with_message("decode thread panicked");
            }
            return Err(anyhow::anyhow!("Decode thread panicked"));
        }
    }

    Ok(())
}

fn finalize_progress_bar(
    pb: &Option<indicatif::ProgressBar>,
    total_frames: Option<u64>,
    decoded_samples: u64,
    final_sample_rate: u32,
    start_time: std::time::Instant,
) {
    if let Some(pb) = pb {
        let elapsed = start_time.elapsed();
        let audio_duration_secs = samples_to_secs(decoded_samples, final_sample_rate);
        let realtime_multiplier = audio_duration_secs / elapsed.as_secs_f64();
        let final_time_str = time_str(audio_duration_secs);

        if total_frames.is_some() {
            pb.set_style(
                ProgressStyle::with_template(
                    "{bar:40.cyan/blue} {pos}/{len} frames ({percent}%)\n{msg} | elapsed: {elapsed_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
        } else {
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} {pos} frames\n{msg} | elapsed: {elapsed_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
        }

        pb.finish_with_message(format!(
            "speed: {realtime_multiplier:.1}x | timestamp: {final_time_str}"
        ));
    }
}
