use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mpa::process::decode::Decoder;
use mpa::process::params::DecoderParams;
use mpa::process::reader::{Reader, SeekableReader};
use std::fs::File;
use std::path::Path;

/// Frame count for the progress bar, from the Info tag or a header scan.
pub fn estimate_total_frames(input_path: &Path, params: &DecoderParams) -> Result<Option<u64>> {
    log::info!("Counting frames for progress estimation");
    let count_start = std::time::Instant::now();

    let file = File::open(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;
    let mut decoder = Decoder::new(SeekableReader::new(file)?, params.clone())?;

    if let Err(e) = decoder.scan() {
        log::warn!("Frame count unavailable: {e}");
        return Ok(None);
    }

    let frames = decoder.track_frames();
    let bytes = decoder.reader().len().unwrap_or(0);
    let count_elapsed = count_start.elapsed();
    let read_speed_mbps = if count_elapsed.as_secs_f64() > 0.0 {
        (bytes as f64) / 1_000_000.0 / count_elapsed.as_secs_f64()
    } else {
        0.0
    };

    log::info!(
        "Found {frames} frames in {:.3}s ({:.1} MB/s, {} bytes)",
        count_elapsed.as_secs_f64(),
        read_speed_mbps,
        bytes
    );

    Ok(u64::try_from(frames).ok().filter(|&n| n > 0))
}

pub fn create_progress_bar(
    multi: &MultiProgress,
    total_frames: Option<u64>,
) -> Result<ProgressBar> {
    let pb = if let Some(total) = total_frames {
        let pb = multi.add(ProgressBar::new(total));
        pb.set_style(ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} frames ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
        )?);

        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    } else {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template(
            "{spinner:.green} {pos} frames\n{msg} | elapsed: {elapsed_precise}",
        )?);

        pb
    };
    pb.set_message("initializing decoder");
    Ok(pb)
}
