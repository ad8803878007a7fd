use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::Level;
use serde::Serialize;
use std::fs::File;
use std::io;

use super::command::{Cli, InfoArgs};
use crate::input::is_pipe;
use crate::timestamp::{samples_to_secs, time_str};
use mpa::process::decode::{Decoder, Status};
use mpa::process::params::DecoderParams;
use mpa::process::reader::{Reader, SeekableReader, StreamReader};

/// Everything `info` reports about a stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamReport {
    pub version: String,
    pub layer: u8,
    pub sample_rate: u32,
    pub channels: usize,
    pub mode: String,
    pub bitrate_kbps: u32,
    pub vbr: String,
    pub crc: bool,
    pub emphasis: u8,
    /// Exact when scanned or taken from an Info tag.
    pub frames: Option<i64>,
    pub samples: Option<i64>,
    pub duration_secs: Option<f64>,
    pub average_kbps: Option<f64>,
    pub info_tag: Option<TagReport>,
    pub id3: bool,
    pub junk_bytes: u64,
    pub resyncs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagReport {
    pub kind: String,
    pub frames: Option<u32>,
    pub bytes: Option<u32>,
    pub encoder: Option<String>,
    pub delay: Option<u16>,
    pub padding: Option<u16>,
}

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing MPEG audio stream: {}", args.input.display());

    let fail_level = if cli.strict {
        Level::Warn
    } else {
        Level::Error
    };

    let pb = match multi {
        Some(multi) if args.scan => {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb.set_message("Scanning frames...");
            Some(pb)
        }
        _ => None,
    };

    let report = if is_pipe(&args.input) {
        let reader = StreamReader::new(io::stdin().lock());
        analyze(reader, fail_level, args.scan)?
    } else {
        let file = File::open(&args.input)
            .with_context(|| format!("Failed to open {}", args.input.display()))?;
        analyze(SeekableReader::new(file)?, fail_level, args.scan)?
    };

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    match report {
        Some(report) if args.yaml => print!("{}", serde_yaml_ng::to_string(&report)?),
        Some(report) => print_report(&report),
        None => {
            println!("No MPEG audio frame found in the input.");
            println!("This doesn't appear to be an MPEG audio stream.");
        }
    }

    Ok(())
}

/// Reads the stream far enough to describe it; with `scan`, to the end.
pub fn analyze<R: Reader>(reader: R, fail_level: Level, scan: bool) -> Result<Option<StreamReport>> {
    let mut decoder = Decoder::new(reader, DecoderParams::default())?;
    decoder.set_fail_level(fail_level);

    let Some(format) = decoder.format()? else {
        return Ok(None);
    };
    let Some(info) = decoder.info() else {
        return Ok(None);
    };

    let info_tag = decoder.info_tag().map(|tag| TagReport {
        kind: format!("{:?}", tag.kind),
        frames: tag.frames,
        bytes: tag.bytes,
        encoder: tag.lame.as_ref().map(|lame| lame.encoder.trim().to_string()),
        delay: tag.lame.as_ref().map(|lame| lame.delay),
        padding: tag.lame.as_ref().map(|lame| lame.padding),
    });

    let mut walked = None;
    if scan {
        if decoder.reader().is_seekable() {
            decoder.scan()?;
        } else {
            walked = Some(walk(&mut decoder, format.sample_bytes())?);
        }
    }

    let (frames, samples) = match walked {
        Some((frames, samples)) => (Some(frames), Some(samples)),
        None => {
            let frames = decoder.track_frames();
            (Some(frames).filter(|&n| n > 0), decoder.length()?)
        }
    };

    let duration_secs = samples.map(|n| samples_to_secs(n.max(0) as u64, format.rate));
    let average_kbps = match (decoder.reader().len(), duration_secs) {
        (Some(len), Some(secs)) if secs > 0.0 => Some(len as f64 * 8.0 / secs / 1000.0),
        _ => None,
    };

    let stats = decoder.stats();
    Ok(Some(StreamReport {
        version: info.version.to_string(),
        layer: info.layer as u8,
        sample_rate: info.rate,
        channels: format.channels,
        mode: info.mode.to_string(),
        bitrate_kbps: info.bitrate,
        vbr: info.vbr.to_string(),
        crc: info.crc,
        emphasis: info.emphasis,
        frames,
        samples,
        duration_secs,
        average_kbps,
        info_tag,
        id3: decoder.meta_check().id3,
        junk_bytes: stats.junk_bytes,
        resyncs: stats.resyncs,
    }))
}

/// Decodes a forward-only stream to the end, counting frames and output samples.
fn walk<R: Reader>(decoder: &mut Decoder<R>, sample_bytes: usize) -> Result<(i64, i64)> {
    let mut frames = 0;
    let mut samples = 0;
    loop {
        match decoder.decode_frame()? {
            Status::Ok => {
                frames += 1;
                samples += (decoder.output().len() / sample_bytes.max(1)) as i64;
            }
            Status::NewFormat => {}
            Status::Done | Status::NeedMore => break,
        }
    }
    Ok((frames, samples))
}

fn print_report(report: &StreamReport) {
    println!();
    println!("MPEG Audio Stream Information");
    println!("=============================");
    println!();
    println!("Format                      {} Layer {}", report.version, roman(report.layer));
    println!("Sampling frequency          {} Hz", report.sample_rate);
    println!("Channel mode                {} ({} channel(s))", report.mode, report.channels);
    println!("Bitrate                     {} kbit/s ({})", report.bitrate_kbps, report.vbr);
    if let Some(avg) = report.average_kbps {
        println!("Average bitrate             {avg:.1} kbit/s");
    }
    println!("CRC protected               {}", yes_no(report.crc));
    if report.emphasis != 0 {
        println!("Emphasis                    {}", report.emphasis);
    }
    println!();

    match report.frames {
        Some(frames) => println!("Frames                      {frames}"),
        None => println!("Frames                      unknown (use --scan)"),
    }
    if let Some(samples) = report.samples {
        println!("Samples                     {samples}");
    }
    if let Some(secs) = report.duration_secs {
        println!("Duration                    {}", time_str(secs));
    }
    println!();

    if let Some(tag) = &report.info_tag {
        println!("Info tag                    {}", tag.kind);
        if let Some(encoder) = &tag.encoder {
            println!("Encoder                     {encoder}");
        }
        if let (Some(delay), Some(padding)) = (tag.delay, tag.padding) {
            println!("Gapless                     delay {delay}, padding {padding} samples");
        }
        println!();
    }

    println!("ID3v2 tag                   {}", yes_no(report.id3));
    if report.junk_bytes > 0 || report.resyncs > 0 {
        println!(
            "Skipped data                {} bytes in {} resync(s)",
            report.junk_bytes, report.resyncs
        );
    }
    println!();
}

fn roman(layer: u8) -> &'static str {
    match layer {
        1 => "I",
        2 => "II",
        _ => "III",
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpa::process::EXAMPLE_DATA;
    use std::io::Cursor;

    #[test]
    fn reports_layer_one_stream() -> anyhow::Result<()> {
        let reader = SeekableReader::new(Cursor::new(EXAMPLE_DATA))?;
        let report = analyze(reader, Level::Error, true)?.context("no report")?;

        assert_eq!(report.layer, 1);
        assert_eq!(report.sample_rate, 32000);
        assert_eq!(report.channels, 1);
        assert_eq!(report.frames, Some(3));
        assert!(report.info_tag.is_none());
        assert!(!report.id3);

        let yaml = serde_yaml_ng::to_string(&report)?;
        assert!(yaml.contains("layer: 1"));
        Ok(())
    }

    #[test]
    fn forward_only_scan_walks_the_stream() -> anyhow::Result<()> {
        let reader = StreamReader::new(Cursor::new(EXAMPLE_DATA));
        let report = analyze(reader, Level::Error, true)?.context("no report")?;
        assert_eq!(report.frames, Some(3));
        assert_eq!(report.samples, Some(3 * 384));
        assert_eq!(report.average_kbps, None);
        Ok(())
    }

    #[test]
    fn empty_input_has_no_report() -> anyhow::Result<()> {
        let reader = SeekableReader::new(Cursor::new(Vec::new()))?;
        assert!(analyze(reader, Level::Error, false)?.is_none());
        Ok(())
    }
}
