use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use mpa::process::params::{Encoding, MonoMode};
use serde::{Deserialize, Serialize};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nmpa ",
    env!("MPA_VERSION"),
    "\nbuilt ",
    env!("BUILD_TIMESTAMP"),
);

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Tools for inspecting and decoding MPEG-1/2/2.5 Layer I/II/III audio",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat broken frames as fatal errors instead of decoding them as silence.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decode the specified MPEG audio stream into PCM.
    Decode(DecodeArgs),

    /// Print stream information
    Info(InfoArgs),
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Input MPEG audio stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output path for audio files. Nothing is written without it.
    #[arg(long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Audio container for output [default: wav].
    #[arg(long, value_enum)]
    pub format: Option<AudioFormat>,

    /// Output sample rate in Hz; non-native rates are resampled.
    #[arg(long, value_name = "HZ")]
    pub rate: Option<u32>,

    /// Divide the native rate by 2^N (0-2).
    #[arg(long, value_name = "N")]
    pub down_sample: Option<u8>,

    /// Fold stereo streams into one channel.
    #[arg(long, value_enum)]
    pub mono: Option<MonoArg>,

    /// Duplicate mono streams into two channels.
    #[arg(long)]
    pub stereo: bool,

    /// Output sample encoding [default: s16].
    #[arg(long, value_enum)]
    pub encoding: Option<EncodingArg>,

    /// Keep encoder delay and padding.
    #[arg(long)]
    pub no_gapless: bool,

    /// Bytes searched for a new header after sync is lost (-1: unlimited).
    #[arg(long, value_name = "BYTES", allow_negative_numbers = true)]
    pub resync_limit: Option<i64>,

    /// Stop at the first broken header instead of searching for the next one.
    #[arg(long)]
    pub no_resync: bool,

    /// Start decoding at this frame. Needs a file input.
    #[arg(long, value_name = "N")]
    pub start_frame: Option<u64>,

    /// Decode at most this many frames.
    #[arg(long, value_name = "N")]
    pub frames: Option<u64>,

    /// Write every decoded frame N times.
    #[arg(long, value_name = "N")]
    pub halfspeed: Option<u32>,

    /// YAML file with decode settings. Command line flags take precedence.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Disable progress estimation
    #[arg(long)]
    pub no_estimate_progress: bool,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input MPEG audio stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Read the whole stream for exact frame count and duration.
    #[arg(long)]
    pub scan: bool,

    /// Print the report as YAML.
    #[arg(long)]
    pub yaml: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// RIFF/WAVE.
    #[default]
    Wav,
    /// Raw interleaved little-endian PCM.
    Pcm,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonoArg {
    Left,
    Right,
    /// Average of both channels.
    Mix,
}

impl From<MonoArg> for MonoMode {
    fn from(value: MonoArg) -> Self {
        match value {
            MonoArg::Left => MonoMode::Left,
            MonoArg::Right => MonoMode::Right,
            MonoArg::Mix => MonoMode::Mix,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingArg {
    /// Signed 16-bit.
    S16,
    /// Unsigned 8-bit.
    U8,
    /// 32-bit float.
    F32,
}

impl From<EncodingArg> for Encoding {
    fn from(value: EncodingArg) -> Self {
        match value {
            EncodingArg::S16 => Encoding::Signed16,
            EncodingArg::U8 => Encoding::Unsigned8,
            EncodingArg::F32 => Encoding::Float32,
        }
    }
}
