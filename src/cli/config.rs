//! Decode settings from a YAML file, merged with the command line.
//!
//! ```yaml
//! format: wav
//! rate: 48000
//! encoding: f32
//! gapless: false
//! resync_limit: -1
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use mpa::process::params::DecoderParams;
use serde::Deserialize;

use super::command::{AudioFormat, DecodeArgs, EncodingArg, MonoArg};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeConfig {
    pub format: Option<AudioFormat>,
    pub rate: Option<u32>,
    pub down_sample: Option<u8>,
    pub mono: Option<MonoArg>,
    pub stereo: Option<bool>,
    pub encoding: Option<EncodingArg>,
    pub gapless: Option<bool>,
    pub resync_limit: Option<i64>,
    pub no_resync: Option<bool>,
    pub index_size: Option<usize>,
    pub halfspeed: Option<u32>,
}

/// Everything the decode command needs after merging.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeSettings {
    pub params: DecoderParams,
    pub format: AudioFormat,
    /// Times each decoded frame is written.
    pub repeat: u32,
}

impl DecodeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Overrides values with the flags given on the command line.
    pub fn merge_args(mut self, args: &DecodeArgs) -> Self {
        self.format = args.format.or(self.format);
        self.rate = args.rate.or(self.rate);
        self.down_sample = args.down_sample.or(self.down_sample);
        self.mono = args.mono.or(self.mono);
        self.encoding = args.encoding.or(self.encoding);
        self.resync_limit = args.resync_limit.or(self.resync_limit);
        self.halfspeed = args.halfspeed.or(self.halfspeed);
        if args.stereo {
            self.stereo = Some(true);
        }
        if args.no_gapless {
            self.gapless = Some(false);
        }
        if args.no_resync {
            self.no_resync = Some(true);
        }
        self
    }

    pub fn settings(&self) -> Result<DecodeSettings> {
        let defaults = DecoderParams::default();
        let params = DecoderParams {
            gapless: self.gapless.unwrap_or(defaults.gapless),
            mono: self.mono.map(Into::into),
            force_stereo: self.stereo.unwrap_or(defaults.force_stereo),
            encoding: self.encoding.map_or(defaults.encoding, Into::into),
            force_rate: self.rate,
            down_sample: self.down_sample.unwrap_or(defaults.down_sample),
            resync_limit: self.resync_limit.unwrap_or(defaults.resync_limit),
            no_resync: self.no_resync.unwrap_or(defaults.no_resync),
            index_size: self.index_size.unwrap_or(defaults.index_size),
        };
        params.validate()?;

        Ok(DecodeSettings {
            params,
            format: self.format.unwrap_or_default(),
            repeat: self.halfspeed.unwrap_or(1).max(1),
        })
    }
}

/// Reads `--config` if given and applies the command line on top.
pub fn resolve(args: &DecodeArgs) -> Result<DecodeSettings> {
    let config = match &args.config {
        Some(path) => DecodeConfig::load(path)?,
        None => DecodeConfig::default(),
    };
    config.merge_args(args).settings()
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use mpa::process::params::{Encoding, MonoMode};

    use super::*;
    use crate::cli::command::{Cli, Commands};

    fn decode_args(argv: &[&str]) -> DecodeArgs {
        let mut full = vec!["mpad", "decode", "in.mp3"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Decode(args) => args,
            Commands::Info(_) => unreachable!(),
        }
    }

    #[test]
    fn defaults_without_config() -> anyhow::Result<()> {
        let settings = resolve(&decode_args(&[]))?;
        assert_eq!(settings.params, DecoderParams::default());
        assert_eq!(settings.format, AudioFormat::Wav);
        assert_eq!(settings.repeat, 1);
        Ok(())
    }

    #[test]
    fn flags_override_config() -> anyhow::Result<()> {
        let config = DecodeConfig::parse(
            "format: pcm\nrate: 48000\nencoding: f32\ngapless: true\nmono: left\nresync_limit: -1\nhalfspeed: 2\n",
        )?;
        assert_eq!(config.rate, Some(48000));

        let args = decode_args(&["--rate", "22050", "--no-gapless", "--mono", "mix", "--resync-limit", "-1"]);
        let settings = config.merge_args(&args).settings()?;

        assert_eq!(settings.format, AudioFormat::Pcm);
        assert_eq!(settings.repeat, 2);
        assert_eq!(settings.params.force_rate, Some(22050));
        assert_eq!(settings.params.encoding, Encoding::Float32);
        assert_eq!(settings.params.mono, Some(MonoMode::Mix));
        assert!(!settings.params.gapless);
        assert_eq!(settings.params.resync_limit, -1);
        Ok(())
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(DecodeConfig::parse("rate: 48000\nunknown: 1\n").is_err());
        assert!(DecodeConfig::parse("").is_ok());

        let args = decode_args(&["--mono", "left", "--stereo"]);
        assert!(DecodeConfig::default().merge_args(&args).settings().is_err());
        let args = decode_args(&["--down-sample", "3"]);
        assert!(DecodeConfig::default().merge_args(&args).settings().is_err());
    }
}
