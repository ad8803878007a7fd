#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Decoder core for MPEG-1, MPEG-2 LSF and MPEG-2.5 audio, Layers I, II and III.
//!
//! ### Bitstream Organization
//!
//! A stream is a sequence of self-delimiting frames, each starting with a
//! 32-bit header. Frames may be preceded by ID3v2 tags, a RIFF/WAVE wrapper or
//! junk, and followed by an ID3v1 tag. Layer III frames share a bit reservoir,
//! so a frame's audio may begin in the bodies of earlier frames.
//!
//! ### Output
//!
//! - 16-bit signed, 8-bit unsigned or 32-bit float samples, interleaved
//! - native rate, half, quarter, or any rate through N:M conversion
//! - gapless trimming from the LAME tag
//!
//! ## Quick Start
//!
//! Steps for decoding a stream:
//!
//! 1. Create a [`process::decode::Decoder`] over a [`process::reader::Reader`],
//!    or a [`process::decode::FeedDecoder`] to push bytes yourself
//! 2. Query the output format with [`process::decode::Decoder::format`]
//! 3. Pull PCM with [`process::decode::Decoder::read`] or
//!    [`process::decode::Decoder::decode_frame`]
//!
//! ```rust,no_run
//! use mpa::process::decode::{FeedDecoder, Status};
//! use mpa::process::params::DecoderParams;
//! use mpa::process::EXAMPLE_DATA;
//!
//! let mut decoder = FeedDecoder::new_feed(DecoderParams::default())?;
//! decoder.feed(EXAMPLE_DATA);
//! decoder.finish();
//!
//! let mut pcm = vec![0u8; 4096];
//! loop {
//!     let (status, written) = decoder.read(&mut pcm)?;
//!     // use pcm[..written]
//!     match status {
//!         Status::NewFormat => println!("{:?}", decoder.format()?),
//!         Status::Ok => {}
//!         Status::NeedMore | Status::Done => break,
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Decoding pipeline.
///
/// 1. **Input** ([`process::reader`]): seekable, streaming and fed byte sources
///
/// 2. **Sync** ([`process::sync`]): header search, tag skipping and resync
///
/// 3. **Decoding** ([`process::layer`], [`process::synth`], [`process::ntom`]):
///    subband samples, synthesis and rate conversion
///
/// 4. **Output** ([`process::decode`], [`process::gapless`], [`process::seek`]):
///    the decoder state machine, trimming and random access
pub mod process;

/// Data structures read from the bitstream.
///
/// - **Headers** ([`structs::header`]): frame header fields and frame geometry
/// - **Info Tags** ([`structs::info_tag`]): Xing/Info and LAME metadata
/// - **Index** ([`structs::index`]): frame offsets for seeking
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **CRC Validation** ([`utils::crc`]): Error detection
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
