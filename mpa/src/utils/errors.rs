use std::io;

use crate::structs::header::MAX_FRAME_SIZE;

/// Returns `err` from the enclosing function when `level` is at or above the
/// state's `fail_level`, otherwise logs it at `level` and carries on.
#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        let level: ::log::Level = $level;
        if level <= $state.fail_level {
            return Err($err.into());
        }
        ::log::log!(level, "{}", $err);
    }};
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Invalid frame sync, read {0:#010X}")]
    InvalidSync(u32),

    #[error("Reserved layer in header {0:#010X}")]
    ReservedLayer(u32),

    #[error("Bitrate index 15 is invalid, header {0:#010X}")]
    InvalidBitrate(u32),

    #[error("Free format streams (bitrate index 0) are not supported")]
    FreeFormat,

    #[error("Reserved sampling frequency index, header {0:#010X}")]
    ReservedSamplingFrequency(u32),

    #[error("Frame body of {0} bytes exceeds the maximum of {MAX_FRAME_SIZE}")]
    FrameTooLarge(usize),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("More input data is required")]
    NeedMore,

    #[error("End of stream")]
    Eof,

    #[error("Stream is not seekable")]
    NotSeekable,

    #[error("Position {0} is outside of the stream")]
    OutOfRange(i64),

    #[error("I/O error: {0}")]
    Io(io::ErrorKind),
}

impl From<io::Error> for ReadError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => ReadError::Eof,
            kind => ReadError::Io(kind),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Bit allocation 15 is forbidden, subband {0}")]
    ForbiddenAllocation(usize),

    #[error("Bit reservoir underflow: main_data_begin = {wanted}, only {available} bytes kept")]
    ReservoirUnderflow { wanted: usize, available: usize },

    #[error("big_values must not exceed 288. Read {0}")]
    BigValuesTooLarge(u32),

    #[error("block_type 0 with window switching in granule {gr}, channel {ch}")]
    ReservedBlockType { gr: usize, ch: usize },

    #[error("part2_3_length of {needed} bits overruns {available} bits of main data")]
    MainDataOverrun { needed: u64, available: u64 },

    #[error("Huffman table {0} is reserved")]
    ReservedHuffmanTable(u8),

    #[error("Invalid Huffman code")]
    InvalidHuffmanCode,

    #[error("big_values overrun part2_3_length by {bits} bits")]
    HuffmanOverrun { bits: u64 },

    #[error("CRC mismatch: stored {stored:#06X}, calculated {calculated:#06X}")]
    CrcMismatch { stored: u16, calculated: u16 },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("Forced output rate {0} Hz is outside 1..=96000")]
    InvalidRate(u32),

    #[error("down_sample must be 0, 1 or 2. Got {0}")]
    InvalidDownSample(u8),

    #[error("Frame index size must be even, got {0}")]
    OddIndexSize(usize),

    #[error("Mono output and forced stereo are mutually exclusive")]
    MonoAndStereo,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Giving up resync after {0} bytes")]
    ResyncFail(u64),

    #[error("Lost sync at byte {0} and resync is disabled")]
    OutOfSync(u64),

    #[error("Reader failed: {0}")]
    Read(#[from] ReadError),

    #[error("Output buffer too small: {available} bytes, one frame needs {needed}")]
    NoSpace { needed: usize, available: usize },

    #[error("Cannot convert {native} Hz to {output} Hz")]
    BadRate { native: u32, output: u32 },

    #[error("Invalid decoder parameters: {0}")]
    Param(#[from] ParamError),

    #[error("Seeking from the end needs a known track length")]
    NoSeekFromEnd,

    #[error("Frame {frame}: {reason}")]
    Frame { frame: i64, reason: String },

    #[error("Stream stopped after an earlier error: {0}")]
    Failed(Box<DecodeError>),
}

impl DecodeError {
    pub(crate) fn frame(frame: i64, err: impl std::fmt::Display) -> Self {
        DecodeError::Frame {
            frame,
            reason: err.to_string(),
        }
    }
}
