//! Data structures read from the bitstream.
//!
//! Frame headers and their derived geometry, the Xing/Info/LAME tag of the
//! first Layer III frame, and the frame offset index built while reading.

pub mod header;
pub mod index;
pub mod info_tag;
