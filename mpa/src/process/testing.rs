//! Synthetic streams for unit tests.

use crate::structs::header::FrameHeader;
use crate::structs::info_tag::InfoTag;

/// MPEG-1 Layer III, 128 kbit/s, 44.1 kHz, joint stereo: 417 byte frames.
pub const L3_STEREO: u32 = 0xFFFB_9064;
/// MPEG-1 Layer III, 128 kbit/s, 44.1 kHz, mono.
pub const L3_MONO: u32 = 0xFFFB_90C4;
/// MPEG-1 Layer I, 32 kbit/s, 32 kHz, mono: 48 byte frames.
pub const L1_MONO: u32 = 0xFFFF_18C0;
/// MPEG-1 Layer I, 128 kbit/s, 44.1 kHz, stereo: 136 byte frames.
pub const L1_STEREO: u32 = 0xFFFF_4000;
/// MPEG-1 Layer II, 192 kbit/s, 44.1 kHz, stereo: 626 byte frames.
pub const L2_STEREO: u32 = 0xFFFD_A000;
/// MPEG-2 Layer III, 64 kbit/s, 22.05 kHz, mono.
pub const L3_LSF_MONO: u32 = 0xFFF3_80C4;

/// MSB-first bit packer.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bits: usize,
}

impl BitWriter {
    /// Appends the low `bits` bits of `value`. Widths above 32 are zero extended.
    pub fn put(&mut self, value: u32, bits: u32) {
        for i in (0..bits).rev() {
            let bit = if i < 32 { (value >> i) & 1 } else { 0 };
            if self.bits % 8 == 0 {
                self.bytes.push(0);
            }
            if bit != 0 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 0x80 >> (self.bits % 8);
            }
            self.bits += 1;
        }
    }

    /// Pads with zeros to `len` bytes.
    pub fn finish(mut self, len: usize) -> Vec<u8> {
        assert!(self.bytes.len() <= len, "{} bytes do not fit {len}", self.bytes.len());
        self.bytes.resize(len, 0);
        self.bytes
    }
}

/// A whole frame with an all-zero body, which decodes to silence in every layer.
pub fn silent_frame(head: u32) -> Vec<u8> {
    let header = FrameHeader::parse(head).expect("valid test header");
    let mut frame = head.to_be_bytes().to_vec();
    frame.resize(header.frame_bytes(), 0);
    frame
}

/// `count` silent frames back to back.
pub fn silent_stream(head: u32, count: usize) -> Vec<u8> {
    let frame = silent_frame(head);
    frame.repeat(count)
}

/// Bytes that never contain a sync word.
pub fn junk(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 37 % 200) as u8).collect()
}

/// ID3v2.4 tag of `payload` bytes, size stored syncsafe.
pub fn id3v2(payload: usize) -> Vec<u8> {
    let size = payload as u32;
    let mut tag = b"ID3\x04\x00\x00".to_vec();
    tag.extend([
        (size >> 21) as u8 & 0x7F,
        (size >> 14) as u8 & 0x7F,
        (size >> 7) as u8 & 0x7F,
        size as u8 & 0x7F,
    ]);
    tag.resize(10 + payload, 0);
    tag
}

/// 128-byte ID3v1 tag.
pub fn id3v1() -> Vec<u8> {
    let mut tag = b"TAG".to_vec();
    tag.extend(b"title");
    tag.resize(128, 0x20);
    tag
}

/// RIFF/WAVE wrapper header for `data_len` bytes of MPEG data.
pub fn riff_header(data_len: u32) -> Vec<u8> {
    let mut out = b"RIFF".to_vec();
    out.extend((data_len + 36).to_le_bytes());
    out.extend(b"WAVEfmt ");
    out.extend(16u32.to_le_bytes());
    out.extend([0x55, 0x00, 0x02, 0x00, 0x44, 0xAC, 0x00, 0x00]);
    out.extend([0x00, 0x3E, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]);
    out.extend(b"data");
    out.extend(data_len.to_le_bytes());
    out
}

#[derive(Debug, Clone, Copy)]
pub struct LameFields {
    pub delay: u16,
    pub padding: u16,
    pub vbr_method: u8,
}

/// Body of a Layer III frame carrying an "Info" tag.
pub fn info_frame_body(header: &FrameHeader, frames: Option<u32>, lame: Option<LameFields>) -> Vec<u8> {
    let offset = InfoTag::offset(header);
    let mut w = BitWriter::default();
    w.put(0, offset as u32 * 8);
    for &b in b"Info" {
        w.put(b as u32, 8);
    }
    w.put(frames.map_or(0, |_| 1), 32);
    if let Some(frames) = frames {
        w.put(frames, 32);
    }

    if let Some(lame) = lame {
        for &b in b"LAME3.100" {
            w.put(b as u32, 8);
        }
        w.put(0, 4); // revision
        w.put(lame.vbr_method as u32, 4);
        w.put(180, 8); // lowpass / 100
        w.put(0, 32); // peak
        // radio gain: name 1, originator 3, negative, 6.5 dB
        w.put(1, 3);
        w.put(3, 3);
        w.put(1, 1);
        w.put(65, 9);
        w.put(0, 16); // audiophile gain
        w.put(0, 8); // flags
        w.put(0, 8); // ABR rate
        w.put(lame.delay as u32, 12);
        w.put(lame.padding as u32, 12);
    }

    w.finish(header.framesize)
}

/// A whole first frame holding an "Info" tag.
pub fn info_frame(head: u32, frames: Option<u32>, lame: Option<LameFields>) -> Vec<u8> {
    let header = FrameHeader::parse(head).expect("valid test header");
    let mut frame = head.to_be_bytes().to_vec();
    frame.extend(info_frame_body(&header, frames, lame));
    frame
}
