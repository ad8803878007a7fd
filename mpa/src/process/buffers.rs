//! Two owned frame buffers used alternately.
//!
//! The frame being read goes into the slot that is not current. For Layer III
//! the tail of the previous frame's main data is copied in front of the new
//! body, so the bit reservoir is one contiguous slice that never points into
//! the other slot.

use crate::process::layer::FrameView;
use crate::process::layer::layer3::MAX_RESERVOIR;
use crate::process::reader::Reader;
use crate::structs::header::{FrameHeader, Layer};
use crate::utils::errors::ReadError;

#[derive(Debug, Clone, Default)]
struct FrameSlot {
    /// Reservoir carry followed by the frame body.
    data: Vec<u8>,
    body_start: usize,
    /// Start of main data, after the Layer III side information.
    main_start: usize,
}

impl FrameSlot {
    fn reservoir(&self) -> &[u8] {
        &self.data[..self.body_start]
    }

    fn main_data(&self) -> &[u8] {
        &self.data[self.main_start..]
    }
}

#[derive(Debug, Clone, Default)]
pub struct FrameBuffers {
    slots: [FrameSlot; 2],
    parity: usize,
}

impl FrameBuffers {
    /// Reads the body of `header` into the spare slot. The current slot stays
    /// current until [`FrameBuffers::commit`].
    pub fn load(&mut self, header: &FrameHeader, reader: &mut impl Reader) -> Result<(), ReadError> {
        let (first, second) = self.slots.split_at_mut(1);
        let (current, next) = if self.parity == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        };

        next.data.clear();
        if header.layer == Layer::III {
            let main = current.main_data();
            let reservoir = current.reservoir();
            let keep = MAX_RESERVOIR.min(reservoir.len() + main.len());
            let from_main = keep.min(main.len());
            let from_reservoir = keep - from_main;
            next.data
                .extend_from_slice(&reservoir[reservoir.len() - from_reservoir..]);
            next.data.extend_from_slice(&main[main.len() - from_main..]);
        }

        next.body_start = next.data.len();
        next.data.resize(next.body_start + header.framesize, 0);
        reader.read_exact(&mut next.data[next.body_start..])?;
        next.main_start = if header.layer == Layer::III {
            (next.body_start + header.side_info_size()).min(next.data.len())
        } else {
            next.data.len()
        };

        Ok(())
    }

    /// Makes the freshly loaded slot current.
    pub fn commit(&mut self) {
        self.parity ^= 1;
    }

    /// Body of the loaded but not yet committed frame.
    pub fn pending_body(&self) -> &[u8] {
        let slot = &self.slots[self.parity ^ 1];
        &slot.data[slot.body_start..]
    }

    pub fn current<'a>(&'a self, header: &'a FrameHeader) -> FrameView<'a> {
        let slot = &self.slots[self.parity];
        FrameView {
            header,
            reservoir: slot.reservoir(),
            body: &slot.data[slot.body_start..],
        }
    }

    /// Drops all buffered frames and the reservoir.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = FrameSlot::default();
        }
        self.parity = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::reader::FeedReader;
    use crate::process::testing::L3_STEREO;

    #[test]
    fn reservoir_carries_main_data() -> anyhow::Result<()> {
        let header = FrameHeader::parse(L3_STEREO)?;
        let mut reader = FeedReader::new();
        let first: Vec<u8> = (0..header.framesize).map(|i| i as u8).collect();
        let second = vec![0xEEu8; header.framesize];
        reader.feed(&first);
        reader.feed(&second);

        let mut buffers = FrameBuffers::default();
        buffers.load(&header, &mut reader)?;
        assert_eq!(buffers.pending_body(), &first[..]);
        buffers.commit();
        assert!(buffers.current(&header).reservoir.is_empty());

        buffers.load(&header, &mut reader)?;
        buffers.commit();
        let view = buffers.current(&header);
        assert_eq!(view.body, &second[..]);
        // main data only, side information excluded
        assert_eq!(view.reservoir, &first[32..]);

        // a third frame keeps at most 511 bytes
        reader.feed(&second);
        buffers.load(&header, &mut reader)?;
        buffers.commit();
        let view = buffers.current(&header);
        assert_eq!(view.reservoir.len(), MAX_RESERVOIR);
        assert_eq!(view.reservoir[MAX_RESERVOIR - 1], 0xEE);
        assert_eq!(view.reservoir[0], first[first.len() - (511 - 381)]);

        Ok(())
    }

    #[test]
    fn failed_load_keeps_current_frame() -> anyhow::Result<()> {
        let header = FrameHeader::parse(L3_STEREO)?;
        let mut reader = FeedReader::new();
        reader.feed(&vec![7u8; header.framesize]);

        let mut buffers = FrameBuffers::default();
        buffers.load(&header, &mut reader)?;
        buffers.commit();

        reader.feed(&[1, 2, 3]);
        assert_eq!(buffers.load(&header, &mut reader), Err(ReadError::NeedMore));
        assert_eq!(buffers.current(&header).body[0], 7);

        Ok(())
    }
}
