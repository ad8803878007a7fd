//! Sparse frame-number to byte-offset table for seeking.
//!
//! Entry `i` holds the offset of frame `i * step`. When the table is full the
//! step doubles and every other entry is dropped, so the table keeps covering
//! the whole stream within a fixed budget.

use log::debug;

/// Default number of index entries.
pub const INDEX_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct FrameIndex {
    data: Vec<u64>,
    size: usize,
    step: i64,
    /// Frame number of the next entry to record.
    next: i64,
}

impl Default for FrameIndex {
    fn default() -> Self {
        Self::new(INDEX_SIZE)
    }
}

impl FrameIndex {
    /// `size` must be even; 0 disables indexing.
    pub fn new(size: usize) -> Self {
        Self {
            data: Vec::with_capacity(size),
            size,
            step: 1,
            next: 0,
        }
    }

    pub fn reset(&mut self) {
        self.data.clear();
        self.step = 1;
        self.next = 0;
    }

    /// Offers the offset of frame `num`. Frames must be offered in order.
    pub fn insert(&mut self, num: i64, pos: u64) {
        if self.size == 0 || num != self.next {
            return;
        }

        if self.data.len() == self.size {
            self.shrink();
        }
        self.data.push(pos);
        self.next += self.step;
    }

    fn shrink(&mut self) {
        let kept: Vec<u64> = self.data.iter().step_by(2).copied().collect();
        self.data = kept;
        self.step *= 2;
        self.next = self.data.len() as i64 * self.step;
        debug!("Frame index full, step is now {}", self.step);
    }

    /// Closest indexed frame at or before `want`, as `(offset, frame)`.
    pub fn find(&self, want: i64) -> Option<(u64, i64)> {
        if self.data.is_empty() {
            return None;
        }

        let fi = (want.max(0) / self.step).min(self.data.len() as i64 - 1);
        Some((self.data[fi as usize], fi * self.step))
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn fill(&self) -> usize {
        self.data.len()
    }

    pub fn entries(&self) -> &[u64] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubling_keeps_coverage() {
        let mut index = FrameIndex::new(4);
        for num in 0..9 {
            index.insert(num, num as u64 * 100);
        }

        // 0,1,2,3 -> full at 4 -> 0,2 (step 2) -> 0,2,4,6 -> full at 8 -> 0,4 then 8
        assert_eq!(index.step(), 4);
        assert_eq!(index.entries(), &[0, 400, 800]);
        assert_eq!(index.find(7), Some((400, 4)));
        assert_eq!(index.find(100), Some((800, 8)));
        assert_eq!(index.find(-3), Some((0, 0)));
    }

    #[test]
    fn skips_out_of_step_frames() {
        let mut index = FrameIndex::new(4);
        index.insert(0, 10);
        index.insert(5, 50);
        index.insert(1, 20);
        assert_eq!(index.entries(), &[10, 20]);
    }

    #[test]
    fn empty_and_disabled() {
        let mut index = FrameIndex::new(0);
        index.insert(0, 0);
        assert_eq!(index.find(3), None);
        assert_eq!(index.fill(), 0);
    }
}
