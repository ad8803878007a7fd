//! Decode window: which frames are decoded, skipped or cut short.
//!
//! Positions come in two units. `*_s` values count native input samples from
//! the start of the stream, `*_os` values count output samples after rate
//! conversion. Frames before `ignoreframe` are skipped without decoding,
//! frames in `ignoreframe..firstframe` are decoded to prime the synthesis
//! history and then discarded.
//!
//! Gapless trimming removes `begin_os` samples of encoder delay at the start
//! and everything after `end_os` when the total length is known.

use crate::process::ntom::{RateConverter, SampleScale};

/// Decoder delay of the reference Layer III decoder that encoders compensate for.
pub const GAPLESS_DELAY: i64 = 529;

#[derive(Debug, Clone)]
pub struct DecodeWindow {
    pub gapless: bool,
    pub begin_s: i64,
    pub end_s: i64,
    pub begin_os: i64,
    pub end_os: i64,
    pub firstframe: i64,
    /// Last frame that delivers output, -1 if open ended.
    pub lastframe: i64,
    pub ignoreframe: i64,
    /// Output samples dropped from the front of `firstframe`.
    pub firstoff: i64,
    /// Output samples kept from `lastframe`.
    pub lastoff: i64,
}

impl DecodeWindow {
    pub fn new(gapless: bool) -> Self {
        Self {
            gapless,
            begin_s: 0,
            end_s: 0,
            begin_os: 0,
            end_os: 0,
            firstframe: 0,
            lastframe: -1,
            ignoreframe: 0,
            firstoff: 0,
            lastoff: 0,
        }
    }

    /// Forgets everything but the gapless switch.
    pub fn reset(&mut self) {
        *self = Self::new(self.gapless);
    }

    /// Sets the trimmed range in native samples. `end <= 0` leaves the end open.
    pub fn init(&mut self, begin: i64, end: i64) {
        self.begin_s = begin;
        self.end_s = end;
        self.begin_os = 0;
        self.end_os = 0;
    }

    /// Converts the native range to output samples once the output mode is known.
    pub fn realinit(&mut self, scale: &SampleScale, ntom: &RateConverter) {
        self.begin_os = scale.ins2outs(ntom, self.begin_s);
        self.end_os = if self.end_s > 0 {
            scale.ins2outs(ntom, self.end_s)
        } else {
            0
        };
    }

    /// Fills in the end once the track length is known and no tag provided one.
    pub fn update_end(&mut self, total_samples: i64, scale: &SampleScale, ntom: &RateConverter) {
        if self.end_s <= 0 && total_samples > 0 {
            self.end_s = total_samples;
            self.end_os = scale.ins2outs(ntom, total_samples);
        }
    }

    fn compute_ignoreframe(&mut self, layer3: bool) {
        // Layer III needs two frames of history for the bit reservoir and overlap.
        let preshift = if layer3 { 2 } else { 0 };
        self.ignoreframe = (self.firstframe - preshift).max(0);
    }

    /// Starts decoding at frame `fe`, keeping the gapless front trim if `fe` is inside it.
    pub fn set_frameseek(&mut self, fe: i64, scale: &SampleScale, ntom: &RateConverter, layer3: bool) {
        self.firstframe = fe;
        if self.gapless {
            let beg_f = scale.frame_offset(ntom, self.begin_os);
            if fe <= beg_f {
                self.firstframe = beg_f;
                self.firstoff = self.begin_os - scale.frame_outs(ntom, beg_f);
            } else {
                self.firstoff = 0;
            }
            self.set_last(scale, ntom);
        } else {
            self.firstoff = 0;
            self.lastoff = 0;
            self.lastframe = -1;
        }
        self.compute_ignoreframe(layer3);
    }

    /// Starts decoding at raw output sample `sp`.
    pub fn set_seek(&mut self, sp: i64, scale: &SampleScale, ntom: &RateConverter, layer3: bool) {
        self.firstframe = scale.frame_offset(ntom, sp);
        self.firstoff = sp - scale.frame_outs(ntom, self.firstframe);
        if self.gapless {
            self.set_last(scale, ntom);
        }
        self.compute_ignoreframe(layer3);
    }

    fn set_last(&mut self, scale: &SampleScale, ntom: &RateConverter) {
        if self.end_os > 0 {
            self.lastframe = scale.frame_offset(ntom, self.end_os);
            self.lastoff = self.end_os - scale.frame_outs(ntom, self.lastframe);
        } else {
            self.lastframe = -1;
            self.lastoff = 0;
        }
    }

    /// Cuts the decoded bytes of frame `num`. `sample_bytes` is the size of
    /// one output sample across all channels.
    pub fn trim(&mut self, num: i64, pcm: &mut Vec<u8>, sample_bytes: usize) {
        if self.lastframe >= 0 && num >= self.lastframe {
            let keep = if num == self.lastframe {
                self.lastoff as usize * sample_bytes
            } else {
                0
            };
            pcm.truncate(keep);
        }

        if self.firstoff > 0 && num == self.firstframe {
            let drop = (self.firstoff as usize * sample_bytes).min(pcm.len());
            pcm.drain(..drop);
            self.firstoff = 0;
        }
    }

    /// Raw output position to the position the caller sees.
    pub fn adjust(&self, outs: i64) -> i64 {
        if !self.gapless {
            return outs;
        }
        let outs = if self.end_os > 0 {
            outs.min(self.end_os)
        } else {
            outs
        };
        (outs - self.begin_os).max(0)
    }

    /// Caller position back to a raw output position.
    pub fn unadjust(&self, pos: i64) -> i64 {
        if self.gapless { pos + self.begin_os } else { pos }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ntom::DownSample;

    fn native(spf: i64) -> SampleScale {
        SampleScale {
            mode: DownSample::Native,
            spf,
        }
    }

    #[test]
    fn front_trim_from_default_delay() {
        let scale = native(1152);
        let ntom = RateConverter::default();
        let mut window = DecodeWindow::new(true);
        window.init(GAPLESS_DELAY, 0);
        window.realinit(&scale, &ntom);
        window.set_frameseek(0, &scale, &ntom, true);

        assert_eq!(window.firstframe, 0);
        assert_eq!(window.firstoff, 529);
        assert_eq!(window.lastframe, -1);

        let mut pcm = vec![0u8; 1152 * 4];
        window.trim(0, &mut pcm, 4);
        assert_eq!(pcm.len(), (1152 - 529) * 4);

        // only once
        let mut pcm = vec![0u8; 1152 * 4];
        window.trim(0, &mut pcm, 4);
        assert_eq!(pcm.len(), 1152 * 4);
    }

    #[test]
    fn delay_spanning_frames() {
        let scale = native(576);
        let ntom = RateConverter::default();
        let mut window = DecodeWindow::new(true);
        window.init(GAPLESS_DELAY + 1105, 100 * 576 - 300);
        window.realinit(&scale, &ntom);
        window.set_frameseek(0, &scale, &ntom, true);

        assert_eq!(window.firstframe, 2);
        assert_eq!(window.firstoff, 1634 - 1152);
        assert_eq!(window.ignoreframe, 0);
        assert_eq!(window.lastframe, 99);
        assert_eq!(window.lastoff, 576 - 300);

        let mut last = vec![0u8; 576 * 2];
        window.trim(99, &mut last, 2);
        assert_eq!(last.len(), 276 * 2);

        let mut beyond = vec![0u8; 576 * 2];
        window.trim(100, &mut beyond, 2);
        assert!(beyond.is_empty());
    }

    #[test]
    fn sample_seek_sets_preroll() {
        let scale = native(1152);
        let ntom = RateConverter::default();
        let mut window = DecodeWindow::new(false);
        window.set_seek(10 * 1152 + 17, &scale, &ntom, true);
        assert_eq!(window.firstframe, 10);
        assert_eq!(window.firstoff, 17);
        assert_eq!(window.ignoreframe, 8);

        window.set_seek(5 * 1152, &scale, &ntom, false);
        assert_eq!(window.ignoreframe, 5);
    }

    #[test]
    fn position_adjustment() {
        let scale = native(1152);
        let ntom = RateConverter::default();
        let mut window = DecodeWindow::new(true);
        window.init(GAPLESS_DELAY, 0);
        window.realinit(&scale, &ntom);
        assert_eq!(window.adjust(1152), 1152 - 529);
        assert_eq!(window.adjust(100), 0);
        assert_eq!(window.unadjust(0), 529);

        window.update_end(11520, &scale, &ntom);
        assert_eq!(window.adjust(20000), 11520 - 529);

        let plain = DecodeWindow::new(false);
        assert_eq!(plain.adjust(1152), 1152);
    }
}
