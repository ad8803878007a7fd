//! Fractional N:M rate conversion and sample position bookkeeping.
//!
//! The synthesis filter runs once per subband row (32 input samples per
//! channel). For every input sample an accumulator advances by
//! `step = out_rate * NTOM_MUL / native_rate`, and one output sample is
//! emitted for each multiple of `NTOM_MUL` crossed.
//!
//! Position queries ([`RateConverter::frame_outs`] and friends) replay the
//! same recurrence from the start value instead of using a closed-form
//! product, so large offsets never overflow and always agree with what the
//! filter actually emitted.

use crate::utils::errors::DecodeError;

pub const NTOM_MUL: u64 = 32768;
/// Largest upsampling ratio.
pub const NTOM_MAX: u64 = 8;
pub const NTOM_MAX_FREQ: u32 = 96000;

#[derive(Debug, Clone, Default)]
pub struct RateConverter {
    step: u64,
    spf: u64,
    /// Live accumulators. Channel 0 copies its start value into slot 1 so both
    /// channels of a row emit the same number of samples.
    val: [u64; 2],
}

impl RateConverter {
    /// Configures `native -> output` conversion and re-derives the accumulators for frame `num`.
    pub fn set_step(
        &mut self,
        native: u32,
        output: u32,
        spf: usize,
        num: i64,
    ) -> Result<(), DecodeError> {
        let bad = DecodeError::BadRate { native, output };
        if native == 0 || output == 0 || native > NTOM_MAX_FREQ || output > NTOM_MAX_FREQ {
            return Err(bad);
        }

        let step = output as u64 * NTOM_MUL / native as u64;
        if step > NTOM_MAX * NTOM_MUL {
            return Err(bad);
        }

        self.step = step;
        self.spf = spf as u64;
        self.set_ntom(num);
        Ok(())
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    /// Resets both accumulators to their value at the start of `frame`.
    pub fn set_ntom(&mut self, frame: i64) {
        let v = self.ntom_val(frame);
        self.val = [v, v];
    }

    /// Accumulator value at the start of `frame`.
    pub fn ntom_val(&self, frame: i64) -> u64 {
        let mut ntm = NTOM_MUL >> 1;
        for _ in 0..frame.max(0) {
            ntm += self.spf * self.step;
            ntm -= (ntm / NTOM_MUL) * NTOM_MUL;
        }
        ntm
    }

    /// Output samples produced by frames `0..frame`.
    pub fn frame_outs(&self, frame: i64) -> i64 {
        let mut ntm = self.ntom_val(0);
        let mut soff = 0;
        for _ in 0..frame.max(0) {
            ntm += self.spf * self.step;
            soff += (ntm / NTOM_MUL) as i64;
            ntm -= (ntm / NTOM_MUL) * NTOM_MUL;
        }
        soff
    }

    /// Output samples corresponding to `ins` input samples from the stream start.
    pub fn ins2outs(&self, ins: i64) -> i64 {
        if ins <= 0 || self.spf == 0 {
            return 0;
        }

        let block = self.spf as i64;
        let mut ntm = self.ntom_val(0);
        let mut soff = 0;
        let mut left = ins;
        while left > 0 {
            let now = left.min(block);
            ntm += now as u64 * self.step;
            soff += (ntm / NTOM_MUL) as i64;
            ntm -= (ntm / NTOM_MUL) * NTOM_MUL;
            left -= now;
        }
        soff
    }

    /// Frame that contains output sample `soff`.
    pub fn frame_offset(&self, soff: i64) -> i64 {
        if soff <= 0 || self.step == 0 {
            return 0;
        }

        let mut ntm = self.ntom_val(0);
        let mut left = soff;
        let mut frame = 0;
        loop {
            ntm += self.spf * self.step;
            let outs = (ntm / NTOM_MUL) as i64;
            if outs > left {
                return frame;
            }
            left -= outs;
            ntm -= (ntm / NTOM_MUL) * NTOM_MUL;
            frame += 1;
        }
    }

    /// Largest output sample count a frame can produce.
    pub fn max_frame_outs(&self) -> usize {
        ((NTOM_MUL - 1 + self.spf * self.step) / NTOM_MUL) as usize
    }

    /// Advances the accumulator of `channel` by one input sample; returns how
    /// many output samples it yields (0 or more).
    #[inline]
    pub(crate) fn tick(&mut self, channel: usize) -> u32 {
        let acc = &mut self.val[channel];
        *acc += self.step;
        let n = (*acc / NTOM_MUL) as u32;
        *acc -= n as u64 * NTOM_MUL;
        n
    }

    /// Called at the start of every row before channel 0 is filtered.
    #[inline]
    pub(crate) fn sync_channels(&mut self) {
        self.val[1] = self.val[0];
    }
}

/// How many output samples each input sample maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownSample {
    #[default]
    Native,
    Half,
    Quarter,
    NtoM,
}

impl DownSample {
    pub fn shift(self) -> u32 {
        match self {
            DownSample::Native | DownSample::NtoM => 0,
            DownSample::Half => 1,
            DownSample::Quarter => 2,
        }
    }
}

/// Translates between frames, input samples and output samples for the active
/// output mode.
#[derive(Debug, Clone, Default)]
pub struct SampleScale {
    pub mode: DownSample,
    pub spf: i64,
}

impl SampleScale {
    /// Output samples before frame `num`.
    pub fn frame_outs(&self, ntom: &RateConverter, num: i64) -> i64 {
        match self.mode {
            DownSample::NtoM => ntom.frame_outs(num),
            mode => (self.spf >> mode.shift()) * num,
        }
    }

    /// Frame holding output sample `outs`.
    pub fn frame_offset(&self, ntom: &RateConverter, outs: i64) -> i64 {
        match self.mode {
            DownSample::NtoM => ntom.frame_offset(outs),
            mode => {
                let per_frame = self.spf >> mode.shift();
                if per_frame == 0 { 0 } else { outs / per_frame }
            }
        }
    }

    pub fn ins2outs(&self, ntom: &RateConverter, ins: i64) -> i64 {
        match self.mode {
            DownSample::NtoM => ntom.ins2outs(ins),
            mode => ins >> mode.shift(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter(native: u32, output: u32, spf: usize) -> RateConverter {
        let mut ntom = RateConverter::default();
        ntom.set_step(native, output, spf, 0).unwrap();
        ntom
    }

    #[test]
    fn rejects_bad_ratios() {
        let mut ntom = RateConverter::default();
        assert!(ntom.set_step(8000, 96000, 1152, 0).is_err());
        assert!(ntom.set_step(44100, 192000, 1152, 0).is_err());
        assert!(ntom.set_step(0, 44100, 1152, 0).is_err());
        assert!(ntom.set_step(11025, 88200, 1152, 0).is_ok());
    }

    #[test]
    fn live_accumulator_matches_replay() {
        let mut ntom = converter(44100, 37800, 1152);
        let mut emitted = 0i64;
        for frame in 0..20 {
            assert_eq!(ntom.frame_outs(frame), emitted);
            for _row in 0..36 {
                ntom.sync_channels();
                for _ in 0..32 {
                    emitted += ntom.tick(0) as i64;
                }
            }
        }

        let resumed = {
            let mut r = ntom.clone();
            r.set_ntom(20);
            r.val
        };
        assert_eq!(resumed, [ntom.val[0], ntom.val[0]]);
    }

    #[test]
    fn round_trip_within_one_frame() {
        let ntom = converter(44100, 37800, 1152);
        let per_frame = ntom.max_frame_outs() as i64;

        let mut last_frame = 0;
        for outs in (0..200_000).step_by(997) {
            let frame = ntom.frame_offset(outs);
            let back = ntom.frame_outs(frame);
            assert!(back <= outs && outs - back < per_frame, "outs {outs} -> frame {frame} -> {back}");
            assert!(frame >= last_frame);
            last_frame = frame;
        }
    }

    #[test]
    fn per_frame_output_near_ratio() {
        let ntom = converter(44100, 37800, 1152);
        let expected = 1152.0 * 37800.0 / 44100.0;
        for frame in 0..50 {
            let got = (ntom.frame_outs(frame + 1) - ntom.frame_outs(frame)) as f64;
            assert!((got - expected).abs() <= 1.0, "frame {frame}: {got}");
        }
        assert_eq!(ntom.ins2outs(1152 * 10), ntom.frame_outs(10));
    }

    #[test]
    fn power_of_two_scales() {
        let ntom = RateConverter::default();
        let half = SampleScale {
            mode: DownSample::Half,
            spf: 1152,
        };
        assert_eq!(half.frame_outs(&ntom, 3), 1728);
        assert_eq!(half.frame_offset(&ntom, 1727), 2);
        assert_eq!(half.ins2outs(&ntom, 529), 264);
    }
}
