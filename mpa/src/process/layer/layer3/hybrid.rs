//! Layer III hybrid filterbank: alias reduction, IMDCT with overlap-add and
//! frequency inversion.
//!
//! Long blocks use a 36-point IMDCT per subband windowed by the block type's
//! window. Short blocks run three 12-point IMDCTs whose windowed outputs
//! overlap at offsets 6, 12 and 18. The second half of every transform is
//! kept and added to the first half of the next granule.

use std::f64::consts::PI;

use super::GranuleChannel;
use super::spectrum::Spectrum;
use crate::process::synth::{Real, SBLIMIT};

const SSLIMIT: usize = 18;

/// Alias reduction butterfly coefficients.
const ALIAS_C: [f64; 8] = [-0.6, -0.535, -0.33, -0.185, -0.095, -0.041, -0.0142, -0.0037];

/// Alias reduction between adjacent long block subbands.
pub fn antialias(gc: &GranuleChannel, xr: &mut Spectrum) {
    let limit = match (gc.window_switching && gc.block_type == 2, gc.mixed_block) {
        (false, _) => SBLIMIT,
        (true, true) => 2,
        (true, false) => return,
    };

    for sb in 1..limit {
        for (i, &c) in ALIAS_C.iter().enumerate() {
            let norm = (1.0 + c * c).sqrt();
            let (cs, ca) = ((1.0 / norm) as Real, (c / norm) as Real);
            let (lo, hi) = (sb * SSLIMIT - 1 - i, sb * SSLIMIT + i);
            let (a, b) = (xr[lo], xr[hi]);
            xr[lo] = a * cs - b * ca;
            xr[hi] = b * cs + a * ca;
        }
    }
}

#[derive(Debug, Clone)]
pub struct Hybrid {
    cos36: Box<[[Real; SSLIMIT]; 36]>,
    cos12: [[Real; 6]; 12],
    /// Long windows by block type; type 2 is unused.
    windows: [[Real; 36]; 4],
    short_window: [Real; 12],
    overlap: Box<[[[Real; SSLIMIT]; SBLIMIT]; 2]>,
}

impl Default for Hybrid {
    fn default() -> Self {
        Self::new()
    }
}

impl Hybrid {
    pub fn new() -> Self {
        let mut cos36 = Box::new([[0.0; SSLIMIT]; 36]);
        for (i, row) in cos36.iter_mut().enumerate() {
            for (k, c) in row.iter_mut().enumerate() {
                *c = (PI / 72.0 * ((2 * i + 19) * (2 * k + 1)) as f64).cos() as Real;
            }
        }

        let mut cos12 = [[0.0; 6]; 12];
        for (i, row) in cos12.iter_mut().enumerate() {
            for (k, c) in row.iter_mut().enumerate() {
                *c = (PI / 24.0 * ((2 * i + 7) * (2 * k + 1)) as f64).cos() as Real;
            }
        }

        let long = |i: usize| (PI / 36.0 * (i as f64 + 0.5)).sin() as Real;
        let short = |i: usize| (PI / 12.0 * (i as f64 + 0.5)).sin() as Real;

        let mut windows = [[0.0; 36]; 4];
        for i in 0..36 {
            windows[0][i] = long(i);
            windows[1][i] = match i {
                0..=17 => long(i),
                18..=23 => 1.0,
                24..=29 => short(i - 18),
                _ => 0.0,
            };
            windows[3][i] = match i {
                0..=5 => 0.0,
                6..=11 => short(i - 6),
                12..=17 => 1.0,
                _ => long(i),
            };
        }

        let mut short_window = [0.0; 12];
        for (i, w) in short_window.iter_mut().enumerate() {
            *w = short(i);
        }

        Self {
            cos36,
            cos12,
            windows,
            short_window,
            overlap: Box::new([[[0.0; SSLIMIT]; SBLIMIT]; 2]),
        }
    }

    pub fn reset(&mut self) {
        self.overlap.iter_mut().flatten().flatten().for_each(|x| *x = 0.0);
    }

    /// Turns the spectrum of channel `ch` into 18 time samples per
    /// subband, in place: `xr[sb * 18 + t]`.
    pub fn transform(&mut self, ch: usize, gc: &GranuleChannel, xr: &mut Spectrum) {
        let short_blocks = gc.window_switching && gc.block_type == 2;
        let long_window = if gc.window_switching && gc.block_type != 2 {
            gc.block_type as usize
        } else {
            0
        };

        for sb in 0..SBLIMIT {
            let lines = &mut xr[sb * SSLIMIT..(sb + 1) * SSLIMIT];
            let mut raw = [0.0; 36];

            if short_blocks && !(gc.mixed_block && sb < 2) {
                for w in 0..3 {
                    for (i, cos) in self.cos12.iter().enumerate() {
                        let y: Real = cos.iter().enumerate().map(|(k, c)| lines[3 * k + w] * c).sum();
                        raw[6 + 6 * w + i] += y * self.short_window[i];
                    }
                }
            } else {
                let window = &self.windows[long_window];
                for (i, cos) in self.cos36.iter().enumerate() {
                    let y: Real = cos.iter().zip(lines.iter()).map(|(c, x)| c * x).sum();
                    raw[i] = y * window[i];
                }
            }

            let overlap = &mut self.overlap[ch][sb];
            for t in 0..SSLIMIT {
                lines[t] = raw[t] + overlap[t];
                overlap[t] = raw[SSLIMIT + t];
            }

            // odd subbands are spectrally inverted
            if sb % 2 == 1 {
                for t in (1..SSLIMIT).step_by(2) {
                    lines[t] = -lines[t];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::layer::layer3::spectrum::LINES;

    #[test]
    fn windows_overlap_to_unity_power() {
        let hybrid = Hybrid::new();
        // Princen-Bradley: w[i]^2 + w[i + 18]^2 == 1 for the normal window
        for i in 0..SSLIMIT {
            let w = &hybrid.windows[0];
            assert!((w[i] * w[i] + w[i + 18] * w[i + 18] - 1.0).abs() < 1e-6);
        }
        // start followed by stop joins the short window halves
        assert_eq!(hybrid.windows[1][30], 0.0);
        assert_eq!(hybrid.windows[3][5], 0.0);
        assert!((hybrid.windows[1][24] - hybrid.short_window[6]).abs() < 1e-6);
    }

    #[test]
    fn alias_reduction_mixes_neighbours() {
        let gc = GranuleChannel::default();
        let mut xr = [0.0; LINES];
        xr[17] = 1.0;
        antialias(&gc, &mut xr);
        let c = ALIAS_C[0];
        let norm = (1.0 + c * c).sqrt();
        assert!((xr[17] - (1.0 / norm) as Real).abs() < 1e-6);
        assert!((xr[18] - (c / norm) as Real).abs() < 1e-6);

        let short = GranuleChannel {
            window_switching: true,
            block_type: 2,
            ..Default::default()
        };
        let mut xr = [0.0; LINES];
        xr[17] = 1.0;
        antialias(&short, &mut xr);
        assert_eq!(xr[18], 0.0);
    }

    #[test]
    fn overlap_carries_into_the_next_granule() {
        let gc = GranuleChannel::default();
        let mut hybrid = Hybrid::new();

        let mut xr = [0.0; LINES];
        xr[0] = 1.0;
        hybrid.transform(0, &gc, &mut xr);
        let first: Vec<Real> = xr[..SSLIMIT].to_vec();
        assert!(first.iter().any(|&x| x != 0.0));
        assert!(xr[SSLIMIT..].iter().all(|&x| x == 0.0));

        // a silent granule plays out the stored tail
        let mut silent = [0.0; LINES];
        hybrid.transform(0, &gc, &mut silent);
        assert!(silent[..SSLIMIT].iter().any(|&x| x != 0.0));

        hybrid.reset();
        let mut silent = [0.0; LINES];
        hybrid.transform(0, &gc, &mut silent);
        assert!(silent.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn odd_subbands_are_inverted() {
        let gc = GranuleChannel::default();
        let mut a = Hybrid::new();
        let mut b = Hybrid::new();

        let mut even = [0.0; LINES];
        even[0] = 1.0;
        a.transform(0, &gc, &mut even);

        let mut odd = [0.0; LINES];
        odd[SSLIMIT] = 1.0;
        b.transform(0, &gc, &mut odd);

        for t in 0..SSLIMIT {
            let sign = if t % 2 == 1 { -1.0 } else { 1.0 };
            assert!((odd[SSLIMIT + t] - sign * even[t]).abs() < 1e-6);
        }
    }
}
