//! Polyphase synthesis filterbank.
//!
//! Each call turns the 32 subband samples of one row and one channel into
//! time-domain samples:
//!
//! 1. **Matrixing**: `V[i] = sum_k cos((16+i)(2k+1)pi/64) * S[k]`, 64 values
//! 2. **History**: `V` is stored in a ring of 16 vectors per channel. The ring
//!    position `bo` moves back by one for every row, so no data is shifted.
//! 3. **Windowing**: output `j` is `sum_m D[j+32m] * V_m[j + 32*(m & 1)]`,
//!    where `V_m` is the m-th newest vector and `D` the 512-tap prototype
//!
//! Half and quarter rate output band-limit the input to 16/8 subbands and keep
//! every 2nd/4th window output. N:M output repeats or drops window outputs as
//! the [`RateConverter`] accumulator dictates.

use std::f64::consts::PI;

use crate::process::ntom::{DownSample, RateConverter};

pub type Real = f32;

pub const SBLIMIT: usize = 32;

const HISTORY: usize = 16;

/// First half of the prototype window, scaled by 2^16.
const ENWINDOW: [i32; 257] = [
    0, -1, -1, -1, -1, -1, -1, -2, -2, -2, -2, -3, -3, -4, -4, -5, -5, -6, -7, -7, -8, -9, -10,
    -11, -13, -14, -16, -17, -19, -21, -24, -26, -29, -31, -35, -38, -41, -45, -49, -53, -58, -63,
    -68, -73, -79, -85, -91, -97, -104, -111, -117, -125, -132, -139, -147, -154, -161, -169, -176,
    -183, -190, -196, -202, -208, 213, 218, 222, 225, 227, 228, 228, 227, 224, 221, 215, 208, 200,
    189, 177, 163, 146, 127, 106, 83, 57, 29, -2, -36, -72, -111, -153, -197, -244, -294, -347,
    -401, -459, -519, -581, -645, -711, -779, -848, -919, -991, -1064, -1137, -1210, -1283, -1356,
    -1428, -1498, -1567, -1634, -1698, -1759, -1817, -1870, -1919, -1962, -2001, -2032, -2057,
    -2075, -2085, -2087, -2080, -2063, 2037, 2000, 1952, 1893, 1822, 1739, 1644, 1535, 1414, 1280,
    1131, 970, 794, 605, 402, 185, -45, -288, -545, -814, -1095, -1388, -1692, -2006, -2330, -2663,
    -3004, -3351, -3705, -4063, -4425, -4788, -5153, -5517, -5879, -6237, -6589, -6935, -7271,
    -7597, -7910, -8209, -8491, -8755, -8998, -9219, -9416, -9585, -9727, -9838, -9916, -9959,
    -9966, -9935, -9863, -9750, -9592, -9389, -9139, -8840, -8492, -8092, -7640, -7134, 6574, 5959,
    5288, 4561, 3776, 2935, 2037, 1082, 70, -998, -2122, -3300, -4533, -5818, -7154, -8540, -9975,
    -11455, -12980, -14548, -16155, -17799, -19478, -21189, -22929, -24694, -26482, -28289, -30112,
    -31947, -33791, -35640, -37489, -39336, -41176, -43006, -44821, -46617, -48390, -50137, -51853,
    -53534, -55178, -56778, -58333, -59838, -61289, -62684, -64019, -65290, -66494, -67629, -68692,
    -69679, -70590, -71420, -72169, -72835, -73415, -73908, -74313, -74630, -74856, -74992, 75038,
];

/// The two numeric stages of synthesis.
pub trait SynthesisKernel {
    /// Matrixes one row of subband samples into a 64-value vector.
    fn matrix(&self, subbands: &[Real; SBLIMIT], v: &mut [Real; 64]);

    /// Windows the history into 32 output samples. `history[(newest + m) % 16]`
    /// is the m-th newest vector.
    fn window(&self, history: &[[Real; 64]; HISTORY], newest: usize, out: &mut [Real; SBLIMIT]);
}

/// Straightforward reference kernel with precomputed tables.
#[derive(Debug, Clone)]
pub struct PortableKernel {
    cos: Box<[[Real; SBLIMIT]; 64]>,
    d: Box<[Real; 512]>,
}

impl Default for PortableKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl PortableKernel {
    pub fn new() -> Self {
        let mut cos = Box::new([[0.0; SBLIMIT]; 64]);
        for (i, row) in cos.iter_mut().enumerate() {
            for (k, c) in row.iter_mut().enumerate() {
                *c = (((16 + i) * (2 * k + 1)) as f64 * PI / 64.0).cos() as Real;
            }
        }

        let mut d = Box::new([0.0; 512]);
        for (i, &w) in ENWINDOW.iter().enumerate() {
            let v = w as f64 / 65536.0;
            d[i] = v as Real;
            if i > 0 {
                d[512 - i] = if i & 63 != 0 { -v } else { v } as Real;
            }
        }

        Self { cos, d }
    }
}

impl SynthesisKernel for PortableKernel {
    fn matrix(&self, subbands: &[Real; SBLIMIT], v: &mut [Real; 64]) {
        for (out, row) in v.iter_mut().zip(self.cos.iter()) {
            *out = row.iter().zip(subbands).map(|(c, s)| c * s).sum();
        }
    }

    fn window(&self, history: &[[Real; 64]; HISTORY], newest: usize, out: &mut [Real; SBLIMIT]) {
        for (j, sample) in out.iter_mut().enumerate() {
            let mut sum = 0.0;
            for m in 0..HISTORY {
                let v = &history[(newest + m) % HISTORY];
                sum += self.d[j + 32 * m] * v[j + 32 * (m & 1)];
            }
            *sample = sum;
        }
    }
}

#[derive(Debug, Clone)]
pub struct SynthesisFilter<K: SynthesisKernel = PortableKernel> {
    kernel: K,
    history: Box<[[[Real; 64]; HISTORY]; 2]>,
    bo: usize,
    band_limit: usize,
}

impl Default for SynthesisFilter {
    fn default() -> Self {
        Self::new(PortableKernel::new())
    }
}

impl<K: SynthesisKernel> SynthesisFilter<K> {
    pub fn new(kernel: K) -> Self {
        Self {
            kernel,
            history: Box::new([[[0.0; 64]; HISTORY]; 2]),
            bo: 0,
            band_limit: SBLIMIT,
        }
    }

    /// Clears the history of both channels.
    pub fn reset(&mut self) {
        self.history = Box::new([[[0.0; 64]; HISTORY]; 2]);
        self.bo = 0;
    }

    /// Subbands at or above `limit` are zeroed before matrixing.
    pub fn set_band_limit(&mut self, limit: usize) {
        self.band_limit = limit.clamp(1, SBLIMIT);
    }

    pub fn band_limit(&self) -> usize {
        self.band_limit
    }

    /// Filters one row of `channel` and appends the output samples to `out`.
    ///
    /// Channel 0 must be filtered first in every row; it advances the shared
    /// ring position and the rate converter's channel sync.
    pub fn synth(
        &mut self,
        channel: usize,
        subbands: &[Real; SBLIMIT],
        mode: DownSample,
        ntom: &mut RateConverter,
        out: &mut Vec<Real>,
    ) {
        if channel == 0 {
            self.bo = (self.bo + HISTORY - 1) % HISTORY;
        }

        let mut input = *subbands;
        input[self.band_limit..].fill(0.0);

        let history = &mut self.history[channel];
        self.kernel.matrix(&input, &mut history[self.bo]);

        let mut pcm = [0.0; SBLIMIT];
        self.kernel.window(history, self.bo, &mut pcm);

        match mode {
            DownSample::Native => out.extend_from_slice(&pcm),
            DownSample::Half => out.extend(pcm.iter().step_by(2)),
            DownSample::Quarter => out.extend(pcm.iter().step_by(4)),
            DownSample::NtoM => {
                if channel == 0 {
                    ntom.sync_channels();
                }
                for &sample in &pcm {
                    for _ in 0..ntom.tick(channel) {
                        out.push(sample);
                    }
                }
            }
        }
    }
}
