use tracing::trace;

use super::filter::{normalized, Biquad};
use super::{EffectKind, EffectProcessor};
use crate::synth::ParamSet;

/// Band centers in Hz, `band_0` .. `band_7`
pub const EQ_CENTERS: [f64; 8] = [60.0, 150.0, 400.0, 1000.0, 2400.0, 5000.0, 10000.0, 16000.0];

pub const EQ_BANDS: usize = EQ_CENTERS.len();

pub fn band_key(band: usize) -> String {
    format!("band_{band}")
}

/// Eight parallel band-pass filters summed with per-band gain.
///
/// A band at exactly 1.0 is neutral and skipped. When nothing contributes
/// (every band neutral, or the sum is exactly zero) the input passes
/// through untouched.
pub struct Equalizer {
    sample_rate: f32,
}

impl Equalizer {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate }
    }
}

impl EffectProcessor for Equalizer {
    fn kind(&self) -> EffectKind {
        EffectKind::Eq
    }

    fn process(&self, input: &[f32], params: &ParamSet) -> Vec<f32> {
        let nyq = self.sample_rate as f64 / 2.0;
        let mut out = vec![0.0f32; input.len()];
        for (band, center) in EQ_CENTERS.iter().enumerate() {
            let gain = params.f32_or(&band_key(band), 1.0);
            if gain == 1.0 {
                continue;
            }
            let low = normalized(center * 0.5, self.sample_rate);
            let high = normalized((center * 1.5).min(nyq * 0.95), self.sample_rate);
            match Biquad::bandpass1(low, high) {
                Ok(filter) => {
                    for (o, s) in out.iter_mut().zip(filter.process(input)) {
                        *o += s * gain;
                    }
                }
                Err(e) => trace!(band, error = %e, "eq band skipped"),
            }
        }
        if out.iter().all(|s| *s == 0.0) {
            input.to_vec()
        } else {
            out
        }
    }
}
