use super::{EffectKind, EffectProcessor};
use crate::synth::ParamSet;

/// Tap times in seconds at `size = 1`
const ROOM_TAPS: [f64; 4] = [0.029, 0.037, 0.043, 0.047];

/// Four-tap room reverb.
///
/// Each tap is the dry signal delayed by `tap * size` and scaled by
/// `0.4 + 0.4 * mix`; the taps are averaged and crossfaded with the dry
/// signal by `mix`. Taps that round to zero samples or reach past the
/// end of the buffer are skipped.
pub struct Reverb {
    sample_rate: f32,
}

impl Reverb {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate }
    }
}

impl EffectProcessor for Reverb {
    fn kind(&self) -> EffectKind {
        EffectKind::Reverb
    }

    fn process(&self, input: &[f32], params: &ParamSet) -> Vec<f32> {
        let mix = params.f32_or("mix", 0.1);
        let size = params.f64_or("size", 0.5);
        let tap_gain = 0.4 + mix * 0.4;

        let mut wet = vec![0.0f32; input.len()];
        for tap in ROOM_TAPS {
            let d = (tap * size * self.sample_rate as f64) as usize;
            if d == 0 || d >= input.len() {
                continue;
            }
            for (w, s) in wet[d..].iter_mut().zip(input) {
                *w += s * tap_gain;
            }
        }

        let taps = ROOM_TAPS.len() as f32;
        input
            .iter()
            .zip(&wet)
            .map(|(dry, w)| dry * (1.0 - mix) + w / taps * mix)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse(len: usize) -> Vec<f32> {
        let mut buf = vec![0.0; len];
        buf[0] = 1.0;
        buf
    }

    #[test]
    fn impulse_echoes_at_scaled_taps() {
        let reverb = Reverb::new(44100.0);
        let params = ParamSet::new().with("mix", 0.5).with("size", 1.0);
        let out = reverb.process(&impulse(4410), &params);
        assert_eq!(out.len(), 4410);
        assert!((out[0] - 0.5).abs() < 1e-6);
        // 0.029 s -> 1278 samples; (0.4 + 0.2) / 4 * 0.5
        let d = (0.029 * 44100.0) as usize;
        assert!((out[d] - 0.075).abs() < 1e-6);
        assert_eq!(out[d - 1], 0.0);
    }

    #[test]
    fn zero_size_leaves_only_scaled_dry() {
        let reverb = Reverb::new(44100.0);
        let input = vec![0.5; 100];
        let out = reverb.process(&input, &ParamSet::new().with("mix", 0.2).with("size", 0.0));
        assert!(out.iter().all(|s| (s - 0.4).abs() < 1e-6));
    }

    #[test]
    fn short_buffers_skip_long_taps() {
        let reverb = Reverb::new(44100.0);
        let out = reverb.process(&impulse(64), &ParamSet::new());
        assert_eq!(out.len(), 64);
        assert!(out[1..].iter().all(|s| *s == 0.0));
    }
}
