use super::{EffectKind, EffectProcessor};
use crate::synth::ParamSet;

/// Prime tap times in seconds, scaled by `2 * decay`
const PLATE_TAPS: [f64; 8] = [0.011, 0.017, 0.023, 0.031, 0.037, 0.041, 0.043, 0.047];
const BRIGHTNESS: f32 = 1.2;
const BRIGHT_MIX: f32 = 0.3;

/// Dense plate-style reverb.
///
/// The (pre-delayed) input feeds eight taps. Every tap runs through a
/// one-pole damping low-pass, is scaled by `0.6 * decay` and summed with
/// alternating polarity. The averaged tail gets a first-difference boost
/// before the dry/wet crossfade.
pub struct PlateReverb {
    sample_rate: f32,
}

impl PlateReverb {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate }
    }
}

impl EffectProcessor for PlateReverb {
    fn kind(&self) -> EffectKind {
        EffectKind::PlateReverb
    }

    fn process(&self, input: &[f32], params: &ParamSet) -> Vec<f32> {
        let mix = params.f32_or("mix", 0.2);
        let decay = params.f64_or("decay", 0.6);
        let damping = params.f32_or("damping", 0.7);
        let predelay = params.f64_or("predelay", 0.01);
        let len = input.len();
        let sr = self.sample_rate as f64;

        let mut pre = (predelay * sr).max(0.0) as usize;
        if pre >= len {
            pre = 0;
        }
        let mut source = vec![0.0f32; len];
        source[pre..].copy_from_slice(&input[..len - pre]);

        let feedback = (0.6 * decay) as f32;
        let mut tail = vec![0.0f32; len];
        for (i, tap) in PLATE_TAPS.iter().enumerate() {
            let d = (tap * decay * 2.0 * sr).max(0.0) as usize;
            if d == 0 || d >= len {
                continue;
            }
            let mut damped = source[..len - d].to_vec();
            for j in 1..damped.len() {
                damped[j] = damped[j] * damping + damped[j - 1] * (1.0 - damping);
            }
            let polarity = if i % 2 == 0 { -1.0 } else { 1.0 };
            for (t, s) in tail[d..].iter_mut().zip(&damped) {
                *t += s * feedback * polarity;
            }
        }

        let taps = PLATE_TAPS.len() as f32;
        for t in tail.iter_mut() {
            *t /= taps;
        }
        if len > 1 {
            let mut prev = tail[0];
            for t in tail.iter_mut() {
                let current = *t;
                *t += (current - prev) * BRIGHTNESS * BRIGHT_MIX;
                prev = current;
            }
        }

        input
            .iter()
            .zip(&tail)
            .map(|(dry, wet)| dry * (1.0 - mix) + wet * mix)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::oscillator::{render, Waveform};

    fn signal() -> Vec<f32> {
        render(Waveform::Saw, 220.0, 44100.0, 0.7, 44100)
    }

    #[test]
    fn zero_mix_is_dry() {
        let plate = PlateReverb::new(44100.0);
        let input = signal();
        assert_eq!(plate.process(&input, &ParamSet::new().with("mix", 0.0)), input);
    }

    #[test]
    fn full_mix_has_no_direct_path() {
        let plate = PlateReverb::new(44100.0);
        let mut input = vec![0.0f32; 44100];
        input[0] = 1.0;
        let out = plate.process(&input, &ParamSet::new().with("mix", 1.0));
        // the shortest tap is 0.011 * 1.2 s in, plus the pre-delay
        let first = ((0.011 * 0.6 * 2.0 * 44100.0) as usize) + 441;
        assert!(out[..first].iter().all(|s| *s == 0.0));
        assert!(out[first..].iter().any(|s| s.abs() > 1e-4));
    }

    #[test]
    fn preserves_length_for_short_buffers() {
        let plate = PlateReverb::new(44100.0);
        for len in [0, 1, 10, 500] {
            let input = vec![0.3; len];
            assert_eq!(plate.process(&input, &ParamSet::new()).len(), len);
        }
    }

    #[test]
    fn predelay_longer_than_buffer_is_ignored() {
        let plate = PlateReverb::new(44100.0);
        let input = signal();
        let params = ParamSet::new().with("predelay", 5.0).with("mix", 1.0);
        let out = plate.process(&input, &params);
        assert_eq!(out.len(), input.len());
        assert!(out.iter().any(|s| s.abs() > 1e-4));
    }
}
