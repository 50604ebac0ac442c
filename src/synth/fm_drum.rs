use std::f64::consts::TAU;

use crate::sequencer::Note;

use super::params::{duration_samples, FmDrumParams, ParamSet, Tuning};
use super::source::{silence, SourceKind, SourceProcessor};

/// Drum reference pitch, independent of the melodic reference
pub const FM_BASE_HZ: f64 = 100.0;

/// Two-operator FM percussion.
///
/// The modulator's index decays faster than the carrier's amplitude,
/// giving a bright attack that settles into a plain sine body.
pub struct FmDrum {
    sample_rate: f32,
}

impl FmDrum {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate }
    }
}

impl SourceProcessor for FmDrum {
    fn kind(&self) -> SourceKind {
        SourceKind::FmDrum
    }

    fn generate(&mut self, params: &ParamSet, note: &Note, _bpm: f32) -> Vec<f32> {
        let tuning = Tuning::from_params(params);
        let p = FmDrumParams::from_params(params);
        let Some(n) = duration_samples(p.length, self.sample_rate) else {
            return silence();
        };

        let freq = FM_BASE_HZ * tuning.ratio(note.pitch);
        let mod_freq = freq * p.fm_ratio;
        let gain = tuning.gain as f64;
        let step = p.length / n as f64;

        (0..n)
            .map(|i| {
                let t = i as f64 * step;
                let fm_env = (-15.0 * t / p.length).exp() * p.fm_depth;
                let vol_env = (-8.0 * t / p.length).exp();
                let modulator = (TAU * mod_freq * t).sin() * fm_env;
                ((TAU * freq * t + modulator).sin() * vol_env * gain) as f32
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_depth_is_a_decaying_sine() {
        let mut drum = FmDrum::new(44100.0);
        let params = ParamSet::new().with("fm_depth", 0.0).with("length", 0.2);
        let buf = drum.generate(&params, &Note::new(0, 60, 120, 100), 120.0);
        assert_eq!(buf.len(), 8820);
        // quarter period of 100 Hz
        assert!((buf[110] - (TAU * 100.0 * 110.0 / 44100.0).sin() as f32 * (-8.0f32 * 110.0 / 8820.0).exp()).abs() < 1e-3);
    }

    #[test]
    fn amplitude_never_exceeds_gain() {
        let mut drum = FmDrum::new(44100.0);
        let params = ParamSet::new().with("fm_depth", 50.0).with("gain", 0.7);
        let buf = drum.generate(&params, &Note::new(0, 48, 120, 100), 120.0);
        assert!(buf.iter().all(|s| s.abs() <= 0.7 + 1e-6));
        assert!(buf.iter().any(|s| s.abs() > 0.3));
    }

    #[test]
    fn tail_is_quieter_than_head() {
        let mut drum = FmDrum::new(44100.0);
        let buf = drum.generate(&ParamSet::new(), &Note::new(0, 60, 120, 100), 120.0);
        let head = buf[..1000].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        let tail = buf[buf.len() - 1000..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(tail < head * 0.01);
    }
}
