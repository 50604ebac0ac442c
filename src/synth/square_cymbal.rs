use std::collections::HashMap;

use tracing::debug;

use crate::fx::filter::Biquad;
use crate::sequencer::Note;

use super::oscillator::{mix_into, Waveform};
use super::params::{duration_samples, ParamSet, SquareCymbalParams, Tuning};
use super::source::{silence, SourceKind, SourceProcessor};

const PARTIAL_LEVEL: f32 = 0.15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    ratios: [u64; 6],
    freq_dhz: i64, // tenths of Hz
    samples: usize,
    cutoff: i64,
}

/// Metallic percussion from six inharmonic square partials, 808 style
pub struct SquareCymbal {
    sample_rate: f32,
    cache: HashMap<CacheKey, Vec<f32>>,
}

impl SquareCymbal {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            cache: HashMap::new(),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn render(&self, p: &SquareCymbalParams, base_freq: f64, n: usize) -> Vec<f32> {
        let mut partials = vec![0.0f32; n];
        for ratio in p.ratios {
            mix_into(&mut partials, Waveform::Square, base_freq * ratio, self.sample_rate, PARTIAL_LEVEL);
        }

        let nyq = self.sample_rate as f64 / 2.0;
        let low = (p.bp_cutoff * 0.8).max(20.0) / nyq;
        let high = (p.bp_cutoff * 1.2).min(nyq * 0.95) / nyq;
        let filtered = match Biquad::bandpass1(low, high) {
            Ok(f) => f.process(&partials),
            Err(e) => {
                debug!(error = %e, cutoff = p.bp_cutoff, "cymbal band-pass skipped");
                partials
            }
        };

        let step = p.decay / n as f64;
        filtered
            .into_iter()
            .enumerate()
            .map(|(i, s)| (s as f64 * (-8.0 * i as f64 * step / p.decay).exp()) as f32)
            .collect()
    }
}

impl SourceProcessor for SquareCymbal {
    fn kind(&self) -> SourceKind {
        SourceKind::SquareCymbal
    }

    fn generate(&mut self, params: &ParamSet, note: &Note, _bpm: f32) -> Vec<f32> {
        let tuning = Tuning::from_params(params);
        let p = SquareCymbalParams::from_params(params);
        let base_freq = p.base_freq * tuning.ratio(note.pitch);
        let gain = tuning.gain;
        let Some(n) = duration_samples(p.decay, self.sample_rate) else {
            return silence();
        };

        let key = CacheKey {
            ratios: p.ratios.map(f64::to_bits),
            freq_dhz: (base_freq * 10.0).round() as i64,
            samples: n,
            cutoff: p.bp_cutoff.round() as i64,
        };
        if let Some(hit) = self.cache.get(&key) {
            return hit.iter().map(|s| s * gain).collect();
        }

        let hit = self.render(&p, base_freq, n);
        let out = hit.iter().map(|s| s * gain).collect();
        self.cache.insert(key, hit);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note() -> Note {
        Note::new(0, 60, 120, 100)
    }

    #[test]
    fn repeats_hit_the_cache() {
        let mut cym = SquareCymbal::new(44100.0);
        let params = ParamSet::new().with("decay", 0.1);
        let a = cym.generate(&params, &note(), 120.0);
        let b = cym.generate(&params.clone().with("gain", 0.5), &note(), 120.0);
        assert_eq!(cym.cached_len(), 1);
        assert_eq!(a.len(), 4410);
        for (x, y) in a.iter().zip(&b) {
            assert!((x * 0.5 - y).abs() < 1e-6);
        }
    }

    #[test]
    fn ratio_change_renders_anew() {
        let mut cym = SquareCymbal::new(44100.0);
        let params = ParamSet::new().with("decay", 0.1);
        cym.generate(&params, &note(), 120.0);
        cym.generate(&params.clone().with("r3", 2.5), &note(), 120.0);
        assert_eq!(cym.cached_len(), 2);
    }

    #[test]
    fn cutoff_above_nyquist_still_renders() {
        let mut cym = SquareCymbal::new(44100.0);
        // band edges beyond Nyquist, so the partials pass unfiltered
        let params = ParamSet::new().with("decay", 0.1).with("bp_cutoff", 30000.0);
        let buf = cym.generate(&params, &note(), 120.0);
        assert_eq!(buf.len(), 4410);
        assert!(buf.iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn output_decays() {
        let mut cym = SquareCymbal::new(44100.0);
        let buf = cym.generate(&ParamSet::new(), &note(), 120.0);
        let head = buf[..2000].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        let tail = buf[buf.len() - 2000..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(head > 0.0);
        assert!(tail < head * 0.01);
    }

    #[test]
    fn short_hit_does_not_leak_into_silent_lengths() {
        let mut cym = SquareCymbal::new(44100.0);
        let tiny = cym.generate(&ParamSet::new().with("decay", 0.004), &note(), 120.0);
        assert_eq!(tiny.len(), 176);
        for decay in [0.0, -0.003] {
            let buf = cym.generate(&ParamSet::new().with("decay", decay), &note(), 120.0);
            assert_eq!(buf.len(), crate::config::SILENT_BUFFER_LEN);
            assert!(buf.iter().all(|s| *s == 0.0));
        }
        assert_eq!(cym.cached_len(), 1);
    }
}
