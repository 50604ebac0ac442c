use tracing::debug;

use crate::fx::filter::{normalized, Biquad};
use crate::sequencer::Note;

use super::oscillator::{mix_into, render};
use super::params::{duration_samples, DualOscParams, ParamSet, Tuning};
use super::source::{silence, SourceKind, SourceProcessor};

/// Reference pitch for the melodic engines (middle C)
pub const MIDDLE_C_HZ: f64 = 261.63;

/// Two mixed oscillators into a one-pole low-pass with an attack/decay envelope
pub struct DualOsc {
    sample_rate: f32,
}

impl DualOsc {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate }
    }
}

impl SourceProcessor for DualOsc {
    fn kind(&self) -> SourceKind {
        SourceKind::DualOsc
    }

    fn generate(&mut self, params: &ParamSet, note: &Note, _bpm: f32) -> Vec<f32> {
        let tuning = Tuning::from_params(params);
        let p = DualOscParams::from_params(params);
        if p.length <= 0.0 {
            return silence();
        }
        let attack = p.attack.max(0.0);
        let total = attack + p.length;
        let Some(n) = duration_samples(total, self.sample_rate) else {
            return silence();
        };

        let freq1 = MIDDLE_C_HZ * tuning.ratio(note.pitch);
        let freq2 = freq1 * 2.0f64.powf((p.osc2_interval + p.osc2_detune / 100.0) / 12.0);

        let mut buf = render(p.osc1, freq1, self.sample_rate, 1.0 - p.osc_mix, n);
        mix_into(&mut buf, p.osc2, freq2, self.sample_rate, p.osc_mix);

        let wn = normalized(p.filter_cutoff as f64, self.sample_rate).clamp(0.01, 0.99);
        let filtered = match Biquad::lowpass1(wn) {
            Ok(filter) => filter.process(&buf),
            Err(e) => {
                debug!(error = %e, "dual osc filter skipped");
                buf
            }
        };

        let sr = self.sample_rate as f64;
        let att_samples = ((attack * sr) as usize).min(n);
        let gain = tuning.gain as f64;
        filtered
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                let env = if i < att_samples {
                    if att_samples > 1 {
                        i as f64 / (att_samples - 1) as f64
                    } else {
                        0.0
                    }
                } else {
                    (-6.0 * (i - att_samples) as f64 / sr / p.length).exp()
                };
                (s as f64 * env * gain) as f32
            })
            .collect()
    }
}
