use crate::sequencer::Note;

use super::dual_osc::MIDDLE_C_HZ;
use super::params::{duration_samples, ParamSet, Tuning, WavetableParams, WAVETABLE_SIZE};
use super::source::{silence, SourceKind, SourceProcessor};

/// Output trim for the table engine
const WAVETABLE_LEVEL: f64 = 0.5;

/// 32-step single-cycle table read with linear interpolation
pub struct WavetableSynth {
    sample_rate: f32,
}

impl WavetableSynth {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate }
    }
}

impl SourceProcessor for WavetableSynth {
    fn kind(&self) -> SourceKind {
        SourceKind::Wavetable
    }

    fn generate(&mut self, params: &ParamSet, note: &Note, _bpm: f32) -> Vec<f32> {
        let tuning = Tuning::from_params(params);
        let p = WavetableParams::from_params(params);
        let Some(n) = duration_samples(p.decay, self.sample_rate) else {
            return silence();
        };

        let size = WAVETABLE_SIZE as f64;
        let freq = MIDDLE_C_HZ * tuning.ratio(note.pitch);
        let phase_inc = freq * size / self.sample_rate as f64;
        let scale = tuning.gain as f64 * WAVETABLE_LEVEL;
        let step = p.decay / n as f64;

        (0..n)
            .map(|i| {
                let phase = (i as f64 * phase_inc).rem_euclid(size);
                let idx = (phase as usize).min(WAVETABLE_SIZE - 1);
                let next = (idx + 1) % WAVETABLE_SIZE;
                let frac = phase - idx as f64;
                let value = (1.0 - frac) * p.table[idx] as f64 + frac * p.table[next] as f64;
                let env = (-6.0 * i as f64 * step / p.decay).exp();
                (value * env * scale) as f32
            })
            .collect()
    }
}
