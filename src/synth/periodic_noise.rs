use crate::sequencer::Note;

use super::params::{duration_samples, LfsrMode, ParamSet, PeriodicNoiseParams, Tuning};
use super::source::{silence, SourceKind, SourceProcessor};

/// Chiptune noise channel: a 15-bit shift register clocked at a pitch-derived rate.
///
/// Both bit sequences are computed once up front; a trigger only picks how
/// many output samples each register step is held for.
pub struct PeriodicNoise {
    sample_rate: f32,
    long_seq: Vec<f32>,
    short_seq: Vec<f32>,
}

impl PeriodicNoise {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            long_seq: lfsr_sequence(1, LfsrMode::Static.period()),
            short_seq: lfsr_sequence(6, LfsrMode::Metallic.period()),
        }
    }

    fn sequence(&self, mode: LfsrMode) -> &[f32] {
        match mode {
            LfsrMode::Static => &self.long_seq,
            LfsrMode::Metallic => &self.short_seq,
        }
    }
}

/// Step a 15-bit register seeded with 1, feeding back bit 0 XOR bit `tap`.
/// Output is +1 while bit 0 is clear, -1 otherwise.
fn lfsr_sequence(tap: u32, len: usize) -> Vec<f32> {
    let mut reg: u16 = 1;
    (0..len)
        .map(|_| {
            let out = if reg & 1 == 0 { 1.0 } else { -1.0 };
            let feedback = (reg ^ (reg >> tap)) & 1;
            reg = (reg >> 1) | (feedback << 14);
            out
        })
        .collect()
}

impl SourceProcessor for PeriodicNoise {
    fn kind(&self) -> SourceKind {
        SourceKind::PeriodicNoise
    }

    fn generate(&mut self, params: &ParamSet, note: &Note, _bpm: f32) -> Vec<f32> {
        let tuning = Tuning::from_params(params);
        let p = PeriodicNoiseParams::from_params(params);
        let Some(n) = duration_samples(p.length, self.sample_rate) else {
            return silence();
        };

        // higher notes clock the register faster
        let hold = ((p.rate_div / tuning.ratio(note.pitch)) as usize).max(1);
        let seq = self.sequence(p.mode);
        let gain = tuning.gain as f64;
        let step = p.length / n as f64;

        (0..n)
            .map(|i| {
                let bit = seq[(i / hold) % seq.len()] as f64;
                let env = (-10.0 * i as f64 * step / p.length).exp();
                (bit * env * gain) as f32
            })
            .collect()
    }
}
