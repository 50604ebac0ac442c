use std::collections::HashMap;
use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::fx::filter::{normalized, Biquad};
use crate::sequencer::Note;

use super::params::{duration_samples, NoiseColor, NoiseDrumParams, NoiseShape, ParamSet, Tuning};
use super::source::{silence, SourceKind, SourceProcessor};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    shape: NoiseShape,
    /// Hz, rounded
    pitch: i64,
    samples: usize,
    color: NoiseColor,
}

/// Colored-noise percussion (kick/tom, snare, cymbal).
///
/// Rendered hits are peak-normalized and memoized per
/// (shape, pitch, length, color), so a repeated trigger replays the same
/// noise instead of drawing a fresh one. Gain is applied on the way out.
pub struct NoiseDrum {
    sample_rate: f32,
    rng: StdRng,
    cache: HashMap<CacheKey, Vec<f32>>,
}

impl NoiseDrum {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_rng(sample_rate, StdRng::from_entropy())
    }

    /// Deterministic noise, for tests and offline renders
    pub fn with_seed(sample_rate: f32, seed: u64) -> Self {
        Self::with_rng(sample_rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(sample_rate: f32, rng: StdRng) -> Self {
        Self {
            sample_rate,
            rng,
            cache: HashMap::new(),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn colored_noise(&mut self, n: usize, color: NoiseColor) -> Vec<f32> {
        let white: Vec<f32> = (0..n).map(|_| self.rng.gen_range(-1.0f32..=1.0)).collect();
        match color {
            NoiseColor::White => white,
            NoiseColor::Pink => match Biquad::lowpass1(0.1) {
                Ok(f) => normalize(f.process(&white)),
                Err(_) => white,
            },
            NoiseColor::Brown => {
                let mut acc = 0.0f32;
                let walk: Vec<f32> = white
                    .iter()
                    .map(|s| {
                        acc += s;
                        acc
                    })
                    .collect();
                match Biquad::highpass1(0.001) {
                    Ok(f) => normalize(f.process(&walk)),
                    Err(_) => normalize(walk),
                }
            }
        }
    }

    fn render(&mut self, p: &NoiseDrumParams, pitch: f64, n: usize) -> Vec<f32> {
        let noise = self.colored_noise(n, p.color);
        let dur = p.length;
        let step = dur / n as f64;
        let t = |i: usize| i as f64 * step;

        let wave: Vec<f32> = match p.shape {
            NoiseShape::Drum => {
                // exponential sweep from 4x pitch down to pitch
                let f_start = (pitch * 4.0).max(1.0);
                let f_end = pitch.max(20.0);
                let ratio = if n > 1 {
                    (f_end / f_start).powf(1.0 / (n - 1) as f64)
                } else {
                    1.0
                };
                noise
                    .iter()
                    .enumerate()
                    .map(|(i, nz)| {
                        let t = t(i);
                        let f = f_start * ratio.powi(i as i32);
                        let tone = (TAU * f * t).sin() * 0.95;
                        let click = *nz as f64 * 0.2 * (-150.0 * t).exp();
                        ((tone + click) * (-12.0 * t / dur).exp()) as f32
                    })
                    .collect()
            }
            NoiseShape::Snare => noise
                .iter()
                .enumerate()
                .map(|(i, nz)| {
                    let t = t(i);
                    let tone = (TAU * pitch * t).sin() * (-40.0 * t / dur).exp();
                    (*nz as f64 * (-18.0 * t / dur).exp() + tone * 0.5) as f32
                })
                .collect(),
            NoiseShape::Cymbal => {
                let nyq = self.sample_rate as f64 / 2.0;
                let cutoff = (1000.0 + pitch * 14.0).clamp(1000.0, nyq * 0.95);
                let filtered = match Biquad::highpass2(normalized(cutoff, self.sample_rate)) {
                    Ok(f) => f.process(&noise),
                    Err(e) => {
                        debug!(error = %e, "cymbal high-pass skipped");
                        noise
                    }
                };
                filtered
                    .iter()
                    .enumerate()
                    .map(|(i, s)| (*s as f64 * (-8.0 * t(i) / dur).exp()) as f32)
                    .collect()
            }
        };
        normalize(wave)
    }
}

/// Scale so the largest magnitude is 1; all-zero input is returned as is
fn normalize(mut buf: Vec<f32>) -> Vec<f32> {
    let peak = buf.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        for s in buf.iter_mut() {
            *s /= peak;
        }
    }
    buf
}

impl SourceProcessor for NoiseDrum {
    fn kind(&self) -> SourceKind {
        SourceKind::NoiseDrum
    }

    fn generate(&mut self, params: &ParamSet, note: &Note, _bpm: f32) -> Vec<f32> {
        let tuning = Tuning::from_params(params);
        let p = NoiseDrumParams::from_params(params);
        let pitch = p.pitch_hpf * tuning.ratio(note.pitch);
        let gain = tuning.gain;
        let Some(n) = duration_samples(p.length, self.sample_rate) else {
            return silence();
        };

        let key = CacheKey {
            shape: p.shape,
            pitch: pitch.round() as i64,
            samples: n,
            color: p.color,
        };
        if let Some(hit) = self.cache.get(&key) {
            trace!(?key, "noise drum cache hit");
            return hit.iter().map(|s| s * gain).collect();
        }

        let hit = self.render(&p, pitch, n);
        let out = hit.iter().map(|s| s * gain).collect();
        self.cache.insert(key, hit);
        out
    }
}
