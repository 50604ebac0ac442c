use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

/// Raw waveform shapes.
///
/// Parameter sets store these by their panel symbol (`"~"`, `"|_|"`, `"|/"`,
/// `"/\\"`, `"X"`), so both forms are kept here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Square,
    Saw,
    Triangle,
    None,
}

impl Waveform {
    pub const ALL: [Waveform; 5] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Saw,
        Waveform::Triangle,
        Waveform::None,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Waveform::Sine => "~",
            Waveform::Square => "|_|",
            Waveform::Saw => "|/",
            Waveform::Triangle => "/\\",
            Waveform::None => "X",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Waveform> {
        match symbol {
            "~" => Some(Waveform::Sine),
            "|_|" => Some(Waveform::Square),
            "|/" => Some(Waveform::Saw),
            "/\\" => Some(Waveform::Triangle),
            "X" => Some(Waveform::None),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Saw => "saw",
            Waveform::Triangle => "triangle",
            Waveform::None => "none",
        }
    }

    /// Value at a phase in `[0, 2π)`, by direct formula
    #[inline]
    pub fn at(&self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Square => {
                if phase < PI {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Saw => phase / PI - 1.0,
            Waveform::Triangle => {
                if phase < PI {
                    -1.0 + 2.0 * phase / PI
                } else {
                    3.0 - 2.0 * phase / PI
                }
            }
            Waveform::None => 0.0,
        }
    }
}

/// Render `count` samples of `waveform` starting from phase zero.
///
/// Stateless: every call restarts the phase. Frequencies that are not
/// positive and finite produce silence.
pub fn render(waveform: Waveform, freq: f64, sample_rate: f32, gain: f32, count: usize) -> Vec<f32> {
    let mut out = vec![0.0; count];
    mix_into(&mut out, waveform, freq, sample_rate, gain);
    out
}

/// Add a phase-zero oscillator into an existing buffer
pub fn mix_into(out: &mut [f32], waveform: Waveform, freq: f64, sample_rate: f32, gain: f32) {
    if waveform == Waveform::None || !(freq.is_finite() && freq > 0.0) || sample_rate <= 0.0 {
        return;
    }
    let inc = TAU * freq / sample_rate as f64;
    let gain = gain as f64;
    let mut phase = 0.0f64;
    for sample in out.iter_mut() {
        *sample += (waveform.at(phase) * gain) as f32;
        phase += inc;
        if phase >= TAU {
            phase %= TAU;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    #[test]
    fn symbols_round_trip() {
        for w in Waveform::ALL {
            assert_eq!(Waveform::from_symbol(w.symbol()), Some(w));
        }
        assert_eq!(Waveform::from_symbol("?"), None);
    }

    #[test]
    fn none_and_bad_frequency_are_silent() {
        assert!(render(Waveform::None, 440.0, SR, 1.0, 64).iter().all(|s| *s == 0.0));
        assert!(render(Waveform::Sine, 0.0, SR, 1.0, 64).iter().all(|s| *s == 0.0));
        assert!(render(Waveform::Saw, -5.0, SR, 1.0, 64).iter().all(|s| *s == 0.0));
        assert!(render(Waveform::Square, f64::NAN, SR, 1.0, 64).iter().all(|s| *s == 0.0));
    }

    #[test]
    fn zero_count_is_empty() {
        assert!(render(Waveform::Sine, 440.0, SR, 1.0, 0).is_empty());
    }

    #[test]
    fn phase_starts_at_zero_every_call() {
        let a = render(Waveform::Saw, 220.0, SR, 1.0, 100);
        let b = render(Waveform::Saw, 220.0, SR, 1.0, 100);
        assert_eq!(a, b);
        assert_eq!(a[0], -1.0);
        assert_eq!(render(Waveform::Square, 220.0, SR, 1.0, 1)[0], 1.0);
        assert_eq!(render(Waveform::Triangle, 220.0, SR, 1.0, 1)[0], -1.0);
    }

    #[test]
    fn output_bounded_by_gain() {
        for w in Waveform::ALL {
            let buf = render(w, 1234.5, SR, 0.5, 4096);
            assert!(buf.iter().all(|s| s.abs() <= 0.5 + 1e-6), "{}", w.name());
        }
    }

    #[test]
    fn square_spends_half_the_cycle_high() {
        // 100 samples per cycle at 441 Hz
        let buf = render(Waveform::Square, 441.0, SR, 1.0, 100);
        let high = buf.iter().filter(|s| **s > 0.0).count();
        assert!((49..=51).contains(&high));
    }

    #[test]
    fn mix_into_accumulates() {
        let mut buf = vec![0.25; 8];
        mix_into(&mut buf, Waveform::Square, 100.0, SR, 0.5);
        assert!(buf.iter().all(|s| (*s - 0.75).abs() < 1e-6));
    }
}
