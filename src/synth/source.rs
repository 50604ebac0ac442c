use serde::{Deserialize, Serialize};

use crate::config::SILENT_BUFFER_LEN;
use crate::sequencer::Note;

use super::dual_osc::DualOsc;
use super::fm_drum::FmDrum;
use super::noise_drum::NoiseDrum;
use super::params::ParamSet;
use super::periodic_noise::PeriodicNoise;
use super::square_cymbal::SquareCymbal;
use super::wavetable::WavetableSynth;

/// Identifies a source engine in the closed catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "DUAL_OSC")]
    DualOsc,
    #[serde(rename = "NOISE_DRUM")]
    NoiseDrum,
    #[serde(rename = "SQUARE_CYMBAL")]
    SquareCymbal,
    #[serde(rename = "WAVETABLE_SYNTH")]
    Wavetable,
    #[serde(rename = "FM_DRUM")]
    FmDrum,
    #[serde(rename = "PERIODIC_NOISE")]
    PeriodicNoise,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::DualOsc,
        SourceKind::NoiseDrum,
        SourceKind::SquareCymbal,
        SourceKind::Wavetable,
        SourceKind::FmDrum,
        SourceKind::PeriodicNoise,
    ];

    /// Stable catalog identifier, as stored in project files
    pub fn id(&self) -> &'static str {
        match self {
            SourceKind::DualOsc => "DUAL_OSC",
            SourceKind::NoiseDrum => "NOISE_DRUM",
            SourceKind::SquareCymbal => "SQUARE_CYMBAL",
            SourceKind::Wavetable => "WAVETABLE_SYNTH",
            SourceKind::FmDrum => "FM_DRUM",
            SourceKind::PeriodicNoise => "PERIODIC_NOISE",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::DualOsc => "DUAL OSCILLATOR",
            SourceKind::NoiseDrum => "NOISE DRUM",
            SourceKind::SquareCymbal => "SQUARE CYMBAL",
            SourceKind::Wavetable => "8-BIT WAVETABLE",
            SourceKind::FmDrum => "FM DRUM",
            SourceKind::PeriodicNoise => "PERIODIC NOISE",
        }
    }

    pub fn from_id(id: &str) -> Option<SourceKind> {
        match id {
            "DUAL_OSC" => Some(SourceKind::DualOsc),
            "NOISE_DRUM" => Some(SourceKind::NoiseDrum),
            "SQUARE_CYMBAL" => Some(SourceKind::SquareCymbal),
            "WAVETABLE_SYNTH" => Some(SourceKind::Wavetable),
            "FM_DRUM" => Some(SourceKind::FmDrum),
            "PERIODIC_NOISE" => Some(SourceKind::PeriodicNoise),
            _ => None,
        }
    }

    /// Numeric controls exposed to an editor, with their ranges
    pub fn param_descriptors(&self) -> Vec<ParamDescriptor> {
        let mut out = vec![
            ParamDescriptor::new("gain", "Gain", 0.0, 2.0, 1.0),
            ParamDescriptor::new("transpose", "Transpose", -24.0, 24.0, 0.0),
            ParamDescriptor::new("root_note", "Root", 0.0, 127.0, 60.0),
        ];
        let specific: &[(&str, &str, f32, f32, f32)] = match self {
            SourceKind::DualOsc => &[
                ("osc_mix", "Mix", 0.0, 1.0, 0.5),
                ("osc2_interval", "Interval", -12.0, 12.0, 0.0),
                ("osc2_detune", "Detune", 0.0, 100.0, 10.0),
                ("filter_cutoff", "Cutoff", 20.0, 20000.0, 5000.0),
                ("attack", "Attack", 0.0, 2.0, 0.01),
                ("length", "Length", 0.01, 4.0, 0.5),
            ],
            SourceKind::NoiseDrum => &[
                ("pitch_hpf", "Pitch/HPF", 20.0, 1000.0, 60.0),
                ("length", "Length", 0.01, 2.0, 0.3),
            ],
            SourceKind::SquareCymbal => &[
                ("base_freq", "Base", 40.0, 800.0, 200.0),
                ("bp_cutoff", "Band", 500.0, 12000.0, 5000.0),
                ("decay", "Decay", 0.01, 3.0, 0.5),
            ],
            SourceKind::Wavetable => &[("decay", "Decay", 0.01, 4.0, 0.5)],
            SourceKind::FmDrum => &[
                ("fm_ratio", "Ratio", 0.1, 20.0, 3.5),
                ("fm_depth", "Depth", 0.0, 50.0, 5.0),
                ("length", "Length", 0.01, 2.0, 0.3),
            ],
            SourceKind::PeriodicNoise => &[
                ("sample_rate_div", "Rate Div", 1.0, 32.0, 4.0),
                ("length", "Length", 0.01, 2.0, 0.3),
            ],
        };
        out.extend(
            specific
                .iter()
                .map(|(key, name, min, max, default)| ParamDescriptor::new(key, name, *min, *max, *default)),
        );
        out
    }
}

/// Describes a numeric parameter with its range and default
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub key: String,
    pub name: String,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamDescriptor {
    pub fn new(key: &str, name: &str, min: f32, max: f32, default: f32) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            min,
            max,
            default,
        }
    }
}

/// A per-note sound generator.
///
/// `generate` renders one finite buffer per note. It never fails: missing
/// parameters take their defaults and a non-positive duration yields
/// [`silence`]. `&mut self` is only used for memoization caches.
pub trait SourceProcessor: Send {
    fn kind(&self) -> SourceKind;

    fn generate(&mut self, params: &ParamSet, note: &Note, bpm: f32) -> Vec<f32>;
}

/// The fixed short silent buffer returned for empty durations
pub fn silence() -> Vec<f32> {
    vec![0.0; SILENT_BUFFER_LEN]
}

/// Factory: one processor instance for a catalog entry
pub fn create_source(kind: SourceKind, sample_rate: f32) -> Box<dyn SourceProcessor> {
    match kind {
        SourceKind::DualOsc => Box::new(DualOsc::new(sample_rate)),
        SourceKind::NoiseDrum => Box::new(NoiseDrum::new(sample_rate)),
        SourceKind::SquareCymbal => Box::new(SquareCymbal::new(sample_rate)),
        SourceKind::Wavetable => Box::new(WavetableSynth::new(sample_rate)),
        SourceKind::FmDrum => Box::new(FmDrum::new(sample_rate)),
        SourceKind::PeriodicNoise => Box::new(PeriodicNoise::new(sample_rate)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for kind in SourceKind::ALL {
            assert_eq!(SourceKind::from_id(kind.id()), Some(kind));
            assert_eq!(create_source(kind, 44100.0).kind(), kind);
        }
        assert_eq!(SourceKind::from_id("SUPERSAW"), None);
    }

    #[test]
    fn serde_uses_catalog_ids() {
        let json = serde_json::to_string(&SourceKind::Wavetable).unwrap();
        assert_eq!(json, "\"WAVETABLE_SYNTH\"");
    }

    #[test]
    fn non_positive_duration_gives_fixed_silence() {
        let note = Note::new(0, 60, 480, 100);
        for kind in SourceKind::ALL {
            let mut source = create_source(kind, 44100.0);
            for length in [0.0, -1.0] {
                let params = ParamSet::new().with("length", length).with("decay", length);
                let buf = source.generate(&params, &note, 120.0);
                assert_eq!(buf.len(), SILENT_BUFFER_LEN, "{}", kind.id());
                assert!(buf.iter().all(|s| *s == 0.0), "{}", kind.id());
            }
        }
    }

    #[test]
    fn default_params_are_audible_and_finite() {
        let note = Note::new(0, 60, 480, 100);
        for kind in SourceKind::ALL {
            let mut source = create_source(kind, 44100.0);
            let buf = source.generate(&ParamSet::new(), &note, 120.0);
            assert!(buf.iter().all(|s| s.is_finite()), "{}", kind.id());
            assert!(buf.iter().any(|s| s.abs() > 1e-3), "{}", kind.id());
        }
    }
}
