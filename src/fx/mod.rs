pub mod eq;
pub mod filter;
pub mod plate;
pub mod reverb;

pub use eq::Equalizer;
pub use filter::{Biquad, FilterError};
pub use plate::PlateReverb;
pub use reverb::Reverb;

use serde::{Deserialize, Serialize};

use crate::synth::ParamSet;

/// Identifies an effect in the closed catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectKind {
    #[serde(rename = "EQ")]
    Eq,
    #[serde(rename = "REVERB")]
    Reverb,
    #[serde(rename = "PLATE_REVERB")]
    PlateReverb,
}

impl EffectKind {
    pub const ALL: [EffectKind; 3] = [EffectKind::Eq, EffectKind::Reverb, EffectKind::PlateReverb];

    pub fn id(&self) -> &'static str {
        match self {
            EffectKind::Eq => "EQ",
            EffectKind::Reverb => "REVERB",
            EffectKind::PlateReverb => "PLATE_REVERB",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EffectKind::Eq => "8-BAND EQ",
            EffectKind::Reverb => "REVERB",
            EffectKind::PlateReverb => "PLATE REVERB",
        }
    }

    pub fn from_id(id: &str) -> Option<EffectKind> {
        match id {
            "EQ" => Some(EffectKind::Eq),
            "REVERB" => Some(EffectKind::Reverb),
            "PLATE_REVERB" => Some(EffectKind::PlateReverb),
            _ => None,
        }
    }

    /// Parameters a freshly added slot starts with
    pub fn default_params(&self) -> ParamSet {
        match self {
            EffectKind::Eq => (0..eq::EQ_BANDS).fold(ParamSet::new(), |p, band| p.with(&eq::band_key(band), 1.0)),
            EffectKind::Reverb => ParamSet::new().with("mix", 0.1).with("size", 0.5),
            EffectKind::PlateReverb => ParamSet::new()
                .with("mix", 0.2)
                .with("decay", 0.6)
                .with("damping", 0.7)
                .with("predelay", 0.01),
        }
    }
}

/// A whole-buffer transform applied to a rendered note.
///
/// Output length always equals input length. Bypassing is the chain's job:
/// a processor never sees an inactive slot.
pub trait EffectProcessor: Send {
    fn kind(&self) -> EffectKind;

    fn process(&self, input: &[f32], params: &ParamSet) -> Vec<f32>;
}

/// Factory: one processor instance for a catalog entry
pub fn create_effect(kind: EffectKind, sample_rate: f32) -> Box<dyn EffectProcessor> {
    match kind {
        EffectKind::Eq => Box::new(Equalizer::new(sample_rate)),
        EffectKind::Reverb => Box::new(Reverb::new(sample_rate)),
        EffectKind::PlateReverb => Box::new(PlateReverb::new(sample_rate)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for kind in EffectKind::ALL {
            assert_eq!(EffectKind::from_id(kind.id()), Some(kind));
            assert_eq!(create_effect(kind, 44100.0).kind(), kind);
        }
        assert_eq!(EffectKind::from_id("CHORUS"), None);
    }

    #[test]
    fn eq_defaults_are_neutral() {
        let params = EffectKind::Eq.default_params();
        assert_eq!(params.len(), 8);
        assert!(params.iter().all(|(_, v)| v.as_f64() == Some(1.0)));
    }

    #[test]
    fn every_effect_preserves_length_with_defaults() {
        let input: Vec<f32> = (0..3000).map(|i| ((i as f32) * 0.05).sin()).collect();
        for kind in EffectKind::ALL {
            let fx = create_effect(kind, 44100.0);
            assert_eq!(fx.process(&input, &kind.default_params()).len(), input.len(), "{}", kind.id());
        }
    }
}
