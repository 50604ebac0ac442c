use std::f64::consts::TAU;

use super::params::{ParamSet, WAVETABLE_SIZE};
use super::source::SourceKind;

/// A named parameter overlay for one engine
#[derive(Clone, Debug)]
pub struct Preset {
    pub name: &'static str,
    pub params: ParamSet,
}

impl Preset {
    fn new(name: &'static str, params: ParamSet) -> Self {
        Self { name, params }
    }
}

fn table(f: impl Fn(usize) -> f64) -> Vec<f64> {
    (0..WAVETABLE_SIZE).map(f).collect()
}

#[allow(clippy::too_many_arguments)]
fn dual(name: &'static str, o1: &str, o2: &str, interval: i64, detune: i64, mix: f64, cutoff: i64, attack: f64) -> Preset {
    Preset::new(
        name,
        ParamSet::new()
            .with("osc1_type", o1)
            .with("osc2_type", o2)
            .with("osc2_interval", interval)
            .with("osc2_detune", detune)
            .with("osc_mix", mix)
            .with("filter_cutoff", cutoff)
            .with("attack", attack),
    )
}

fn fm(name: &'static str, ratio: f64, depth: f64, length: f64, gain: f64) -> Preset {
    Preset::new(
        name,
        ParamSet::new()
            .with("fm_ratio", ratio)
            .with("fm_depth", depth)
            .with("length", length)
            .with("gain", gain),
    )
}

fn noise(name: &'static str, shape: &str, color: &str, pitch: i64, length: f64, gain: f64) -> Preset {
    Preset::new(
        name,
        ParamSet::new()
            .with("type", shape)
            .with("color", color)
            .with("pitch_hpf", pitch)
            .with("length", length)
            .with("gain", gain),
    )
}

fn lfsr(name: &'static str, mode: &str, div: i64, length: f64, gain: f64) -> Preset {
    Preset::new(
        name,
        ParamSet::new()
            .with("noise_mode", mode)
            .with("sample_rate_div", div)
            .with("length", length)
            .with("gain", gain),
    )
}

fn cymbal(name: &'static str, base: i64, decay: f64, cutoff: i64, ratios: [f64; 6]) -> Preset {
    let mut params = ParamSet::new()
        .with("base_freq", base)
        .with("decay", decay)
        .with("bp_cutoff", cutoff);
    for (i, r) in ratios.iter().enumerate() {
        params.set(&format!("r{}", i + 1), *r);
    }
    Preset::new(name, params)
}

fn wavetable(name: &'static str, values: Vec<f64>) -> Preset {
    Preset::new(name, ParamSet::new().with("table", values))
}

/// Factory presets for an engine, in menu order
pub fn presets(kind: SourceKind) -> Vec<Preset> {
    match kind {
        SourceKind::DualOsc => vec![
            dual("UNISON LEAD", "|/", "|/", 0, 15, 0.5, 8000, 0.01),
            dual("8-BIT BASS", "/\\", "|_|", -12, 0, 0.3, 1500, 0.01),
            dual("POWER LEAD", "|/", "|/", 7, 5, 0.4, 6000, 0.02),
            dual("WARM PAD", "~", "/\\", 0, 20, 0.6, 1200, 0.40),
            dual("CHURCH ORGAN", "|_|", "|_|", 12, 8, 0.5, 3000, 0.08),
        ],
        SourceKind::FmDrum => vec![
            fm("SOLID KICK", 0.5, 10.0, 0.15, 1.2),
            fm("METALLIC TOM", 1.0, 5.0, 0.40, 1.0),
            fm("SEGA BELL", 1.414, 40.0, 0.60, 0.7),
            fm("ZAP / LASER", 15.0, 50.0, 0.25, 0.8),
            fm("SNAPPY SNARE", 12.0, 25.0, 0.12, 1.1),
            fm("TINY BLIP", 2.0, 2.0, 0.05, 1.0),
        ],
        SourceKind::NoiseDrum => vec![
            noise("808 KICK", "DRUM", "BROWN", 45, 0.45, 1.5),
            noise("PUNCHY TOM", "DRUM", "PINK", 120, 0.35, 1.2),
            noise("LIGHT SNARE", "SNARE", "WHITE", 240, 0.15, 1.0),
            noise("HEAVY SNARE", "SNARE", "PINK", 180, 0.28, 1.3),
            noise("HI-HAT", "CYMBAL", "WHITE", 800, 0.08, 0.9),
            noise("CRASH", "CYMBAL", "WHITE", 300, 1.80, 1.0),
            noise("RIDE", "CYMBAL", "PINK", 600, 1.20, 1.1),
        ],
        SourceKind::PeriodicNoise => vec![
            lfsr("8-BIT HI-HAT", "STATIC", 2, 0.06, 0.8),
            lfsr("NES EXPLOSION", "STATIC", 16, 1.20, 1.4),
            lfsr("ROBO-SNARE", "METALLIC", 8, 0.15, 1.0),
            lfsr("PITCHED ZAP", "METALLIC", 4, 0.40, 0.9),
        ],
        SourceKind::SquareCymbal => vec![
            cymbal("808 COWBELL", 165, 0.4, 800, [1.0, 1.5, 2.1, 2.6, 3.1, 4.3]),
            cymbal("CLOSED HAT", 400, 0.05, 8000, [1.2, 2.8, 4.1, 5.5, 6.2, 8.0]),
            cymbal("GONG", 60, 2.5, 1200, [1.0, 1.1, 1.4, 1.9, 2.4, 3.1]),
            cymbal("ANVIL", 300, 0.1, 4000, [1.0, 3.0, 3.1, 3.2, 5.0, 5.1]),
        ],
        SourceKind::Wavetable => vec![
            wavetable("SINE (PURE)", table(|i| (TAU * i as f64 / 32.0).sin())),
            wavetable("PULSE 12.5%", table(|i| if i < 4 { 1.0 } else { -1.0 })),
            wavetable("SAW (BUZZ)", table(|i| 1.0 - i as f64 / 15.5)),
            wavetable(
                "TRIANGLE",
                table(|i| {
                    if i < 16 {
                        i as f64 / 8.0 - 1.0
                    } else {
                        1.0 - (i - 16) as f64 / 8.0
                    }
                }),
            ),
            wavetable("BELL-SINE", table(|i| (TAU * i as f64 / 32.0).sin().abs())),
            wavetable("RESO-STEP", table(|i| (i / 4) as f64 / 4.0 * 2.0 - 1.0)),
            wavetable("DIGI-HARP", table(|i| (TAU * i as f64 / 32.0).sin() * (1.0 - i as f64 / 32.0))),
        ],
    }
}

/// Look up a preset by menu name
pub fn find_preset(kind: SourceKind, name: &str) -> Option<Preset> {
    presets(kind).into_iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_engine_has_presets() {
        for kind in SourceKind::ALL {
            assert!(!presets(kind).is_empty(), "{}", kind.id());
        }
    }

    #[test]
    fn applying_a_preset_keeps_tuning_keys() {
        let mut params = ParamSet::new().with("root_note", 36).with("length", 0.3);
        let preset = find_preset(SourceKind::NoiseDrum, "808 KICK").unwrap();
        params.apply(&preset.params);
        assert_eq!(params.int_or("root_note", 60), 36);
        assert_eq!(params.f64_or("length", 0.0), 0.45);
        assert_eq!(params.str_or("color", ""), "BROWN");
    }

    #[test]
    fn wavetable_presets_fill_the_whole_table() {
        for preset in presets(SourceKind::Wavetable) {
            assert_eq!(preset.params.list("table").map(|t| t.len()), Some(WAVETABLE_SIZE));
        }
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(find_preset(SourceKind::FmDrum, "808 KICK").is_none());
    }
}
