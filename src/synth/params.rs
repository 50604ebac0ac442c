use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::oscillator::Waveform;

/// A single scalar parameter value as stored in a project file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Only used by the wavetable engine's editable table
    List(Vec<f64>),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// False for NaN or infinite numbers, which JSON cannot hold
    pub fn is_finite(&self) -> bool {
        match self {
            ParamValue::Float(v) => v.is_finite(),
            ParamValue::List(values) => values.iter().all(|v| v.is_finite()),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v as f64)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(v: Vec<f64>) -> Self {
        ParamValue::List(v)
    }
}

/// Flat string-keyed parameter map scoped to one processor instance.
///
/// Lookups always carry an explicit default: a missing key, or a key holding
/// a value of the wrong kind, resolves to that default. Non-finite numbers
/// are never stored, and `null` entries in a file load as missing keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParamSet {
    values: BTreeMap<String, ParamValue>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Store a value. A NaN or infinite number is ignored and the key
    /// keeps whatever it held before.
    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) {
        let value = value.into();
        if !value.is_finite() {
            debug!(key, "ignoring non-finite parameter value");
            return;
        }
        self.values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(ParamValue::as_f64).unwrap_or(default)
    }

    pub fn f32_or(&self, key: &str, default: f32) -> f32 {
        self.f64_or(key, default as f64) as f32
    }

    /// Integer lookup; float values are truncated toward zero
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(ParamValue::Int(v)) => *v,
            Some(ParamValue::Float(v)) if v.is_finite() => v.trunc() as i64,
            _ => default,
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(ParamValue::Bool(b)) => *b,
            Some(ParamValue::Int(v)) => *v != 0,
            _ => default,
        }
    }

    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(ParamValue::as_str).unwrap_or(default)
    }

    pub fn list(&self, key: &str) -> Option<&[f64]> {
        match self.get(key) {
            Some(ParamValue::List(v)) => Some(v),
            _ => None,
        }
    }

    /// Overlay every key of `other` onto this set (presets, older saves)
    pub fn apply(&mut self, other: &ParamSet) {
        for (k, v) in other.iter() {
            self.values.insert(k.clone(), v.clone());
        }
    }
}

impl<'de> Deserialize<'de> for ParamSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Option<ParamValue>>::deserialize(deserializer)?;
        let values = raw
            .into_iter()
            .filter_map(|(k, v)| v.filter(ParamValue::is_finite).map(|v| (k, v)))
            .collect();
        Ok(Self { values })
    }
}

/// Equal-tempered pitch ratio shared by every pitched engine
pub fn pitch_multiplier(pitch: u8, root_note: i64, transpose: i64) -> f64 {
    let semitones = pitch as i64 - root_note + transpose;
    2.0f64.powf(semitones as f64 / 12.0)
}

/// Number of samples for a duration in seconds; `None` when the result
/// would be empty (callers substitute the fixed silent buffer).
pub fn duration_samples(seconds: f64, sample_rate: f32) -> Option<usize> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    let n = (seconds * sample_rate as f64).round();
    if n < 1.0 {
        None
    } else {
        Some(n as usize)
    }
}

/// Settings every source engine reads: `root_note`, `transpose`, `gain`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tuning {
    pub root_note: i64,
    pub transpose: i64,
    pub gain: f32,
}

impl Tuning {
    pub fn from_params(params: &ParamSet) -> Self {
        Self {
            root_note: params.int_or("root_note", 60),
            transpose: params.int_or("transpose", 0),
            gain: params.f32_or("gain", 1.0),
        }
    }

    pub fn ratio(&self, pitch: u8) -> f64 {
        pitch_multiplier(pitch, self.root_note, self.transpose)
    }
}

/// Dual oscillator parameters
#[derive(Clone, Debug, PartialEq)]
pub struct DualOscParams {
    pub osc1: Waveform,
    pub osc2: Waveform,
    /// 0 is all osc1, 1 is all osc2
    pub osc_mix: f32,
    /// Semitones, -12..12
    pub osc2_interval: f64,
    /// Cents, 0..100
    pub osc2_detune: f64,
    /// Hz
    pub filter_cutoff: f32,
    /// Seconds
    pub attack: f64,
    /// Decay seconds after attack
    pub length: f64,
}

impl DualOscParams {
    pub fn from_params(params: &ParamSet) -> Self {
        Self {
            osc1: Waveform::from_symbol(params.str_or("osc1_type", "|/")).unwrap_or(Waveform::Saw),
            osc2: Waveform::from_symbol(params.str_or("osc2_type", "~")).unwrap_or(Waveform::Sine),
            osc_mix: params.f32_or("osc_mix", 0.5),
            osc2_interval: params.f64_or("osc2_interval", 0.0),
            osc2_detune: params.f64_or("osc2_detune", 10.0),
            filter_cutoff: params.f32_or("filter_cutoff", 5000.0),
            attack: params.f64_or("attack", 0.01),
            length: params.f64_or("length", 0.5),
        }
    }
}

/// Two-operator FM percussion parameters
#[derive(Clone, Debug, PartialEq)]
pub struct FmDrumParams {
    pub fm_ratio: f64, // modulator / carrier, 0.1-20
    pub fm_depth: f64, // modulation index, 0-50
    pub length: f64,
}

impl FmDrumParams {
    pub fn from_params(params: &ParamSet) -> Self {
        Self {
            fm_ratio: params.f64_or("fm_ratio", 3.5),
            fm_depth: params.f64_or("fm_depth", 5.0),
            length: params.f64_or("length", 0.3),
        }
    }
}

/// Noise drum parameters
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseDrumParams {
    pub shape: NoiseShape,
    pub color: NoiseColor,
    pub pitch_hpf: f64, // 20-1000, tone pitch or high-pass position
    pub length: f64,
}

impl NoiseDrumParams {
    pub fn from_params(params: &ParamSet) -> Self {
        Self {
            shape: NoiseShape::from_name(params.str_or("type", "DRUM")),
            color: NoiseColor::from_name(params.str_or("color", "WHITE")),
            pitch_hpf: params.f64_or("pitch_hpf", 60.0),
            length: params.f64_or("length", 0.3),
        }
    }
}

/// Periodic (LFSR) noise parameters
#[derive(Clone, Debug, PartialEq)]
pub struct PeriodicNoiseParams {
    pub mode: LfsrMode,
    pub rate_div: f64, // 1-32, samples held per bit at root pitch
    pub length: f64,
}

impl PeriodicNoiseParams {
    pub fn from_params(params: &ParamSet) -> Self {
        Self {
            mode: LfsrMode::from_name(params.str_or("noise_mode", "STATIC")),
            rate_div: params.f64_or("sample_rate_div", 4.0),
            length: params.f64_or("length", 0.3),
        }
    }
}

/// Six-square cymbal parameters
#[derive(Clone, Debug, PartialEq)]
pub struct SquareCymbalParams {
    pub base_freq: f64, // 40-800 Hz
    pub bp_cutoff: f64, // 500-12000 Hz
    pub ratios: [f64; 6],
    pub decay: f64,
}

impl SquareCymbalParams {
    pub fn from_params(params: &ParamSet) -> Self {
        let ratios = std::array::from_fn(|i| {
            params.f64_or(&format!("r{}", i + 1), 1.0 + i as f64 * 0.6)
        });
        Self {
            base_freq: params.f64_or("base_freq", 200.0),
            bp_cutoff: params.f64_or("bp_cutoff", 5000.0),
            ratios,
            decay: params.f64_or("decay", 0.5),
        }
    }
}

pub const WAVETABLE_SIZE: usize = 32;

/// Wavetable synth parameters
#[derive(Clone, Debug, PartialEq)]
pub struct WavetableParams {
    pub table: [f32; WAVETABLE_SIZE],
    pub decay: f64,
}

impl WavetableParams {
    pub fn from_params(params: &ParamSet) -> Self {
        let table = match params.list("table") {
            Some(values) if values.len() == WAVETABLE_SIZE => {
                std::array::from_fn(|i| values[i] as f32)
            }
            _ => sine_table(),
        };
        Self {
            table,
            decay: params.f64_or("decay", 0.5),
        }
    }
}

/// One cycle of sine, the wavetable default
pub fn sine_table() -> [f32; WAVETABLE_SIZE] {
    std::array::from_fn(|i| (std::f64::consts::TAU * i as f64 / WAVETABLE_SIZE as f64).sin() as f32)
}

/// Noise drum voicing selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoiseShape {
    Drum,
    Snare,
    Cymbal,
}

impl NoiseShape {
    pub fn from_name(name: &str) -> Self {
        match name {
            "SNARE" => NoiseShape::Snare,
            "CYMBAL" => NoiseShape::Cymbal,
            _ => NoiseShape::Drum,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NoiseShape::Drum => "DRUM",
            NoiseShape::Snare => "SNARE",
            NoiseShape::Cymbal => "CYMBAL",
        }
    }
}

/// Spectral tilt of the noise source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoiseColor {
    White,
    Pink,
    Brown,
}

impl NoiseColor {
    pub fn from_name(name: &str) -> Self {
        match name {
            "PINK" => NoiseColor::Pink,
            "BROWN" => NoiseColor::Brown,
            _ => NoiseColor::White,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NoiseColor::White => "WHITE",
            NoiseColor::Pink => "PINK",
            NoiseColor::Brown => "BROWN",
        }
    }
}

/// Shift-register sequence length
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LfsrMode {
    /// Long period, hiss
    Static,
    /// Short period, audibly tonal
    Metallic,
}

impl LfsrMode {
    pub fn from_name(name: &str) -> Self {
        match name {
            "METALLIC" => LfsrMode::Metallic,
            _ => LfsrMode::Static,
        }
    }

    pub fn period(&self) -> usize {
        match self {
            LfsrMode::Static => 32767,
            LfsrMode::Metallic => 93,
        }
    }
}
