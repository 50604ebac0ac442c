pub mod dual_osc;
pub mod fm_drum;
pub mod noise_drum;
pub mod oscillator;
pub mod params;
pub mod periodic_noise;
pub mod presets;
pub mod source;
pub mod square_cymbal;
pub mod wavetable;

pub use dual_osc::DualOsc;
pub use fm_drum::FmDrum;
pub use noise_drum::NoiseDrum;
pub use oscillator::Waveform;
pub use params::{pitch_multiplier, ParamSet, ParamValue};
pub use periodic_noise::PeriodicNoise;
pub use presets::{find_preset, presets, Preset};
pub use source::{create_source, silence, ParamDescriptor, SourceKind, SourceProcessor};
pub use square_cymbal::SquareCymbal;
pub use wavetable::WavetableSynth;
