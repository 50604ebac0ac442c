//! Blooper: a MIDI sequencer core with a closed catalog of synth and drum
//! engines, per-track effects chains and a voice-managed mixer.

pub mod audio;
pub mod command;
pub mod config;
pub mod engine;
pub mod fx;
pub mod project;
pub mod registry;
pub mod sequencer;
pub mod synth;

pub use engine::Engine;
pub use registry::{catalog, Registry};
