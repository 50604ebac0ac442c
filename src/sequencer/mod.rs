pub mod song;
pub mod transport;

pub use song::{
    default_source_params, EffectSlot, MixerParams, Note, Pad, Song, Track, TrackMode, DEFAULT_ACTIVE_PAD,
    DRUM_TRACK,
};
pub use transport::{Transport, Trigger};
