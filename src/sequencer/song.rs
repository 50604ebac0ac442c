use serde::{Deserialize, Serialize};

use crate::config::{MAX_EFFECTS, MIDI_RANGE, NUM_TRACKS, TPQN};
use crate::fx::EffectKind;
use crate::synth::{ParamSet, SourceKind};

/// Index of the track that starts in sampler mode (track 10, drums)
pub const DRUM_TRACK: usize = 9;
/// Pad selected when a sampler track is first opened
pub const DEFAULT_ACTIVE_PAD: u8 = 33;
pub const DEFAULT_VELOCITY: u8 = 100;
pub const DEFAULT_BPM: f32 = 120.0;

fn default_velocity() -> u8 {
    DEFAULT_VELOCITY
}

/// A note event. Serialized with the short keys `t`, `p`, `d`, `v`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "t")]
    pub tick: u32,
    #[serde(rename = "p")]
    pub pitch: u8,
    #[serde(rename = "d")]
    pub duration: u32,
    #[serde(rename = "v", default = "default_velocity")]
    pub velocity: u8,
}

impl Note {
    /// Pitch is clamped to 0-127 and velocity to 1-127
    pub fn new(tick: u32, pitch: u8, duration: u32, velocity: u8) -> Self {
        Self {
            tick,
            pitch: pitch.min(127),
            duration,
            velocity: velocity.clamp(1, 127),
        }
    }

    /// Velocity as a 0-1 gain scalar
    pub fn velocity_gain(&self) -> f32 {
        self.velocity as f32 / 127.0
    }
}

/// Which notes map to which engines on a track
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackMode {
    /// One engine and parameter set for every note
    #[serde(rename = "SYNTH")]
    Synth,
    /// Each pitch has its own pad
    #[serde(rename = "SAMPLER")]
    Sampler,
}

/// Channel-strip settings, applied regardless of mode
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerParams {
    pub volume: f32, // 0-1
    pub pan: f32, // 0 = left, 1 = right
    pub mute: bool,
    pub solo: bool,
}

impl Default for MixerParams {
    fn default() -> Self {
        Self {
            volume: 0.8,
            pan: 0.5,
            mute: false,
            solo: false,
        }
    }
}

/// One entry of a track's effects chain
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectSlot {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    #[serde(default)]
    pub params: ParamSet,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl EffectSlot {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            params: kind.default_params(),
            active: true,
        }
    }
}

/// A sampler pad: engine identifier plus its own parameters.
///
/// The engine is kept as a raw identifier; one the catalog doesn't know
/// simply plays nothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub engine: String,
    #[serde(default)]
    pub params: ParamSet,
    #[serde(default)]
    pub label: String,
}

impl Pad {
    /// Noise-drum pad whose neutral pitch is the pad's own note
    pub fn default_for(pitch: u8) -> Self {
        Self {
            engine: SourceKind::NoiseDrum.id().to_string(),
            params: ParamSet::new()
                .with("pitch_hpf", 60)
                .with("length", 0.3)
                .with("type", "DRUM")
                .with("gain", 1.0)
                .with("transpose", 0)
                .with("color", "WHITE")
                .with("root_note", pitch as i64),
            label: String::new(),
        }
    }
}

/// Parameters of a new synth-mode track (saw + sine dual oscillator)
pub fn default_source_params() -> ParamSet {
    ParamSet::new()
        .with("osc1_type", "|/")
        .with("osc2_type", "~")
        .with("osc_mix", 0.5)
        .with("osc2_interval", 0)
        .with("osc2_detune", 15)
        .with("filter_cutoff", 5000)
        .with("transpose", 0)
        .with("gain", 1.0)
        .with("attack", 0.01)
        .with("length", 0.5)
        .with("root_note", 60)
}

/// One of a song's sixteen tracks.
///
/// `mode`, the legacy `is_drum` flag and the active source identifier only
/// change together, through [`Track::set_mode`].
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub name: String,
    mode: TrackMode,
    is_drum: bool,
    source_type: String,
    last_synth_source: String,
    pub source_params: ParamSet,
    pub piano_roll_scale: String,
    pads: Vec<Pad>,
    pub active_pad: u8,
    pub params: MixerParams,
    effects: Vec<EffectSlot>,
    notes: Vec<Note>,
}

impl Track {
    /// `number` is 1-based; drum tracks start in sampler mode
    pub fn new(number: usize, is_drum: bool) -> Self {
        Self {
            name: if is_drum {
                "Sampler".to_string()
            } else {
                format!("Track {number}")
            },
            mode: if is_drum { TrackMode::Sampler } else { TrackMode::Synth },
            is_drum,
            source_type: SourceKind::DualOsc.id().to_string(),
            last_synth_source: SourceKind::DualOsc.id().to_string(),
            source_params: default_source_params(),
            piano_roll_scale: "CHROMATIC".to_string(),
            pads: (0..MIDI_RANGE as u8).map(Pad::default_for).collect(),
            active_pad: DEFAULT_ACTIVE_PAD,
            params: MixerParams::default(),
            effects: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Rebuild from persisted fields, taking the mode trio as stored
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        base: Track,
        mode: TrackMode,
        is_drum: bool,
        source_type: String,
        last_synth_source: String,
        pads: Vec<Pad>,
        effects: Vec<EffectSlot>,
        notes: Vec<Note>,
    ) -> Self {
        let mut track = Self {
            mode,
            is_drum,
            source_type,
            last_synth_source,
            pads,
            effects,
            notes,
            ..base
        };
        track.pads.truncate(MIDI_RANGE);
        while track.pads.len() < MIDI_RANGE {
            let pitch = track.pads.len() as u8;
            track.pads.push(Pad::default_for(pitch));
        }
        track.effects.truncate(MAX_EFFECTS);
        track.notes.sort_by_key(|n| n.tick);
        track
    }

    pub fn mode(&self) -> TrackMode {
        self.mode
    }

    pub fn is_drum(&self) -> bool {
        self.is_drum
    }

    /// Identifier of the engine currently shown for this track
    pub fn source_type(&self) -> &str {
        &self.source_type
    }

    pub fn last_synth_source(&self) -> &str {
        &self.last_synth_source
    }

    /// Switch mode, updating the drum flag and active source with it
    pub fn set_mode(&mut self, mode: TrackMode) {
        if mode == self.mode {
            return;
        }
        match mode {
            TrackMode::Sampler => {
                self.last_synth_source = self.source_type.clone();
                self.source_type = self.pad(self.active_pad).engine.clone();
                self.is_drum = true;
            }
            TrackMode::Synth => {
                self.source_type = self.last_synth_source.clone();
                self.is_drum = false;
            }
        }
        self.mode = mode;
    }

    /// Swap the synth-mode engine; ignored in sampler mode
    pub fn set_source(&mut self, kind: SourceKind) -> bool {
        if self.mode != TrackMode::Synth {
            return false;
        }
        self.source_type = kind.id().to_string();
        self.last_synth_source = self.source_type.clone();
        true
    }

    /// Focus a pad; in sampler mode the active source follows it
    pub fn select_pad(&mut self, pitch: u8) {
        self.active_pad = pitch.min(127);
        if self.mode == TrackMode::Sampler {
            self.source_type = self.pad(self.active_pad).engine.clone();
        }
    }

    pub fn pad(&self, pitch: u8) -> &Pad {
        &self.pads[(pitch as usize).min(MIDI_RANGE - 1)]
    }

    pub fn pad_mut(&mut self, pitch: u8) -> &mut Pad {
        &mut self.pads[(pitch as usize).min(MIDI_RANGE - 1)]
    }

    pub fn pads(&self) -> &[Pad] {
        &self.pads
    }

    /// Point a pad at another engine, keeping its tuning keys
    pub fn set_pad_engine(&mut self, pitch: u8, kind: SourceKind) {
        let pad = self.pad_mut(pitch);
        pad.engine = kind.id().to_string();
        if self.mode == TrackMode::Sampler && pitch == self.active_pad {
            self.source_type = kind.id().to_string();
        }
    }

    pub fn effects(&self) -> &[EffectSlot] {
        &self.effects
    }

    pub fn effect_mut(&mut self, index: usize) -> Option<&mut EffectSlot> {
        self.effects.get_mut(index)
    }

    /// Append an effect with its default parameters; `false` once the chain is full
    pub fn add_effect(&mut self, kind: EffectKind) -> bool {
        if self.effects.len() >= MAX_EFFECTS {
            return false;
        }
        self.effects.push(EffectSlot::new(kind));
        true
    }

    pub fn remove_effect(&mut self, index: usize) -> Option<EffectSlot> {
        (index < self.effects.len()).then(|| self.effects.remove(index))
    }

    /// Move a slot to a new position in the chain
    pub fn move_effect(&mut self, from: usize, to: usize) -> bool {
        if from >= self.effects.len() || to >= self.effects.len() {
            return false;
        }
        let slot = self.effects.remove(from);
        self.effects.insert(to, slot);
        true
    }

    pub fn toggle_effect(&mut self, index: usize) -> bool {
        match self.effects.get_mut(index) {
            Some(slot) => {
                slot.active = !slot.active;
                true
            }
            None => false,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Insert keeping tick order; ties keep insertion order
    pub fn add_note(&mut self, note: Note) {
        let at = self.notes.partition_point(|n| n.tick <= note.tick);
        self.notes.insert(at, note);
    }

    pub fn remove_note(&mut self, index: usize) -> Option<Note> {
        (index < self.notes.len()).then(|| self.notes.remove(index))
    }

    pub fn clear_notes(&mut self) {
        self.notes.clear();
    }
}

/// Root aggregate: sixteen tracks, tempo and loop length
#[derive(Clone, Debug, PartialEq)]
pub struct Song {
    pub bpm: f32,
    pub length_ticks: u32,
    pub tracks: Vec<Track>,
}

impl Song {
    pub fn new() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            length_ticks: TPQN * 4,
            tracks: (0..NUM_TRACKS).map(|i| Track::new(i + 1, i == DRUM_TRACK)).collect(),
        }
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    /// True when any track has solo engaged
    pub fn any_solo(&self) -> bool {
        self.tracks.iter().any(|t| t.params.solo)
    }

    /// Whether a track is currently heard (not muted, not solo-excluded)
    pub fn is_audible(&self, index: usize) -> bool {
        match self.tracks.get(index) {
            Some(t) => !t.params.mute && (t.params.solo || !self.any_solo()),
            None => false,
        }
    }
}

impl Default for Song {
    fn default() -> Self {
        Self::new()
    }
}
