use serde::{Deserialize, Serialize};

use crate::fx::EffectKind;
use crate::sequencer::{Note, TrackMode};
use crate::synth::{ParamValue, SourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandSource {
    Ui,
    Script,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    // Transport
    Play,
    Pause,
    Stop,
    TogglePlay,
    SetBpm(f32),
    SetLength(u32),

    // Mixer
    SetTrackVolume { track: usize, volume: f32 },
    SetTrackPan { track: usize, pan: f32 },
    ToggleMute(usize),
    ToggleSolo(usize),

    // Track source
    SetMode { track: usize, mode: TrackMode },
    SetSource { track: usize, source: SourceKind },
    SetSourceParam { track: usize, key: String, value: ParamValue },

    // Sampler pads
    SelectPad { track: usize, pitch: u8 },
    SetPadEngine { track: usize, pitch: u8, engine: SourceKind },
    SetPadParam { track: usize, pitch: u8, key: String, value: ParamValue },
    /// Overlay a named preset on the synth params, or on a pad when `pitch` is set
    ApplyPreset { track: usize, pitch: Option<u8>, name: String },

    // Effects chain
    AddEffect { track: usize, kind: EffectKind },
    RemoveEffect { track: usize, index: usize },
    MoveEffect { track: usize, from: usize, to: usize },
    ToggleEffect { track: usize, index: usize },
    SetEffectParam { track: usize, index: usize, key: String, value: ParamValue },

    // Notes
    AddNote { track: usize, note: Note },
    RemoveNote { track: usize, index: usize },
    ClearTrack(usize),
}

impl Command {
    /// Human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            Command::Play => "Play".to_string(),
            Command::Pause => "Pause".to_string(),
            Command::Stop => "Stop".to_string(),
            Command::TogglePlay => "Toggle play".to_string(),
            Command::SetBpm(bpm) => format!("Set BPM to {}", bpm),
            Command::SetLength(ticks) => format!("Set loop length to {} ticks", ticks),
            Command::SetTrackVolume { track, volume } => {
                format!("Set track {} volume to {:.2}", track, volume)
            }
            Command::SetTrackPan { track, pan } => {
                format!("Set track {} pan to {:.2}", track, pan)
            }
            Command::ToggleMute(track) => format!("Toggle mute track {}", track),
            Command::ToggleSolo(track) => format!("Toggle solo track {}", track),
            Command::SetMode { track, mode } => format!("Set track {} mode to {:?}", track, mode),
            Command::SetSource { track, source } => {
                format!("Set track {} source to {}", track, source.id())
            }
            Command::SetSourceParam { track, key, value } => {
                format!("Set track {} param {} to {:?}", track, key, value)
            }
            Command::SelectPad { track, pitch } => format!("Select pad {} on track {}", pitch, track),
            Command::SetPadEngine { track, pitch, engine } => {
                format!("Set track {} pad {} engine to {}", track, pitch, engine.id())
            }
            Command::SetPadParam {
                track,
                pitch,
                key,
                value,
            } => format!("Set track {} pad {} param {} to {:?}", track, pitch, key, value),
            Command::ApplyPreset { track, pitch, name } => match pitch {
                Some(p) => format!("Apply preset '{}' to track {} pad {}", name, track, p),
                None => format!("Apply preset '{}' to track {}", name, track),
            },
            Command::AddEffect { track, kind } => {
                format!("Add {} to track {}", kind.display_name(), track)
            }
            Command::RemoveEffect { track, index } => {
                format!("Remove effect {} from track {}", index, track)
            }
            Command::MoveEffect { track, from, to } => {
                format!("Move track {} effect {} to {}", track, from, to)
            }
            Command::ToggleEffect { track, index } => {
                format!("Toggle effect {} on track {}", index, track)
            }
            Command::SetEffectParam {
                track,
                index,
                key,
                value,
            } => format!("Set track {} effect {} {} to {:?}", track, index, key, value),
            Command::AddNote { track, note } => {
                format!("Add note {} at tick {} to track {}", note.pitch, note.tick, track)
            }
            Command::RemoveNote { track, index } => {
                format!("Remove note {} from track {}", index, track)
            }
            Command::ClearTrack(track) => format!("Clear track {}", track),
        }
    }
}
