pub mod renderer;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{NUM_TRACKS, TPQN};
use crate::sequencer::{EffectSlot, Note, Pad, Song, Track, TrackMode, DRUM_TRACK};
use crate::synth::ParamSet;

/// Format version written into every project file
pub const PROJECT_VERSION: &str = "4.1.0";
const SUPPORTED_MAJOR: u64 = 4;

fn default_version() -> String {
    PROJECT_VERSION.to_string()
}

fn default_bpm() -> f32 {
    120.0
}

fn default_length() -> u32 {
    TPQN * 4
}

/// Serializable song, as stored in a project file
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SongData {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_bpm")]
    pub bpm: f32,
    #[serde(default = "default_length")]
    pub length_ticks: u32,
    #[serde(default)]
    pub tracks: Vec<TrackData>,
}

/// Per-track data. Every field is optional so that older files load with
/// defaults filled in.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackData {
    pub name: Option<String>,
    pub is_drum: Option<bool>,
    pub mode: Option<TrackMode>,
    pub source_type: Option<String>,
    pub last_synth_source: Option<String>,
    pub source_params: Option<ParamSet>,
    pub piano_roll_scale: Option<String>,
    pub active_pad: Option<u8>,
    pub sampler_map: Option<BTreeMap<u8, PadData>>,
    pub params: MixerData,
    /// Kept raw so one unknown effect type doesn't fail the whole load
    pub effects: Vec<Value>,
    pub notes: Vec<Note>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PadData {
    pub engine: Option<String>,
    pub params: Option<ParamSet>,
    pub label: Option<String>,
}

/// Saved mixer keys, merged over the defaults
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerData {
    pub volume: Option<f32>,
    pub pan: Option<f32>,
    pub mute: Option<bool>,
    pub solo: Option<bool>,
}

impl SongData {
    /// Snapshot a song into its serializable form
    pub fn from_song(song: &Song) -> Self {
        Self {
            version: PROJECT_VERSION.to_string(),
            bpm: song.bpm,
            length_ticks: song.length_ticks,
            tracks: song.tracks.iter().map(TrackData::from_track).collect(),
        }
    }

    /// Rebuild a song, padding or truncating to sixteen tracks
    pub fn to_song(&self) -> Result<Song> {
        check_version(&self.version)?;
        if self.tracks.len() > NUM_TRACKS {
            warn!(tracks = self.tracks.len(), "extra tracks ignored");
        }
        let tracks = (0..NUM_TRACKS)
            .map(|i| {
                let base = Track::new(i + 1, i == DRUM_TRACK);
                match self.tracks.get(i) {
                    Some(data) => data.to_track(base),
                    None => base,
                }
            })
            .collect();
        Ok(Song {
            bpm: self.bpm,
            length_ticks: self.length_ticks,
            tracks,
        })
    }
}

impl TrackData {
    fn from_track(track: &Track) -> Self {
        let sampler_map = track
            .pads()
            .iter()
            .enumerate()
            .map(|(pitch, pad)| {
                (
                    pitch as u8,
                    PadData {
                        engine: Some(pad.engine.clone()),
                        params: Some(pad.params.clone()),
                        label: Some(pad.label.clone()),
                    },
                )
            })
            .collect();
        Self {
            name: Some(track.name.clone()),
            is_drum: Some(track.is_drum()),
            mode: Some(track.mode()),
            source_type: Some(track.source_type().to_string()),
            last_synth_source: Some(track.last_synth_source().to_string()),
            source_params: Some(track.source_params.clone()),
            piano_roll_scale: Some(track.piano_roll_scale.clone()),
            active_pad: Some(track.active_pad),
            sampler_map: Some(sampler_map),
            params: MixerData {
                volume: Some(track.params.volume),
                pan: Some(track.params.pan),
                mute: Some(track.params.mute),
                solo: Some(track.params.solo),
            },
            effects: track
                .effects()
                .iter()
                .filter_map(|slot| serde_json::to_value(slot).ok())
                .collect(),
            notes: track.notes().to_vec(),
        }
    }

    /// Merge over a default track. `mode` wins over the legacy flag when both are present.
    fn to_track(&self, mut base: Track) -> Track {
        if let Some(name) = &self.name {
            base.name = name.clone();
        }
        if let Some(params) = &self.source_params {
            base.source_params.apply(params);
        }
        if let Some(scale) = &self.piano_roll_scale {
            base.piano_roll_scale = scale.clone();
        }
        if let Some(pad) = self.active_pad {
            base.active_pad = pad.min(127);
        }
        let mixer = &self.params;
        base.params.volume = mixer.volume.unwrap_or(base.params.volume).clamp(0.0, 1.0);
        base.params.pan = mixer.pan.unwrap_or(base.params.pan).clamp(0.0, 1.0);
        base.params.mute = mixer.mute.unwrap_or(base.params.mute);
        base.params.solo = mixer.solo.unwrap_or(base.params.solo);

        let mode = match (self.mode, self.is_drum) {
            (Some(mode), _) => mode,
            (None, Some(true)) => TrackMode::Sampler,
            (None, Some(false)) => TrackMode::Synth,
            (None, None) => base.mode(),
        };
        let source_type = self
            .source_type
            .clone()
            .unwrap_or_else(|| base.source_type().to_string());
        let last_synth_source = self
            .last_synth_source
            .clone()
            .unwrap_or_else(|| source_type.clone());

        let pads = match &self.sampler_map {
            Some(map) => (0..=127u8)
                .map(|pitch| match map.get(&pitch) {
                    Some(data) => {
                        let default = Pad::default_for(pitch);
                        Pad {
                            engine: data.engine.clone().unwrap_or(default.engine),
                            params: data.params.clone().unwrap_or(default.params),
                            label: data.label.clone().unwrap_or_default(),
                        }
                    }
                    None => Pad::default_for(pitch),
                })
                .collect(),
            None => base.pads().to_vec(),
        };

        let effects = self
            .effects
            .iter()
            .filter_map(|raw| match serde_json::from_value::<EffectSlot>(raw.clone()) {
                Ok(slot) => Some(slot),
                Err(err) => {
                    warn!(%err, "skipping unreadable effect slot");
                    None
                }
            })
            .collect();

        Track::from_parts(
            base,
            mode,
            mode == TrackMode::Sampler,
            source_type,
            last_synth_source,
            pads,
            effects,
            self.notes
                .iter()
                .map(|n| Note::new(n.tick, n.pitch, n.duration, n.velocity))
                .collect(),
        )
    }
}

fn check_version(version: &str) -> Result<()> {
    let major = version
        .split('.')
        .next()
        .and_then(|m| m.trim().parse::<u64>().ok());
    match major {
        Some(major) if major > SUPPORTED_MAJOR => bail!(
            "Project version {} is newer than supported version {}",
            version,
            PROJECT_VERSION
        ),
        Some(_) => Ok(()),
        None => {
            debug!(version, "unparseable project version, loading anyway");
            Ok(())
        }
    }
}

/// Serialize a song to pretty JSON
pub fn song_to_json(song: &Song) -> Result<String> {
    serde_json::to_string_pretty(&SongData::from_song(song)).context("Failed to serialize project")
}

/// Parse a song from JSON text
pub fn song_from_json(json: &str) -> Result<Song> {
    let data: SongData = serde_json::from_str(json).context("Failed to parse project")?;
    data.to_song()
}

/// Save a song to a project file
pub fn save_song(song: &Song, path: &Path) -> Result<()> {
    let json = song_to_json(song)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "project saved");
    Ok(())
}

/// Load a song from a project file
pub fn load_song(path: &Path) -> Result<Song> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let song = song_from_json(&json).with_context(|| format!("Failed to load {}", path.display()))?;
    info!(path = %path.display(), "project loaded");
    Ok(song)
}
