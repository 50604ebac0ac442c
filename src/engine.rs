use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::audio::{ChannelPool, PlaybackBackend, VoiceManager};
use crate::command::{Command, CommandReceiver};
use crate::config::{EngineConfig, MAX_BPM, MIN_BPM};
use crate::project;
use crate::registry::Registry;
use crate::sequencer::{Note, Song, Transport};
use crate::synth::{find_preset, SourceKind};

/// One playback session: the shared song, the clock and the voices.
///
/// Each frame drains pending commands, advances the clock and triggers the
/// notes it crossed, then refreshes every sounding voice. The song is read
/// under one lock for the whole trigger and refresh pass.
pub struct Engine<B: PlaybackBackend> {
    song: Arc<RwLock<Song>>,
    transport: Transport,
    voices: VoiceManager<B>,
    commands: Option<CommandReceiver>,
    config: EngineConfig,
}

impl<B: PlaybackBackend> Engine<B> {
    pub fn new(song: Song, backend: B, config: EngineConfig) -> Self {
        Self {
            song: Arc::new(RwLock::new(song)),
            transport: Transport::new(),
            voices: VoiceManager::new(backend, Registry::new(config.sample_rate)),
            commands: None,
            config,
        }
    }

    /// Consume commands from a bus at the start of every frame
    pub fn attach_commands(&mut self, rx: CommandReceiver) {
        self.commands = Some(rx);
    }

    /// Shared handle to the song, for an editor to mutate
    pub fn song(&self) -> Arc<RwLock<Song>> {
        self.song.clone()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn voices(&self) -> &VoiceManager<B> {
        &self.voices
    }

    pub fn voices_mut(&mut self) -> &mut VoiceManager<B> {
        &mut self.voices
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn play(&mut self) {
        self.transport.play();
    }

    /// Halt the clock but let sounding voices ring out
    pub fn pause(&mut self) {
        self.transport.pause();
    }

    /// Halt, rewind and silence everything
    pub fn stop(&mut self) {
        self.transport.stop();
        self.voices.stop_all();
    }

    /// Run one scheduling frame covering `dt_ms`. Returns the number of
    /// notes that were due.
    pub fn frame(&mut self, dt_ms: f64) -> usize {
        self.drain_commands();

        let song = self.song.read();
        let solo = song.any_solo();
        let fired = self.transport.advance(&song, dt_ms);
        for trigger in &fired {
            if let Some(track) = song.track(trigger.track) {
                self.voices
                    .trigger_note(trigger.track, track, &trigger.note, song.bpm, solo);
            }
        }
        self.voices.tick(&song);
        fired.len()
    }

    fn drain_commands(&mut self) {
        let Some(rx) = self.commands.clone() else {
            return;
        };
        for (cmd, source) in rx.drain() {
            debug!(?source, "{}", cmd.description());
            self.apply(cmd);
        }
    }

    /// Apply a single command immediately
    pub fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::Stop => self.stop(),
            Command::TogglePlay => {
                if self.transport.is_playing() {
                    self.stop();
                } else {
                    self.play();
                }
            }
            edit => apply_edit(&mut self.song.write(), edit),
        }
    }

    /// Replace the song from a project file. On failure the current song is
    /// left as it was.
    pub fn load_project(&mut self, path: &Path) -> Result<()> {
        let song = project::load_song(path)?;
        self.stop();
        *self.song.write() = song;
        info!(path = %path.display(), "session song replaced");
        Ok(())
    }

    pub fn save_project(&self, path: &Path) -> Result<()> {
        project::save_song(&self.song.read(), path)
    }
}

impl Engine<ChannelPool> {
    /// Run a frame covering `samples` output samples and mix them.
    /// Returns interleaved stereo.
    pub fn render_samples(&mut self, samples: usize) -> Vec<f32> {
        let dt_ms = samples as f64 * 1000.0 / self.config.sample_rate as f64;
        self.frame(dt_ms);
        self.voices.backend_mut().render(samples)
    }

    /// One frame at the configured frame rate
    pub fn render_frame(&mut self) -> Vec<f32> {
        let samples = self.config.frame_samples();
        self.render_samples(samples)
    }
}

/// Song edits: everything but transport control
fn apply_edit(song: &mut Song, cmd: Command) {
    match cmd {
        Command::SetBpm(bpm) => song.bpm = bpm.clamp(MIN_BPM, MAX_BPM),
        Command::SetLength(ticks) => song.length_ticks = ticks.max(1),
        Command::SetTrackVolume { track, volume } => {
            if let Some(t) = song.track_mut(track) {
                t.params.volume = volume.clamp(0.0, 1.0);
            }
        }
        Command::SetTrackPan { track, pan } => {
            if let Some(t) = song.track_mut(track) {
                t.params.pan = pan.clamp(0.0, 1.0);
            }
        }
        Command::ToggleMute(track) => {
            if let Some(t) = song.track_mut(track) {
                t.params.mute = !t.params.mute;
            }
        }
        Command::ToggleSolo(track) => {
            if let Some(t) = song.track_mut(track) {
                t.params.solo = !t.params.solo;
            }
        }
        Command::SetMode { track, mode } => {
            if let Some(t) = song.track_mut(track) {
                t.set_mode(mode);
            }
        }
        Command::SetSource { track, source } => {
            if let Some(t) = song.track_mut(track) {
                if !t.set_source(source) {
                    debug!(track, "source change ignored in sampler mode");
                }
            }
        }
        Command::SetSourceParam { track, key, value } => {
            if let Some(t) = song.track_mut(track) {
                t.source_params.set(&key, value);
            }
        }
        Command::SelectPad { track, pitch } => {
            if let Some(t) = song.track_mut(track) {
                t.select_pad(pitch);
            }
        }
        Command::SetPadEngine { track, pitch, engine } => {
            if let Some(t) = song.track_mut(track) {
                t.set_pad_engine(pitch, engine);
            }
        }
        Command::SetPadParam {
            track,
            pitch,
            key,
            value,
        } => {
            if let Some(t) = song.track_mut(track) {
                t.pad_mut(pitch).params.set(&key, value);
            }
        }
        Command::ApplyPreset { track, pitch, name } => {
            let Some(t) = song.track_mut(track) else {
                return;
            };
            let (engine, params) = match pitch {
                Some(p) => {
                    let pad = t.pad_mut(p);
                    (pad.engine.clone(), &mut pad.params)
                }
                None => (t.source_type().to_string(), &mut t.source_params),
            };
            match SourceKind::from_id(&engine).and_then(|kind| find_preset(kind, &name)) {
                Some(preset) => params.apply(&preset.params),
                None => debug!(engine = %engine, name = %name, "no such preset"),
            }
        }
        Command::AddEffect { track, kind } => {
            if let Some(t) = song.track_mut(track) {
                if !t.add_effect(kind) {
                    debug!(track, "effects chain full");
                }
            }
        }
        Command::RemoveEffect { track, index } => {
            if let Some(t) = song.track_mut(track) {
                t.remove_effect(index);
            }
        }
        Command::MoveEffect { track, from, to } => {
            if let Some(t) = song.track_mut(track) {
                t.move_effect(from, to);
            }
        }
        Command::ToggleEffect { track, index } => {
            if let Some(t) = song.track_mut(track) {
                t.toggle_effect(index);
            }
        }
        Command::SetEffectParam {
            track,
            index,
            key,
            value,
        } => {
            if let Some(slot) = song.track_mut(track).and_then(|t| t.effect_mut(index)) {
                slot.params.set(&key, value);
            }
        }
        Command::AddNote { track, note } => {
            if let Some(t) = song.track_mut(track) {
                t.add_note(Note::new(note.tick, note.pitch, note.duration, note.velocity));
            }
        }
        Command::RemoveNote { track, index } => {
            if let Some(t) = song.track_mut(track) {
                t.remove_note(index);
            }
        }
        Command::ClearTrack(track) => {
            if let Some(t) = song.track_mut(track) {
                t.clear_notes();
            }
        }
        Command::Play | Command::Pause | Command::Stop | Command::TogglePlay => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandBus, CommandSource};
    use crate::fx::EffectKind;
    use crate::sequencer::{TrackMode, DRUM_TRACK};
    use crate::synth::ParamValue;

    fn engine() -> Engine<ChannelPool> {
        Engine::new(Song::new(), ChannelPool::new(16), EngineConfig::default())
    }

    #[test]
    fn frame_triggers_due_notes() {
        let mut e = engine();
        e.song().write().tracks[0].add_note(Note::new(0, 60, 240, 100));
        e.play();
        assert_eq!(e.frame(10.0), 1);
        assert_eq!(e.voices().voices(0).len(), 1);
        assert_eq!(e.frame(10.0), 0);
    }

    #[test]
    fn commands_are_drained_before_the_clock_pass() {
        let mut e = engine();
        let bus = CommandBus::new();
        e.attach_commands(bus.receiver());
        let tx = bus.sender();
        tx.send(
            Command::AddNote {
                track: 1,
                note: Note::new(0, 62, 120, 90),
            },
            CommandSource::Script,
        );
        tx.send(Command::Play, CommandSource::Ui);
        assert_eq!(e.frame(5.0), 1);
        assert!(e.transport().is_playing());
    }

    #[test]
    fn stop_silences_and_rewinds() {
        let mut e = engine();
        e.song().write().tracks[0].add_note(Note::new(0, 60, 240, 100));
        e.play();
        e.frame(10.0);
        e.apply(Command::Stop);
        assert_eq!(e.voices().voice_count(), 0);
        assert_eq!(e.transport().position(), 0.0);
    }

    #[test]
    fn edits_reach_the_song() {
        let mut e = engine();
        e.apply(Command::SetBpm(1000.0));
        e.apply(Command::SetMode {
            track: 0,
            mode: TrackMode::Sampler,
        });
        e.apply(Command::AddEffect {
            track: 0,
            kind: EffectKind::Eq,
        });
        e.apply(Command::SetEffectParam {
            track: 0,
            index: 0,
            key: "band_3".to_string(),
            value: ParamValue::from(1.5),
        });
        e.apply(Command::ToggleSolo(3));
        let song = e.song();
        let song = song.read();
        assert_eq!(song.bpm, MAX_BPM);
        assert!(song.tracks[0].is_drum());
        assert_eq!(song.tracks[0].effects()[0].params.f64_or("band_3", 0.0), 1.5);
        assert!(song.tracks[3].params.solo);
    }

    #[test]
    fn non_finite_param_edit_keeps_project_saveable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nan.bloop");
        let mut e = engine();
        e.apply(Command::SetSourceParam {
            track: 0,
            key: "filter_cutoff".to_string(),
            value: ParamValue::from(f64::NAN),
        });
        e.save_project(&path).unwrap();
        e.load_project(&path).unwrap();
        let song = e.song();
        assert_eq!(song.read().tracks[0].source_params.f64_or("filter_cutoff", 0.0), 5000.0);
    }

    #[test]
    fn preset_overlays_pad_params() {
        let mut e = engine();
        e.apply(Command::SetPadEngine {
            track: DRUM_TRACK,
            pitch: 36,
            engine: SourceKind::FmDrum,
        });
        let preset = crate::synth::presets(SourceKind::FmDrum)
            .into_iter()
            .next()
            .expect("fm drum presets");
        e.apply(Command::ApplyPreset {
            track: DRUM_TRACK,
            pitch: Some(36),
            name: preset.name.to_string(),
        });
        let song = e.song();
        let song = song.read();
        let pad = song.tracks[DRUM_TRACK].pad(36);
        for (key, value) in preset.params.iter() {
            assert_eq!(pad.params.get(key), Some(value));
        }
    }
}
