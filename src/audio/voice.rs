use tracing::trace;

use crate::config::NUM_TRACKS;
use crate::registry::Registry;
use crate::sequencer::{Note, Song, Track, TrackMode};

use super::channel::{ChannelHandle, PlaybackBackend, Sound};

/// A note that is sounding on a playback channel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Voice {
    pub handle: ChannelHandle,
    /// velocity / 127, fixed at trigger time
    pub velocity_gain: f32,
    /// Last gain applied to the channel (volume x velocity, 0 when silenced)
    pub gain: f32,
}

/// Split a gain into left/right channel volumes; pan 0 is hard left
pub fn pan_split(gain: f32, pan: f32) -> (f32, f32) {
    let pan = pan.clamp(0.0, 1.0);
    (gain * (1.0 - pan), gain * pan)
}

/// Turns note triggers into playing voices and keeps them in step with the mixer.
///
/// Only channel handles and gain scalars are kept per track; note data stays
/// with the song.
pub struct VoiceManager<B: PlaybackBackend> {
    backend: B,
    registry: Registry,
    voices: Vec<Vec<Voice>>,
}

impl<B: PlaybackBackend> VoiceManager<B> {
    pub fn new(backend: B, registry: Registry) -> Self {
        Self {
            backend,
            registry,
            voices: (0..NUM_TRACKS).map(|_| Vec::new()).collect(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Voices currently tracked for a track
    pub fn voices(&self, track: usize) -> &[Voice] {
        self.voices.get(track).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn voice_count(&self) -> usize {
        self.voices.iter().map(Vec::len).sum()
    }

    /// Generate a note's buffer and run it through the track's active effects.
    ///
    /// `None` when the engine identifier is not in the catalog.
    pub fn render_note(&mut self, track: &Track, note: &Note, bpm: f32) -> Option<Vec<f32>> {
        let (engine, params) = match track.mode() {
            TrackMode::Synth => (track.source_type(), &track.source_params),
            TrackMode::Sampler => {
                let pad = track.pad(note.pitch);
                (pad.engine.as_str(), &pad.params)
            }
        };
        let mut buffer = self.registry.source(engine)?.generate(params, note, bpm);
        for slot in track.effects().iter().filter(|slot| slot.active) {
            buffer = self.registry.effect(slot.kind).process(&buffer, &slot.params);
        }
        Some(buffer)
    }

    /// Start a note on a track.
    ///
    /// Muted and solo-excluded tracks, and notes whose engine is unknown,
    /// produce no voice. Channel exhaustion never drops the note: the
    /// backend reclaims a channel instead.
    pub fn trigger_note(
        &mut self,
        track_index: usize,
        track: &Track,
        note: &Note,
        bpm: f32,
        solo_active: bool,
    ) -> Option<ChannelHandle> {
        if track.params.mute || (solo_active && !track.params.solo) {
            trace!(track = track_index, "note gated by mute/solo");
            return None;
        }
        let buffer = self.render_note(track, note, bpm)?;

        let velocity_gain = note.velocity_gain();
        let gain = track.params.volume.clamp(0.0, 1.0) * velocity_gain;
        let (left, right) = pan_split(gain, track.params.pan);
        let handle = self.backend.start(Sound::from_mono(&buffer), left, right);

        if self.voices.len() <= track_index {
            self.voices.resize_with(track_index + 1, Vec::new);
        }
        self.voices[track_index].push(Voice {
            handle,
            velocity_gain,
            gain,
        });
        Some(handle)
    }

    /// Per-frame refresh: prune finished voices, then re-apply each track's
    /// fader and pan. A track that is no longer audible has its voices
    /// stopped at once.
    pub fn tick(&mut self, song: &Song) {
        let backend = &mut self.backend;
        for (index, voices) in self.voices.iter_mut().enumerate() {
            voices.retain(|v| backend.is_busy(v.handle));
            if voices.is_empty() {
                continue;
            }
            let (level, pan) = match song.track(index) {
                Some(track) if song.is_audible(index) => {
                    (track.params.volume.clamp(0.0, 1.0), track.params.pan)
                }
                Some(track) => (0.0, track.params.pan),
                None => (0.0, 0.5),
            };
            for voice in voices.iter_mut() {
                voice.gain = level * voice.velocity_gain;
                if level <= 0.0 {
                    backend.stop(voice.handle);
                } else {
                    let (left, right) = pan_split(voice.gain, pan);
                    backend.set_volume(voice.handle, left, right);
                }
            }
        }
    }

    /// Halt every voice on every track and forget them
    pub fn stop_all(&mut self) {
        for voices in self.voices.iter_mut() {
            for voice in voices.drain(..) {
                self.backend.stop(voice.handle);
            }
        }
        self.backend.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ChannelPool;
    use crate::fx::EffectKind;
    use crate::sequencer::{DRUM_TRACK, Song};
    use crate::synth::SourceKind;

    fn manager() -> VoiceManager<ChannelPool> {
        VoiceManager::new(ChannelPool::new(16), Registry::new(44100.0))
    }

    fn note(pitch: u8, velocity: u8) -> Note {
        Note::new(0, pitch, 240, velocity)
    }

    #[test]
    fn synth_note_starts_a_voice_with_velocity_gain() {
        let song = Song::new();
        let mut vm = manager();
        let handle = vm.trigger_note(0, &song.tracks[0], &note(60, 127), 120.0, false);
        let handle = handle.expect("voice");
        assert!(vm.backend().is_busy(handle));
        let voice = vm.voices(0)[0];
        assert!((voice.velocity_gain - 1.0).abs() < 1e-6);
        assert!((voice.gain - 0.8).abs() < 1e-6);
        let (l, r) = vm.backend().volume(handle).expect("live");
        assert!((l - 0.4).abs() < 1e-6 && (r - 0.4).abs() < 1e-6);
    }

    #[test]
    fn muted_and_solo_excluded_tracks_are_gated() {
        let mut song = Song::new();
        let mut vm = manager();
        song.tracks[1].params.mute = true;
        assert!(vm.trigger_note(1, &song.tracks[1], &note(60, 100), 120.0, false).is_none());
        song.tracks[2].params.solo = true;
        let solo = song.any_solo();
        assert!(vm.trigger_note(0, &song.tracks[0], &note(60, 100), 120.0, solo).is_none());
        assert!(vm.trigger_note(2, &song.tracks[2], &note(60, 100), 120.0, solo).is_some());
        assert_eq!(vm.voice_count(), 1);
    }

    #[test]
    fn sampler_routes_by_pad_and_skips_unknown_engines() {
        let mut song = Song::new();
        let mut vm = manager();
        let drums = &mut song.tracks[DRUM_TRACK];
        drums.set_pad_engine(38, SourceKind::FmDrum);
        drums.pad_mut(40).engine = "GRANULAR".to_string();

        let drums = &song.tracks[DRUM_TRACK];
        assert!(vm.trigger_note(DRUM_TRACK, drums, &note(38, 100), 120.0, false).is_some());
        assert!(vm.trigger_note(DRUM_TRACK, drums, &note(40, 100), 120.0, false).is_none());
        assert_eq!(vm.voices(DRUM_TRACK).len(), 1);
    }

    #[test]
    fn inactive_effects_are_bypassed() {
        let mut song = Song::new();
        let mut vm = manager();
        let dry = vm.render_note(&song.tracks[0], &note(60, 100), 120.0);

        song.tracks[0].add_effect(EffectKind::Reverb);
        song.tracks[0].toggle_effect(0);
        let bypassed = vm.render_note(&song.tracks[0], &note(60, 100), 120.0);
        assert_eq!(dry, bypassed);

        song.tracks[0].toggle_effect(0);
        let wet = vm.render_note(&song.tracks[0], &note(60, 100), 120.0);
        assert_ne!(dry, wet);
        assert_eq!(dry.map(|b| b.len()), wet.map(|b| b.len()));
    }

    #[test]
    fn tick_applies_fader_moves_to_sounding_voices() {
        let mut song = Song::new();
        let mut vm = manager();
        let handle = vm
            .trigger_note(0, &song.tracks[0], &note(60, 127), 120.0, false)
            .expect("voice");
        song.tracks[0].params.volume = 0.5;
        song.tracks[0].params.pan = 0.0;
        vm.tick(&song);
        let (l, r) = vm.backend().volume(handle).expect("live");
        assert!((l - 0.5).abs() < 1e-6);
        assert_eq!(r, 0.0);
    }

    #[test]
    fn mute_stops_voices_on_next_tick() {
        let mut song = Song::new();
        let mut vm = manager();
        let handle = vm
            .trigger_note(0, &song.tracks[0], &note(60, 100), 120.0, false)
            .expect("voice");
        song.tracks[0].params.mute = true;
        vm.tick(&song);
        assert_eq!(vm.voices(0)[0].gain, 0.0);
        assert!(!vm.backend().is_busy(handle));
        vm.tick(&song);
        assert!(vm.voices(0).is_empty());
    }

    #[test]
    fn stop_all_clears_everything() {
        let song = Song::new();
        let mut vm = manager();
        for track in 0..4 {
            vm.trigger_note(track, &song.tracks[track], &note(60, 100), 120.0, false);
        }
        assert_eq!(vm.voice_count(), 4);
        vm.stop_all();
        assert_eq!(vm.voice_count(), 0);
        assert_eq!(vm.backend().busy_count(), 0);
    }
}
