use blooper::audio::ChannelPool;
use blooper::config::EngineConfig;
use blooper::fx::EffectKind;
use blooper::project::{load_song, save_song, song_from_json, song_to_json};
use blooper::sequencer::{Note, Song, TrackMode, DRUM_TRACK};
use blooper::synth::{find_preset, SourceKind};
use blooper::Engine;
use pretty_assertions::assert_eq;

fn edited_song() -> Song {
    let mut song = Song::new();
    song.bpm = 133.0;
    song.length_ticks = 3840;

    let lead = &mut song.tracks[2];
    lead.name = "Lead".to_string();
    lead.source_params.set("osc_mix", 0.25);
    lead.source_params.set("osc2_interval", 7);
    lead.source_params.set("osc1_type", "/\\");
    lead.params.volume = 0.55;
    lead.params.pan = 0.2;
    lead.params.solo = true;
    lead.add_effect(EffectKind::PlateReverb);
    lead.add_effect(EffectKind::Eq);
    lead.add_effect(EffectKind::Reverb);
    lead.toggle_effect(1);
    if let Some(slot) = lead.effect_mut(0) {
        slot.params.set("decay", 0.9);
    }
    lead.add_note(Note::new(960, 67, 240, 80));
    lead.add_note(Note::new(0, 60, 480, 127));

    let drums = &mut song.tracks[DRUM_TRACK];
    drums.set_pad_engine(36, SourceKind::FmDrum);
    if let Some(preset) = find_preset(SourceKind::FmDrum, "SOLID KICK") {
        drums.pad_mut(36).params.apply(&preset.params);
    }
    drums.pad_mut(36).label = "KICK".to_string();
    drums.set_pad_engine(50, SourceKind::Wavetable);
    if let Some(preset) = find_preset(SourceKind::Wavetable, "PULSE 12.5%") {
        drums.pad_mut(50).params.apply(&preset.params);
    }
    drums.select_pad(36);
    drums.add_note(Note::new(0, 36, 120, 100));
    drums.add_note(Note::new(480, 50, 120, 100));

    let wavetable = &mut song.tracks[5];
    wavetable.set_source(SourceKind::Wavetable);
    wavetable.set_mode(TrackMode::Sampler);

    song
}

#[test]
fn song_survives_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.bloop");
    let song = edited_song();

    save_song(&song, &path).unwrap();
    let loaded = load_song(&path).unwrap();

    assert_eq!(loaded, song);
    let kinds: Vec<_> = loaded.tracks[2].effects().iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![EffectKind::PlateReverb, EffectKind::Eq, EffectKind::Reverb]);
    assert_eq!(loaded.tracks[5].last_synth_source(), "WAVETABLE_SYNTH");
}

#[test]
fn json_round_trip_is_stable() {
    let json = song_to_json(&edited_song()).unwrap();
    let again = song_to_json(&song_from_json(&json).unwrap()).unwrap();
    assert_eq!(json, again);
}

#[test]
fn malformed_file_leaves_session_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.bloop");
    std::fs::write(&path, "{\"bpm\": 140, \"tracks\": [").unwrap();

    let mut engine = Engine::new(edited_song(), ChannelPool::new(8), EngineConfig::default());
    let before = engine.song().read().clone();
    assert!(engine.load_project(&path).is_err());
    assert_eq!(*engine.song().read(), before);

    assert!(engine.load_project(&dir.path().join("missing.bloop")).is_err());
    assert_eq!(*engine.song().read(), before);
}

#[test]
fn session_load_replaces_song() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.bloop");
    save_song(&edited_song(), &path).unwrap();

    let mut engine = Engine::new(Song::new(), ChannelPool::new(8), EngineConfig::default());
    engine.load_project(&path).unwrap();
    assert_eq!(*engine.song().read(), edited_song());

    let copy = dir.path().join("copy.bloop");
    engine.save_project(&copy).unwrap();
    assert_eq!(load_song(&copy).unwrap(), edited_song());
}
