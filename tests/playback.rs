use blooper::audio::{ChannelPool, PlaybackBackend, VoiceManager};
use blooper::config::EngineConfig;
use blooper::fx::{create_effect, EffectKind};
use blooper::project::renderer::export_wav;
use blooper::registry::Registry;
use blooper::sequencer::{Note, Song, DRUM_TRACK};
use blooper::synth::{pitch_multiplier, DualOsc, NoiseDrum, ParamSet, SourceProcessor};

fn manager(channels: usize) -> VoiceManager<ChannelPool> {
    VoiceManager::new(ChannelPool::new(channels), Registry::new(44100.0))
}

#[test]
fn dual_osc_note_has_attack_plus_length_samples() {
    let mut osc = DualOsc::new(44100.0);
    let params = ParamSet::new()
        .with("root_note", 60)
        .with("transpose", 0)
        .with("attack", 0.01)
        .with("length", 0.5)
        .with("gain", 1.0);
    let buf = osc.generate(&params, &Note::new(0, 60, 480, 100), 120.0);
    assert_eq!(buf.len(), 22491);
    let peak = buf.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak > 0.05);
    assert!(peak <= 1.0);
}

#[test]
fn octave_steps_double_frequency() {
    for root in [0i64, 48, 60, 69] {
        let base = pitch_multiplier(root as u8, root, 0);
        assert!((base - 1.0).abs() < 1e-12);
        assert!((pitch_multiplier(root as u8 + 12, root, 0) - 2.0).abs() < 1e-12);
        assert!((pitch_multiplier(root as u8, root, -12) - 0.5).abs() < 1e-12);
    }
}

#[test]
fn neutral_eq_and_dry_plate_pass_input() {
    let input: Vec<f32> = (0..4410).map(|i| ((i as f32) * 0.031).sin() * 0.6).collect();
    let eq = create_effect(EffectKind::Eq, 44100.0);
    assert_eq!(eq.process(&input, &EffectKind::Eq.default_params()), input);

    let plate = create_effect(EffectKind::PlateReverb, 44100.0);
    let dry = ParamSet::new().with("mix", 0.0);
    assert_eq!(plate.process(&input, &dry), input);
}

#[test]
fn repeated_noise_hits_are_identical() {
    let mut drum = NoiseDrum::new(44100.0);
    let params = ParamSet::new().with("type", "SNARE").with("length", 0.2).with("color", "PINK");
    let note = Note::new(0, 38, 120, 100);
    let a = drum.generate(&params, &note, 120.0);
    let b = drum.generate(&params, &note, 120.0);
    assert_eq!(a, b);

    let longer = params.clone().with("length", 0.25);
    let c = drum.generate(&longer, &note, 120.0);
    assert_ne!(a.len(), c.len());
}

#[test]
fn solo_exclusion_stops_sounding_voices() {
    let mut song = Song::new();
    let mut vm = manager(16);
    let note = Note::new(0, 60, 480, 100);
    let a = vm.trigger_note(0, &song.tracks[0], &note, 120.0, false).unwrap();
    let b = vm.trigger_note(1, &song.tracks[1], &note, 120.0, false).unwrap();

    song.tracks[1].params.solo = true;
    vm.tick(&song);

    assert!(vm.voices(0).iter().all(|v| v.gain == 0.0));
    assert!(!vm.backend().is_busy(a));
    assert!(vm.backend().is_busy(b));
    assert!(vm.voices(1)[0].gain > 0.0);
}

#[test]
fn exhausted_pool_reclaims_instead_of_dropping() {
    let song = Song::new();
    let mut vm = manager(4);
    let drums = &song.tracks[DRUM_TRACK];
    let handles: Vec<_> = (0..5)
        .map(|i| vm.trigger_note(DRUM_TRACK, drums, &Note::new(0, 36 + i, 120, 100), 120.0, false))
        .collect();
    assert!(handles.iter().all(Option::is_some));
    assert_eq!(vm.backend().busy_count(), 4);
    vm.tick(&song);
    assert_eq!(vm.voices(DRUM_TRACK).len(), 4);
}

#[test]
fn exported_wav_matches_render() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bounce.wav");
    let mut song = Song::new();
    song.tracks[0].add_note(Note::new(0, 60, 480, 120));
    song.tracks[DRUM_TRACK].add_note(Note::new(960, 36, 120, 120));

    let result = export_wav(&song, 1, 0.5, &EngineConfig::default(), &path).unwrap();
    assert_eq!(result.frames, 2 * 44100 + 22050);

    let reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(reader.duration() as usize, result.frames);
    let samples: Vec<i16> = reader.into_samples::<i16>().map(Result::unwrap).collect();
    assert!(samples.iter().any(|s| s.abs() > 100));
}
