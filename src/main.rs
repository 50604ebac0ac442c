use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use blooper::config::EngineConfig;
use blooper::fx::EffectKind;
use blooper::project::{self, renderer};
use blooper::sequencer::{Note, Song, TrackMode, DRUM_TRACK};
use blooper::synth::{find_preset, SourceKind};

/// Blooper - MIDI sequencer with built-in synth and drum engines
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List every source and effect identifier
    Catalog {
        /// Also list each source's parameters and presets
        #[arg(long)]
        verbose: bool,
    },
    /// Write a small demo project
    Demo {
        #[arg(short, long, default_value = "demo.bloop")]
        out: PathBuf,
    },
    /// Bounce a project to a 16-bit stereo WAV file
    Render {
        project: PathBuf,
        #[arg(short, long, default_value = "out.wav")]
        out: PathBuf,
        /// Passes through the loop
        #[arg(long, default_value_t = 1)]
        loops: u32,
        /// Seconds rendered after the last loop
        #[arg(long, default_value_t = 1.0)]
        tail: f32,
    },
    /// Play a project through the default output device
    #[cfg(feature = "live")]
    Play {
        project: PathBuf,
        #[arg(long, default_value_t = 1)]
        loops: u32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let args = Args::parse();
    match args.command {
        Cmd::Catalog { verbose } => print_catalog(verbose),
        Cmd::Demo { out } => {
            project::save_song(&demo_song(), &out)?;
            println!("Wrote {}", out.display());
        }
        Cmd::Render {
            project,
            out,
            loops,
            tail,
        } => {
            let song = project::load_song(&project)?;
            let result = renderer::export_wav(&song, loops, tail, &EngineConfig::default(), &out)
                .context("Render failed")?;
            println!(
                "Rendered {} ({:.2}s, {} frames)",
                out.display(),
                result.duration_secs,
                result.frames
            );
        }
        #[cfg(feature = "live")]
        Cmd::Play { project, loops } => play(&project, loops)?,
    }
    Ok(())
}

fn print_catalog(verbose: bool) {
    for entry in blooper::catalog() {
        let kind = if entry.effect { "effect" } else { "source" };
        println!("{:<16} {:<20} {}", entry.id, entry.name, kind);
        if !verbose || entry.effect {
            continue;
        }
        let Some(source) = SourceKind::from_id(entry.id) else {
            continue;
        };
        for p in source.param_descriptors() {
            println!("    {:<14} {:<12} {} - {} (default {})", p.key, p.name, p.min, p.max, p.default);
        }
        let names: Vec<_> = blooper::synth::presets(source).iter().map(|p| p.name).collect();
        if !names.is_empty() {
            println!("    presets: {}", names.join(", "));
        }
    }
}

/// Bass line, a lead with reverb and a sampler beat
fn demo_song() -> Song {
    let mut song = Song::new();

    let bass = &mut song.tracks[0];
    bass.name = "Bass".to_string();
    bass.source_params.set("osc1_type", "|_|");
    bass.source_params.set("filter_cutoff", 1200);
    bass.source_params.set("length", 0.2);
    for (i, pitch) in [36u8, 36, 43, 41].iter().enumerate() {
        bass.add_note(Note::new(i as u32 * 480, *pitch, 240, 110));
    }

    let lead = &mut song.tracks[1];
    lead.name = "Lead".to_string();
    lead.set_source(SourceKind::Wavetable);
    lead.source_params = Default::default();
    lead.params.pan = 0.7;
    lead.add_effect(EffectKind::PlateReverb);
    for (i, pitch) in [72u8, 76, 79, 84].iter().enumerate() {
        lead.add_note(Note::new(i as u32 * 480 + 240, *pitch, 120, 90));
    }

    let drums = &mut song.tracks[DRUM_TRACK];
    drums.set_mode(TrackMode::Sampler);
    drums.set_pad_engine(36, SourceKind::FmDrum);
    if let Some(kick) = find_preset(SourceKind::FmDrum, "SOLID KICK") {
        drums.pad_mut(36).params.apply(&kick.params);
    }
    if let Some(snare) = find_preset(SourceKind::NoiseDrum, "LIGHT SNARE") {
        drums.pad_mut(38).params.apply(&snare.params);
    }
    drums.set_pad_engine(42, SourceKind::SquareCymbal);
    for beat in 0..4u32 {
        drums.add_note(Note::new(beat * 480, if beat % 2 == 0 { 36 } else { 38 }, 120, 120));
        drums.add_note(Note::new(beat * 480 + 240, 42, 60, 80));
    }

    song
}

#[cfg(feature = "live")]
fn play(path: &std::path::Path, loops: u32) -> Result<()> {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use blooper::audio::{ChannelPool, LiveOutput};
    use blooper::Engine;
    use parking_lot::Mutex;

    let song = project::load_song(path)?;
    let config = EngineConfig::default();
    let seconds = loops as f64 * song.length_ticks as f64 * 60.0
        / (song.bpm as f64 * blooper::config::TPQN as f64);

    let pool = Arc::new(Mutex::new(ChannelPool::new(config.channels)));
    let _output = LiveOutput::open(pool.clone(), config.sample_rate)?;
    let mut engine = Engine::new(song, pool, config);
    engine.play();

    let started = Instant::now();
    let mut last = started;
    while started.elapsed().as_secs_f64() < seconds {
        std::thread::sleep(Duration::from_secs_f64(engine.config().frame_ms() / 1000.0));
        let now = Instant::now();
        engine.frame((now - last).as_secs_f64() * 1000.0);
        last = now;
    }
    engine.pause();
    // let the last notes ring
    std::thread::sleep(Duration::from_secs(1));
    engine.stop();
    Ok(())
}
