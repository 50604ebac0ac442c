use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::audio::{soft_clip, ChannelPool};
use crate::config::{EngineConfig, TPQN};
use crate::engine::Engine;
use crate::sequencer::Song;

/// Result of an export operation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportResult {
    pub duration_secs: f32,
    /// Stereo frames written
    pub frames: usize,
}

/// Bounce `loops` passes of the song plus a decay tail.
///
/// Runs the same engine the live session uses, frame by frame, against a
/// private channel pool. The clock is halted at the end of the last loop so
/// notes still sounding ring into the tail. Returns interleaved stereo,
/// soft-clipped.
pub fn render_song(song: &Song, loops: u32, tail_seconds: f32, config: &EngineConfig) -> Vec<f32> {
    let sample_rate = config.sample_rate as f64;
    let ticks_per_second = song.bpm as f64 * TPQN as f64 / 60.0;
    let content_seconds = if ticks_per_second > 0.0 {
        loops as f64 * song.length_ticks as f64 / ticks_per_second
    } else {
        0.0
    };
    // floor, so the clock never crosses into one more loop
    let content = (content_seconds * sample_rate).floor() as usize;
    let tail = (tail_seconds.max(0.0) as f64 * sample_rate).round() as usize;
    let frame = config.frame_samples().max(1);

    info!(loops, content, tail, "rendering song");

    let mut engine = Engine::new(song.clone(), ChannelPool::new(config.channels), config.clone());
    let mut output = Vec::with_capacity((content + tail) * 2);
    engine.play();

    let mut rendered = 0;
    while rendered < content {
        let n = frame.min(content - rendered);
        output.extend(engine.render_samples(n));
        rendered += n;
    }
    engine.pause();
    debug!(voices = engine.voices().voice_count(), "content done, rendering tail");

    while rendered < content + tail {
        let n = frame.min(content + tail - rendered);
        output.extend(engine.render_samples(n));
        rendered += n;
    }

    for sample in output.iter_mut() {
        *sample = soft_clip(*sample);
    }
    output
}

/// Render and export audio as a 16-bit stereo WAV file
pub fn export_wav(
    song: &Song,
    loops: u32,
    tail_seconds: f32,
    config: &EngineConfig,
    path: &Path,
) -> Result<ExportResult> {
    let samples = render_song(song, loops, tail_seconds, config);
    write_wav(&samples, config.sample_rate, path)?;

    let frames = samples.len() / 2;
    let result = ExportResult {
        duration_secs: frames as f32 / config.sample_rate,
        frames,
    };
    info!(path = %path.display(), seconds = result.duration_secs, "exported WAV");
    Ok(result)
}

/// Write interleaved stereo floats as 16-bit PCM
pub fn write_wav(samples: &[f32], sample_rate: f32, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: sample_rate as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    for sample in samples {
        let s = (*sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(s)?;
    }

    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file: {}", path.display()))?;
    Ok(())
}
