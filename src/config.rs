use serde::{Deserialize, Serialize};

/// Fixed output sample rate (Hz)
pub const SAMPLE_RATE: f32 = 44100.0;
/// Ticks per quarter note
pub const TPQN: u32 = 480;
/// Tracks owned by every song
pub const NUM_TRACKS: usize = 16;
/// Maximum entries in a track's effects chain
pub const MAX_EFFECTS: usize = 8;
/// MIDI pitch range (pads in sampler mode)
pub const MIDI_RANGE: usize = 128;
/// Length of the silent buffer returned for non-positive durations
pub const SILENT_BUFFER_LEN: usize = 512;
/// Software playback channels (polyphony)
pub const DEFAULT_CHANNELS: usize = 64;
/// Tempo limits accepted from commands
pub const MIN_BPM: f32 = 20.0;
pub const MAX_BPM: f32 = 300.0;
/// Scheduling frames per second
pub const FRAME_RATE: u32 = 60;

/// Runtime engine settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub sample_rate: f32,
    pub channels: usize,
    pub frame_rate: u32,
}

impl EngineConfig {
    /// Samples rendered per scheduling frame
    pub fn frame_samples(&self) -> usize {
        (self.sample_rate / self.frame_rate.max(1) as f32).round() as usize
    }

    /// Milliseconds covered by one scheduling frame
    pub fn frame_ms(&self) -> f64 {
        self.frame_samples() as f64 * 1000.0 / self.sample_rate as f64
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            frame_rate: FRAME_RATE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_frame_is_735_samples() {
        let config = EngineConfig::default();
        assert_eq!(config.frame_samples(), 735);
        assert!((config.frame_ms() - 16.666).abs() < 0.01);
    }
}
