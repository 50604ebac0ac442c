use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

/// A rendered note in playback format: interleaved-ready 16-bit stereo frames
#[derive(Clone, Debug, PartialEq)]
pub struct Sound {
    frames: Arc<[[i16; 2]]>,
}

impl Sound {
    /// Clip a float buffer to [-1, 1] and duplicate it to both sides
    pub fn from_mono(buffer: &[f32]) -> Self {
        let frames: Vec<[i16; 2]> = buffer
            .iter()
            .map(|s| {
                let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
                [v, v]
            })
            .collect();
        Self { frames: frames.into() }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[[i16; 2]] {
        &self.frames
    }
}

/// Refers to one playback on one channel.
///
/// The generation changes whenever the channel is restarted, so a handle
/// held by a voice goes stale once its channel is reclaimed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    pub index: usize,
    pub generation: u64,
}

/// The playback mixer a voice manager drives
pub trait PlaybackBackend {
    /// Start a sound on a free channel, reclaiming the oldest one if all are busy
    fn start(&mut self, sound: Sound, left: f32, right: f32) -> ChannelHandle;

    fn set_volume(&mut self, handle: ChannelHandle, left: f32, right: f32);

    fn stop(&mut self, handle: ChannelHandle);

    /// Still playing, and still the playback this handle refers to
    fn is_busy(&self, handle: ChannelHandle) -> bool;

    fn stop_all(&mut self);
}

#[derive(Default)]
struct Channel {
    sound: Option<Sound>,
    cursor: usize,
    left: f32,
    right: f32,
    generation: u64,
    started_at: u64,
}

impl Channel {
    fn busy(&self) -> bool {
        self.sound.is_some()
    }
}

/// Fixed-size software mixer with per-channel stereo volume
pub struct ChannelPool {
    channels: Vec<Channel>,
    starts: u64,
}

impl ChannelPool {
    pub fn new(channels: usize) -> Self {
        Self {
            channels: (0..channels.max(1)).map(|_| Channel::default()).collect(),
            starts: 0,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn busy_count(&self) -> usize {
        self.channels.iter().filter(|c| c.busy()).count()
    }

    /// Current left/right volume of a live handle
    pub fn volume(&self, handle: ChannelHandle) -> Option<(f32, f32)> {
        self.live(handle).map(|c| (c.left, c.right))
    }

    fn live(&self, handle: ChannelHandle) -> Option<&Channel> {
        self.channels
            .get(handle.index)
            .filter(|c| c.generation == handle.generation && c.busy())
    }

    fn live_mut(&mut self, handle: ChannelHandle) -> Option<&mut Channel> {
        self.channels
            .get_mut(handle.index)
            .filter(|c| c.generation == handle.generation && c.busy())
    }

    fn pick_channel(&self) -> usize {
        if let Some(free) = self.channels.iter().position(|c| !c.busy()) {
            return free;
        }
        let oldest = self
            .channels
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| c.started_at)
            .map(|(i, _)| i)
            .unwrap_or(0);
        warn!(channel = oldest, "all channels busy, reclaiming the oldest");
        oldest
    }

    /// Mix the next `frames` stereo frames into `out` (interleaved L/R)
    pub fn mix_into(&mut self, out: &mut [f32]) {
        for channel in self.channels.iter_mut() {
            let Some(sound) = &channel.sound else {
                continue;
            };
            let source = &sound.frames()[channel.cursor..];
            let mut used = 0;
            for (frame, src) in out.chunks_exact_mut(2).zip(source) {
                frame[0] += src[0] as f32 / 32768.0 * channel.left;
                frame[1] += src[1] as f32 / 32768.0 * channel.right;
                used += 1;
            }
            channel.cursor += used;
            if channel.cursor >= sound.len() {
                channel.sound = None;
            }
        }
    }

    /// Render `frames` stereo frames of the current mix
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * 2];
        self.mix_into(&mut out);
        out
    }
}

impl PlaybackBackend for ChannelPool {
    fn start(&mut self, sound: Sound, left: f32, right: f32) -> ChannelHandle {
        let index = self.pick_channel();
        self.starts += 1;
        let started_at = self.starts;
        let channel = &mut self.channels[index];
        channel.generation += 1;
        channel.started_at = started_at;
        channel.cursor = 0;
        channel.left = left.clamp(0.0, 1.0);
        channel.right = right.clamp(0.0, 1.0);
        channel.sound = (!sound.is_empty()).then_some(sound);
        ChannelHandle {
            index,
            generation: channel.generation,
        }
    }

    fn set_volume(&mut self, handle: ChannelHandle, left: f32, right: f32) {
        if let Some(channel) = self.live_mut(handle) {
            channel.left = left.clamp(0.0, 1.0);
            channel.right = right.clamp(0.0, 1.0);
        }
    }

    fn stop(&mut self, handle: ChannelHandle) {
        if let Some(channel) = self.live_mut(handle) {
            channel.sound = None;
        }
    }

    fn is_busy(&self, handle: ChannelHandle) -> bool {
        self.live(handle).is_some()
    }

    fn stop_all(&mut self) {
        for channel in self.channels.iter_mut() {
            channel.sound = None;
        }
    }
}

/// A pool shared with an output callback
pub type SharedPool = Arc<Mutex<ChannelPool>>;

impl PlaybackBackend for SharedPool {
    fn start(&mut self, sound: Sound, left: f32, right: f32) -> ChannelHandle {
        self.lock().start(sound, left, right)
    }

    fn set_volume(&mut self, handle: ChannelHandle, left: f32, right: f32) {
        self.lock().set_volume(handle, left, right)
    }

    fn stop(&mut self, handle: ChannelHandle) {
        self.lock().stop(handle)
    }

    fn is_busy(&self, handle: ChannelHandle) -> bool {
        self.lock().is_busy(handle)
    }

    fn stop_all(&mut self) {
        self.lock().stop_all()
    }
}
