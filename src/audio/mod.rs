pub mod channel;
#[cfg(feature = "live")]
pub mod output;
pub mod voice;

pub use channel::{ChannelHandle, ChannelPool, PlaybackBackend, SharedPool, Sound};
#[cfg(feature = "live")]
pub use output::LiveOutput;
pub use voice::{pan_split, Voice, VoiceManager};

/// Soft clipping for the summed output
pub fn soft_clip(x: f32) -> f32 {
    if x > 1.0 {
        1.0 - (-x + 1.0).exp() * 0.5
    } else if x < -1.0 {
        -1.0 + (x + 1.0).exp() * 0.5
    } else {
        x
    }
}
