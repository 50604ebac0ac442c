use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use tracing::{error, info, warn};

use super::channel::SharedPool;
use super::soft_clip;

/// Live output through the default device, pulling frames from a shared pool
pub struct LiveOutput {
    _stream: Stream,
    pool: SharedPool,
}

impl LiveOutput {
    /// Open the default output device at the engine sample rate
    pub fn open(pool: SharedPool, sample_rate: f32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("No output device available")?;

        let default = device
            .default_output_config()
            .context("Failed to query output config")?;
        if default.sample_rate().0 != sample_rate as u32 {
            warn!(
                device_rate = default.sample_rate().0,
                sample_rate, "device default rate differs, requesting engine rate"
            );
        }
        let config = StreamConfig {
            channels: default.channels(),
            sample_rate: cpal::SampleRate(sample_rate as u32),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = match default.sample_format() {
            SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, pool.clone())?,
            SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, pool.clone())?,
            SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, pool.clone())?,
            format => anyhow::bail!("Unsupported sample format: {:?}", format),
        };

        stream.play().context("Failed to start output stream")?;
        info!(channels = config.channels, sample_rate, "live output started");

        Ok(Self {
            _stream: stream,
            pool,
        })
    }

    pub fn pool(&self) -> &SharedPool {
        &self.pool
    }

    fn build_stream<T>(device: &Device, config: &StreamConfig, pool: SharedPool) -> Result<Stream>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = config.channels as usize;
        let mut scratch: Vec<f32> = Vec::new();

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels.max(1);
                scratch.clear();
                scratch.resize(frames * 2, 0.0);
                pool.lock().mix_into(&mut scratch);

                for (frame, stereo) in data.chunks_mut(channels).zip(scratch.chunks_exact(2)) {
                    let left = soft_clip(stereo[0]);
                    let right = soft_clip(stereo[1]);
                    for (ch, sample) in frame.iter_mut().enumerate() {
                        let value = match ch {
                            0 => left,
                            1 => right,
                            _ => (left + right) * 0.5,
                        };
                        *sample = T::from_sample(value);
                    }
                }
            },
            |err| {
                error!(%err, "audio stream error");
            },
            None,
        )?;

        Ok(stream)
    }
}
