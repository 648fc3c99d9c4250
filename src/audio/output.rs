// Audio output using cpal
// One reconfigurable output stream on the default device, one clip in flight

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

use super::format::{AudioFormatSpec, PlaybackBuffer};

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform audio stack rejected the requested rate/channel combination
    #[error("audio format not supported: {sample_rate_hz} Hz, {channels} channel(s)")]
    FormatInitializationFailed { sample_rate_hz: u32, channels: u16 },
    /// The output stream could not be created or started
    #[error("failed to start output stream: {0}")]
    StreamStartFailed(String),
}

#[derive(Debug, Error)]
pub enum PlayError {
    /// No configuration is active, or the buffer was built for a different one
    #[error("output session is not configured for this buffer's format")]
    NotConfigured,
}

/// Clip owned by the render callback. The callback only advances `pos`; an
/// exhausted clip stays in place and is dropped on the control thread when
/// the next clip replaces it.
struct Playhead {
    samples: Vec<f32>,
    pos: usize,
}

impl Playhead {
    fn idle() -> Self {
        Self {
            samples: Vec::new(),
            pos: 0,
        }
    }

    fn start(samples: Vec<f32>) -> Self {
        Self { samples, pos: 0 }
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        match self.samples.get(self.pos) {
            Some(&value) => {
                self.pos += 1;
                value
            }
            None => 0.0,
        }
    }
}

/// Owns one output stream bound to the system default device.
///
/// `configure` fully tears down and rebuilds the stream; `play` schedules a
/// single buffer, replacing whatever is currently playing. The caller must
/// serialize access; the session is not internally synchronized.
pub struct AudioOutputSession {
    stream: Option<Stream>,
    format: Option<AudioFormatSpec>,
    slot: Arc<Mutex<Playhead>>,
}

impl AudioOutputSession {
    /// Create an unconfigured session. The device is not touched until
    /// `configure` is called.
    pub fn new() -> Self {
        Self {
            stream: None,
            format: None,
            slot: Arc::new(Mutex::new(Playhead::idle())),
        }
    }

    /// The active configuration, if the last `configure` succeeded
    pub fn format(&self) -> Option<AudioFormatSpec> {
        self.format
    }

    /// (Re)build the output stream for the given sample rate and channel count.
    ///
    /// Any previously scheduled clip is discarded, whether or not the call
    /// succeeds. On failure the session is left unconfigured, never with a
    /// half-built stream.
    pub fn configure(&mut self, sample_rate_hz: u32, channels: u16) -> Result<(), ConfigError> {
        // Tear down first so every failure path below ends unconfigured.
        self.stream = None;
        self.format = None;

        let format = AudioFormatSpec::new(sample_rate_hz, channels);
        if !format.is_valid() {
            return Err(ConfigError::FormatInitializationFailed {
                sample_rate_hz,
                channels,
            });
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| ConfigError::StreamStartFailed("no output device available".to_string()))?;

        let supported = device
            .supported_output_configs()
            .map_err(|e| ConfigError::StreamStartFailed(e.to_string()))?;

        // Pick the device's sample format for this rate/channel combination
        let requested = SampleRate(sample_rate_hz);
        let sample_format = supported
            .filter(|range| range.channels() == channels)
            .find_map(|range| range.try_with_sample_rate(requested))
            .map(|config| config.sample_format())
            .ok_or(ConfigError::FormatInitializationFailed {
                sample_rate_hz,
                channels,
            })?;

        let config = StreamConfig {
            channels,
            sample_rate: requested,
            buffer_size: cpal::BufferSize::Default,
        };

        // A fresh slot per stream: clips scheduled on the old stream die with it
        let slot = Arc::new(Mutex::new(Playhead::idle()));

        let built = match sample_format {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, slot.clone()),
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, slot.clone()),
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, slot.clone()),
            other => {
                log::warn!("unsupported device sample format: {:?}", other);
                return Err(ConfigError::FormatInitializationFailed {
                    sample_rate_hz,
                    channels,
                });
            }
        };

        let stream = built.map_err(|e| match e {
            cpal::BuildStreamError::StreamConfigNotSupported => {
                ConfigError::FormatInitializationFailed {
                    sample_rate_hz,
                    channels,
                }
            }
            other => ConfigError::StreamStartFailed(other.to_string()),
        })?;

        stream
            .play()
            .map_err(|e| ConfigError::StreamStartFailed(e.to_string()))?;

        log::info!(
            "output stream configured: {} Hz, {} channel(s), {:?} samples",
            sample_rate_hz,
            channels,
            sample_format
        );

        self.slot = slot;
        self.stream = Some(stream);
        self.format = Some(format);
        Ok(())
    }

    /// Schedule a buffer for immediate playback, replacing any clip currently
    /// playing. The stream keeps running between clips (rendering silence),
    /// so scheduling is the only work done here.
    pub fn play(&mut self, buffer: PlaybackBuffer) -> Result<(), PlayError> {
        let format = self.format.ok_or(PlayError::NotConfigured)?;
        if buffer.format != format {
            return Err(PlayError::NotConfigured);
        }

        log::debug!("scheduling {} frame(s) for playback", buffer.frame_count);
        // The old clip (if any) is dropped here, on the control thread
        *self.slot.lock() = Playhead::start(buffer.samples);
        Ok(())
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &cpal::Device,
        config: &StreamConfig,
        slot: Arc<Mutex<Playhead>>,
    ) -> Result<Stream, cpal::BuildStreamError> {
        device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // Never block the render thread: on contention, emit silence
                // and pick the clip up again next callback
                let mut playhead = match slot.try_lock() {
                    Some(guard) => guard,
                    None => {
                        for sample in data.iter_mut() {
                            *sample = T::from_sample(0.0);
                        }
                        return;
                    }
                };

                for sample in data.iter_mut() {
                    *sample = T::from_sample(playhead.next_sample());
                }
            },
            move |err| {
                log::warn!("audio output error: {}", err);
            },
            None,
        )
    }
}

impl Default for AudioOutputSession {
    fn default() -> Self {
        Self::new()
    }
}
