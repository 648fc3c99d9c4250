// Audio format and playback buffer types
// Shared between the decoder and the output session

use std::time::Duration;

/// Sample rate used when the caller's sample-rate text cannot be parsed
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Output format requested by the caller: sample rate plus channel count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormatSpec {
    pub sample_rate_hz: u32,
    pub channels: u16,
}

impl AudioFormatSpec {
    pub fn new(sample_rate_hz: u32, channels: u16) -> Self {
        Self {
            sample_rate_hz,
            channels,
        }
    }

    /// A spec is valid when the rate is positive and the channel count is 1 or 2
    pub fn is_valid(&self) -> bool {
        self.sample_rate_hz > 0 && matches!(self.channels, 1 | 2)
    }

    /// Samples per frame (= channel count)
    #[inline]
    pub fn samples_per_frame(&self) -> usize {
        self.channels as usize
    }
}

/// One decoded clip, ready to hand to the output session
///
/// `samples` is interleaved and holds `frame_count * channels` values,
/// each normalized to roughly [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackBuffer {
    pub frame_count: usize,
    pub samples: Vec<f32>,
    pub format: AudioFormatSpec,
}

impl PlaybackBuffer {
    /// Wall-clock length of the clip at its own sample rate
    pub fn duration(&self) -> Duration {
        if self.format.sample_rate_hz == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count as f64 / self.format.sample_rate_hz as f64)
    }
}
