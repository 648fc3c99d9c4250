// Pcmplay - one-shot base64 PCM playback
// Module declarations
pub mod audio;

pub use audio::{
    decode, AudioFormatSpec, AudioOutputSession, ConfigError, DecodeError, PlayError,
    PlaybackBuffer, DEFAULT_SAMPLE_RATE,
};
