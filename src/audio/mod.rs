// Audio playback module
// Decodes base64 PCM and plays it through one cpal output stream

pub mod decoder;
pub mod format;
pub mod output;

// Re-exports for convenience
pub use decoder::{decode, DecodeError};
pub use format::{AudioFormatSpec, PlaybackBuffer, DEFAULT_SAMPLE_RATE};
pub use output::{AudioOutputSession, ConfigError, PlayError};
