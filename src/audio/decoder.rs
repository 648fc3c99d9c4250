// PCM decoder
// Decodes base64 text to normalized f32 samples

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use thiserror::Error;

use super::format::{AudioFormatSpec, PlaybackBuffer};

/// Full scale for 16-bit samples. Division is by i16::MAX, so -32768 maps
/// slightly past -1.0 and is passed through unclamped.
const I16_FULL_SCALE: f32 = i16::MAX as f32;

// Accepts input with or without trailing '=' padding; stray low bits in the
// final symbol are dropped rather than rejected.
const PERMISSIVE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input held no recoverable base64 content
    #[error("invalid base64 input: {0}")]
    InvalidBase64(String),
    /// The playback buffer could not be built
    #[error("failed to build playback buffer ({frames} frames, {channels} channel(s))")]
    BufferAllocationFailed { frames: usize, channels: u16 },
}

/// Decode base64-encoded 16-bit signed little-endian PCM into a playback buffer.
///
/// Characters outside the base64 alphabet (whitespace, line breaks, stray
/// punctuation) are skipped, not rejected. The decoded bytes are read as
/// little-endian i16 pairs; a trailing odd byte carries no sample and is
/// dropped. The mono sample stream is written into every channel of the
/// interleaved output.
pub fn decode(text: &str, format: AudioFormatSpec) -> Result<PlaybackBuffer, DecodeError> {
    let cleaned: Vec<u8> = text.bytes().filter(|b| is_base64_byte(*b)).collect();
    if cleaned.is_empty() {
        return Err(DecodeError::InvalidBase64(
            "no base64 characters in input".to_string(),
        ));
    }

    let bytes = PERMISSIVE
        .decode(&cleaned)
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))?;

    let frame_count = bytes.len() / 2;
    let channels = format.samples_per_frame();

    // Fewer than 2 raw bytes means an empty clip; there is nothing to schedule.
    if frame_count == 0 {
        return Err(DecodeError::BufferAllocationFailed {
            frames: 0,
            channels: format.channels,
        });
    }

    let mut samples = Vec::new();
    samples
        .try_reserve_exact(frame_count * channels)
        .map_err(|_| DecodeError::BufferAllocationFailed {
            frames: frame_count,
            channels: format.channels,
        })?;

    for pair in bytes.chunks_exact(2) {
        let value = i16::from_le_bytes([pair[0], pair[1]]) as f32 / I16_FULL_SCALE;
        for _ in 0..channels {
            samples.push(value);
        }
    }

    Ok(PlaybackBuffer {
        frame_count,
        samples,
        format,
    })
}

fn is_base64_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'='
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono() -> AudioFormatSpec {
        AudioFormatSpec::new(44_100, 1)
    }

    #[test]
    fn test_example_clip() {
        // bytes [0x00, 0x00, 0xFF, 0x7F] = little-endian values 0, 32767
        let buffer = decode("AAD/fw==", mono()).unwrap();
        assert_eq!(buffer.frame_count, 2);
        assert_eq!(buffer.samples, vec![0.0, 1.0]);
        assert_eq!(buffer.format, mono());
    }

    #[test]
    fn test_trailing_odd_byte_dropped() {
        // "AAAA" decodes to 3 bytes; the third has no partner
        let buffer = decode("AAAA", mono()).unwrap();
        assert_eq!(buffer.frame_count, 1);
        assert_eq!(buffer.samples, vec![0.0]);
    }

    #[test]
    fn test_positive_full_scale() {
        // [0xFF, 0x7F] = 32767
        let buffer = decode("/38=", mono()).unwrap();
        assert_eq!(buffer.samples, vec![1.0]);
    }

    #[test]
    fn test_negative_full_scale_exceeds_minus_one() {
        // [0x00, 0x80] = -32768, normalized by 32767, not 32768
        let buffer = decode("AIA=", mono()).unwrap();
        assert_eq!(buffer.samples[0], -32768.0 / 32767.0);
        assert!(buffer.samples[0] < -1.0);
    }

    #[test]
    fn test_normalization_divisor_is_32767() {
        // [0x00, 0x40] = 16384; 16384/32767 is not exactly 0.5
        let buffer = decode("AEA=", mono()).unwrap();
        assert_eq!(buffer.samples[0], 16384.0 / 32767.0);
        assert_ne!(buffer.samples[0], 0.5);
    }

    #[test]
    fn test_unknown_characters_skipped() {
        let buffer = decode("  AAD/\n fw== !!", mono()).unwrap();
        assert_eq!(buffer.frame_count, 2);
        assert_eq!(buffer.samples, vec![0.0, 1.0]);
    }

    #[test]
    fn test_missing_padding_accepted() {
        let buffer = decode("AAD/fw", mono()).unwrap();
        assert_eq!(buffer.frame_count, 2);
        assert_eq!(buffer.samples, vec![0.0, 1.0]);
    }

    #[test]
    fn test_no_decodable_content() {
        assert!(matches!(
            decode("", mono()),
            Err(DecodeError::InvalidBase64(_))
        ));
        assert!(matches!(
            decode("!!! ??? ...", mono()),
            Err(DecodeError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_single_byte_yields_no_frames() {
        // "AA==" decodes to one raw byte, which is half a sample
        assert!(matches!(
            decode("AA==", mono()),
            Err(DecodeError::BufferAllocationFailed { frames: 0, .. })
        ));
    }

    #[test]
    fn test_stereo_duplicates_mono_stream() {
        let stereo = AudioFormatSpec::new(44_100, 2);
        let buffer = decode("AAD/fw==", stereo).unwrap();
        assert_eq!(buffer.frame_count, 2);
        assert_eq!(buffer.samples, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let a = decode("AAD/fw==", mono()).unwrap();
        let b = decode("AAD/fw==", mono()).unwrap();
        assert_eq!(a.samples, b.samples);
        assert_eq!(a, b);
    }
}
