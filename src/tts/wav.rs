//! Minimal WAV container assembly.
//!
//! Piper emits raw headerless PCM; the service wraps it in the canonical
//! 44-byte RIFF/WAVE header for a mono, 16-bit, 22050 Hz stream. Size fields
//! are always computed from the actual payload length.

use bytes::BufMut;

/// Sample rate of Piper's PCM output.
pub const SAMPLE_RATE: u32 = 22_050;
/// Mono output.
pub const CHANNELS: u16 = 1;
/// 16-bit samples.
pub const BYTES_PER_SAMPLE: u16 = 2;
/// Fixed header length preceding the PCM payload.
pub const HEADER_LEN: usize = 44;

/// Wrap raw PCM bytes in a complete WAV file.
pub fn wrap_pcm(pcm: &[u8]) -> Vec<u8> {
    let data_size = pcm.len() as u32;
    let byte_rate = SAMPLE_RATE * u32::from(CHANNELS) * u32::from(BYTES_PER_SAMPLE);
    let block_align = CHANNELS * BYTES_PER_SAMPLE;

    let mut wav = Vec::with_capacity(HEADER_LEN + pcm.len());
    wav.put_slice(b"RIFF");
    wav.put_u32_le(36 + data_size);
    wav.put_slice(b"WAVE");
    wav.put_slice(b"fmt ");
    wav.put_u32_le(16); // fmt sub-chunk size
    wav.put_u16_le(1); // PCM format code
    wav.put_u16_le(CHANNELS);
    wav.put_u32_le(SAMPLE_RATE);
    wav.put_u32_le(byte_rate);
    wav.put_u16_le(block_align);
    wav.put_u16_le(BYTES_PER_SAMPLE * 8);
    wav.put_slice(b"data");
    wav.put_u32_le(data_size);
    wav.put_slice(pcm);
    wav
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn test_header_sizes_track_payload() {
        let pcm = vec![0u8; 1000];
        let wav = wrap_pcm(&pcm);

        assert_eq!(wav.len(), 1000 + HEADER_LEN);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32_at(&wav, 4), 1036); // payload + 36
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 40), 1000);
    }

    #[test]
    fn test_fmt_chunk_fields() {
        let wav = wrap_pcm(&[1, 2, 3, 4]);

        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32_at(&wav, 16), 16);
        assert_eq!(u16_at(&wav, 20), 1); // PCM
        assert_eq!(u16_at(&wav, 22), 1); // mono
        assert_eq!(u32_at(&wav, 24), 22_050);
        assert_eq!(u32_at(&wav, 28), 44_100); // byte rate
        assert_eq!(u16_at(&wav, 32), 2); // block align
        assert_eq!(u16_at(&wav, 34), 16); // bits per sample
        assert_eq!(&wav[HEADER_LEN..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_deterministic() {
        let pcm: Vec<u8> = (0..=255).collect();
        assert_eq!(wrap_pcm(&pcm), wrap_pcm(&pcm));
    }

    #[test]
    fn test_empty_payload() {
        let wav = wrap_pcm(&[]);
        assert_eq!(wav.len(), HEADER_LEN);
        assert_eq!(u32_at(&wav, 4), 36);
        assert_eq!(u32_at(&wav, 40), 0);
    }
}
