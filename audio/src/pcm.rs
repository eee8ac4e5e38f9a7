//! PCM16 format helpers.
//!
//! Ingestion accepts raw mono PCM: signed 16-bit little-endian samples at a
//! fixed sample rate. Everything downstream works on `f32` samples in
//! `[-1.0, 1.0)`.

use std::time::Duration;

/// Describes a mono PCM16 stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl Format {
    /// 16kHz mono, the reference telephony rate.
    pub const MONO_16K: Format = Format::mono(16000);
    /// 44.1kHz mono.
    pub const MONO_44K: Format = Format::mono(44100);

    pub const fn mono(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Bytes per second of PCM16 mono audio.
    pub fn bytes_rate(&self) -> usize {
        self.sample_rate as usize * 2
    }

    /// Number of whole samples contained in `bytes` bytes.
    pub fn samples(&self, bytes: usize) -> usize {
        bytes / 2
    }

    /// Number of samples covering `secs` seconds, rounded to the nearest sample.
    pub fn samples_in(&self, secs: f64) -> usize {
        if secs <= 0.0 {
            return 0;
        }
        (secs * self.sample_rate as f64).round() as usize
    }

    /// Bytes needed to hold `duration` of audio.
    pub fn bytes_in_duration(&self, duration: Duration) -> usize {
        let samples = duration.as_micros() as u64 * self.sample_rate as u64 / 1_000_000;
        samples as usize * 2
    }

    /// Duration in seconds of `samples` samples.
    pub fn secs(&self, samples: u64) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        samples as f64 / self.sample_rate as f64
    }
}

/// Decodes PCM16 little-endian bytes into normalized samples.
///
/// A trailing odd byte is ignored, so an empty or one-byte chunk decodes
/// to nothing.
pub fn decode_pcm16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect()
}

/// Encodes normalized samples back to PCM16 little-endian bytes, clamping
/// out-of-range values.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let v = (s * 32768.0).clamp(-32768.0, 32767.0) as i16;
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_arithmetic() {
        let format = Format::MONO_16K;
        assert_eq!(format.bytes_rate(), 32000);
        assert_eq!(format.samples(32000), 16000);
        assert_eq!(format.samples_in(2.0), 32000);
        assert_eq!(format.samples_in(-1.0), 0);
        assert_eq!(format.bytes_in_duration(Duration::from_millis(100)), 3200);
        assert!((format.secs(8000) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_decode_values() {
        let bytes = [0x00, 0x00, 0xff, 0x7f, 0x00, 0x80];
        let samples = decode_pcm16(&bytes);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - 32767.0 / 32768.0).abs() < 1e-6);
        assert_eq!(samples[2], -1.0);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(decode_pcm16(&[]).is_empty());
        assert!(decode_pcm16(&[0x12]).is_empty());
        assert_eq!(decode_pcm16(&[0, 0, 7]).len(), 1);
    }

    #[test]
    fn test_encode_clamps() {
        let bytes = encode_pcm16(&[0.5, 2.0, -2.0]);
        let samples = decode_pcm16(&bytes);
        assert!((samples[0] - 0.5).abs() < 1e-4);
        assert!((samples[1] - 32767.0 / 32768.0).abs() < 1e-6);
        assert_eq!(samples[2], -1.0);
    }
}
