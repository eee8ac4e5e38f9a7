//! Synthetic and replayed voice detection.

use async_trait::async_trait;

use crate::{SpeechError, SpoofVerdict};

/// Interface for voice spoofing detection.
#[async_trait]
pub trait SpoofDetector: Send + Sync {
    async fn detect(&self, samples: &[f32], sample_rate: u32) -> Result<SpoofVerdict, SpeechError>;
}

/// Deterministic feature heuristic for spoofed audio.
///
/// Live speech fluctuates: frame loudness and zero-crossing rate vary from
/// syllable to syllable. Synthesized or re-played audio tends to be flatter
/// and is more often clipped or DC-shifted. Each of these cues adds to the
/// score. Confidence grows with the amount of voiced audio analysed.
#[derive(Debug, Clone)]
pub struct SpectralSpoofDetector {
    /// Analysis frame length in milliseconds (default: 20).
    pub frame_ms: u32,
    /// Frames below this RMS are ignored (default: 0.01).
    pub silence_rms: f32,
}

impl Default for SpectralSpoofDetector {
    fn default() -> Self {
        Self {
            frame_ms: 20,
            silence_rms: 0.01,
        }
    }
}

/// Per-span statistics used by [`SpectralSpoofDetector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpoofFeatures {
    pub voiced_frames: usize,
    /// Coefficient of variation of voiced frame RMS.
    pub energy_variation: f64,
    /// Standard deviation of voiced frame zero-crossing rate.
    pub zcr_deviation: f64,
    /// Fraction of samples at or beyond full scale.
    pub clipping_ratio: f64,
    pub dc_offset: f64,
}

impl SpectralSpoofDetector {
    /// Computes the features, or `None` when fewer than two voiced frames exist.
    pub fn features(&self, samples: &[f32], sample_rate: u32) -> Option<SpoofFeatures> {
        let frame = (sample_rate as usize * self.frame_ms as usize / 1000).max(1);

        let mut rms = Vec::new();
        let mut zcr = Vec::new();
        for chunk in samples.chunks_exact(frame) {
            let energy = chunk.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>() / frame as f64;
            let r = energy.sqrt();
            if r < self.silence_rms as f64 {
                continue;
            }
            let crossings = chunk
                .windows(2)
                .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
                .count();
            rms.push(r);
            zcr.push(crossings as f64 / frame as f64);
        }
        if rms.len() < 2 {
            return None;
        }

        let (rms_mean, rms_std) = mean_std(&rms);
        let (_, zcr_std) = mean_std(&zcr);
        let clipped = samples.iter().filter(|s| s.abs() >= 0.999).count();
        let dc = samples.iter().map(|&s| s as f64).sum::<f64>() / samples.len() as f64;

        Some(SpoofFeatures {
            voiced_frames: rms.len(),
            energy_variation: if rms_mean > 0.0 { rms_std / rms_mean } else { 0.0 },
            zcr_deviation: zcr_std,
            clipping_ratio: clipped as f64 / samples.len() as f64,
            dc_offset: dc.abs(),
        })
    }

    /// Scores features on the 0-100 scale.
    pub fn score(&self, f: &SpoofFeatures, frame_secs: f64) -> SpoofVerdict {
        let mut score = 0.0;
        if f.energy_variation < 0.1 {
            score += 40.0;
        } else if f.energy_variation < 0.25 {
            score += 20.0;
        }
        if f.zcr_deviation < 0.005 {
            score += 30.0;
        } else if f.zcr_deviation < 0.015 {
            score += 15.0;
        }
        if f.clipping_ratio > 0.01 {
            score += 20.0;
        }
        if f.dc_offset > 0.05 {
            score += 10.0;
        }

        let voiced_secs = f.voiced_frames as f64 * frame_secs;
        let confidence = 30.0 + 60.0 * (voiced_secs / 3.0).min(1.0);
        SpoofVerdict::new(score, confidence)
    }
}

#[async_trait]
impl SpoofDetector for SpectralSpoofDetector {
    async fn detect(&self, samples: &[f32], sample_rate: u32) -> Result<SpoofVerdict, SpeechError> {
        if sample_rate == 0 {
            return Err(SpeechError::SpoofDetection("sample rate is zero".to_string()));
        }
        match self.features(samples, sample_rate) {
            Some(features) => Ok(self.score(&features, self.frame_ms as f64 / 1000.0)),
            // Not enough voiced audio to judge.
            None => Ok(SpoofVerdict::new(0.0, 0.0)),
        }
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}
