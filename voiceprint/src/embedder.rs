use std::borrow::Cow;

use sentinel_audio::resample;

use crate::fbank::{compute_fbank, l2_normalize, FbankConfig};
use crate::{SpeakerEmbedder, VoiceprintError};

/// Deterministic embedder built on log mel filterbank statistics.
///
/// The embedding is the per-bin mean of the log mel energies over all
/// frames, centered across bins and L2-normalized, so overall loudness does
/// not affect similarity. Input at other sample rates is resampled to the
/// feature rate first.
///
/// This captures the long-term spectral envelope of a voice. It is a
/// serviceable stand-in where no neural speaker model is deployed.
#[derive(Debug, Clone, Default)]
pub struct FbankEmbedder {
    config: FbankConfig,
}

impl FbankEmbedder {
    pub fn new(config: FbankConfig) -> Self {
        Self { config }
    }
}

impl SpeakerEmbedder for FbankEmbedder {
    fn extract(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>, VoiceprintError> {
        let samples: Cow<'_, [f32]> = if sample_rate == self.config.sample_rate {
            Cow::Borrowed(samples)
        } else {
            Cow::Owned(
                resample(samples, sample_rate, self.config.sample_rate)
                    .map_err(|e| VoiceprintError::Model(e.to_string()))?,
            )
        };

        let features = compute_fbank(&samples, &self.config).ok_or(VoiceprintError::AudioTooShort {
            min_samples: self.config.frame_length,
            got_samples: samples.len(),
        })?;

        let frames = features.len() as f64;
        let mut embedding: Vec<f32> = (0..self.config.num_mels)
            .map(|m| (features.iter().map(|f| f[m] as f64).sum::<f64>() / frames) as f32)
            .collect();

        let mean = embedding.iter().sum::<f32>() / embedding.len() as f32;
        embedding.iter_mut().for_each(|v| *v -= mean);
        l2_normalize(&mut embedding);
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.config.num_mels
    }
}
