use crate::VoiceprintError;

/// Extracts speaker embedding vectors from audio.
///
/// Input is mono `f32` samples in `[-1, 1]` at `sample_rate`. The output is
/// a dense vector of [`SpeakerEmbedder::dimension`] values, compared with
/// [`cosine_similarity`](crate::cosine_similarity).
///
/// Implementations must be deterministic for identical input and safe for
/// concurrent use.
pub trait SpeakerEmbedder: Send + Sync {
    /// Computes a speaker embedding.
    fn extract(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>, VoiceprintError>;

    /// Returns the dimensionality of the embedding vectors.
    fn dimension(&self) -> usize;

    /// Reports whether the embedder is loaded and usable. Sessions are not
    /// created while this is false.
    fn is_ready(&self) -> bool {
        true
    }
}
