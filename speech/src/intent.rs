//! Scam-intent text analysis.

use async_trait::async_trait;

use crate::{ScamIntent, SpeechError};

/// Interface for scam-intent classification of transcribed text.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classifies `text` spoken in `language`.
    async fn classify(&self, text: &str, language: &str) -> Result<ScamIntent, SpeechError>;
}

/// Interface for a general text risk model producing a 0-100 score.
///
/// Optional: when no model is configured the signal counts as 0.
#[async_trait]
pub trait TextRiskModel: Send + Sync {
    async fn score(&self, text: &str, language: &str) -> Result<f64, SpeechError>;
}
