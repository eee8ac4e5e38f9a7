//! Spoken alert rendering.

use async_trait::async_trait;

use crate::SpeechError;

/// Interface for alert speech synthesis.
#[async_trait]
pub trait AlertSynthesizer: Send + Sync {
    /// Renders `text` in `language`. `Ok(None)` means the synthesizer chose
    /// not to produce audio.
    async fn synthesize(&self, text: &str, language: &str) -> Result<Option<Vec<u8>>, SpeechError>;
}

/// Local fallback that delivers the alert text itself as the payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextAlertSynthesizer;

#[async_trait]
impl AlertSynthesizer for TextAlertSynthesizer {
    async fn synthesize(&self, text: &str, _language: &str) -> Result<Option<Vec<u8>>, SpeechError> {
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(text.as_bytes().to_vec()))
    }
}
