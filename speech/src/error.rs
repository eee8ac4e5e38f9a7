/// Error type for capability calls.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("transcription failed: {0}")]
    Transcription(String),
    #[error("spoof detection failed: {0}")]
    SpoofDetection(String),
    #[error("classification failed: {0}")]
    Classification(String),
    #[error("synthesis failed: {0}")]
    Synthesis(String),
    #[error("capability unavailable: {0}")]
    Unavailable(String),
}
