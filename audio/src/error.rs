use thiserror::Error;

/// Errors returned by audio operations.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio: resampler error: {0}")]
    Resample(String),

    #[error("audio: invalid sample rate {0}")]
    InvalidSampleRate(u32),
}
