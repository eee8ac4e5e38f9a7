//! Capability interfaces consumed by the analysis pipeline.
//!
//! This crate provides interfaces for:
//! - [`Transcriber`]: speech-to-text for one speech span
//! - [`SpoofDetector`]: synthetic or replayed voice detection
//! - [`IntentClassifier`] and [`TextRiskModel`]: scam-intent text analysis
//! - [`AlertSynthesizer`]: spoken alert rendering
//!
//! Concrete services plug in behind these traits. The crate also ships
//! deterministic stand-ins ([`ScriptedTranscriber`],
//! [`SpectralSpoofDetector`], [`TextAlertSynthesizer`]) and a bounded
//! [`CachedTranscriber`] wrapper.

mod asr;
mod error;
mod intent;
mod spoof;
mod tts;
mod types;

pub use asr::*;
pub use error::*;
pub use intent::*;
pub use spoof::*;
pub use tts::*;
pub use types::*;

#[cfg(test)]
mod tests;
