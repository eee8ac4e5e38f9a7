//! Values exchanged with capabilities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output of a [`Transcriber`](crate::Transcriber).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// Detected language as a short code such as `"en"`.
    pub language: String,
    /// Recognition confidence in `[0, 1]`.
    pub confidence: f32,
}

impl Transcript {
    pub fn new(text: impl Into<String>, language: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            confidence,
        }
    }

    /// The degraded value: no text, English, zero confidence.
    pub fn empty() -> Self {
        Self::new("", "en", 0.0)
    }

    /// True when no words were recognized.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Output of a [`SpoofDetector`](crate::SpoofDetector).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpoofVerdict {
    /// Likelihood the voice is synthetic or replayed, 0-100.
    pub score: f64,
    /// Detector confidence in its own verdict, 0-100.
    pub confidence: f64,
}

impl SpoofVerdict {
    /// Scores above this value count as spoofed.
    pub const SPOOFED_ABOVE: f64 = 50.0;

    pub fn new(score: f64, confidence: f64) -> Self {
        Self {
            score: score.clamp(0.0, 100.0),
            confidence: confidence.clamp(0.0, 100.0),
        }
    }

    /// The degraded value: not spoofed, low confidence.
    pub fn genuine() -> Self {
        Self::new(0.0, 10.0)
    }

    pub fn is_spoofed(&self) -> bool {
        self.score > Self::SPOOFED_ABOVE
    }
}

/// Scam-intent classification label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScamLabel {
    #[default]
    Safe,
    Suspicious,
    Scam,
    /// The classifier ran but could not decide.
    Error,
}

impl ScamLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScamLabel::Safe => "Safe",
            ScamLabel::Suspicious => "Suspicious",
            ScamLabel::Scam => "Scam",
            ScamLabel::Error => "Error",
        }
    }

    /// Parses a label case-insensitively. Anything unrecognized is `Error`.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "safe" => ScamLabel::Safe,
            "suspicious" => ScamLabel::Suspicious,
            "scam" => ScamLabel::Scam,
            _ => ScamLabel::Error,
        }
    }
}

impl fmt::Display for ScamLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ScamLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScamLabel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ScamLabel::from_str(&s))
    }
}

/// Output of an [`IntentClassifier`](crate::IntentClassifier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScamIntent {
    pub label: ScamLabel,
    pub rationale: String,
}

impl ScamIntent {
    pub fn new(label: ScamLabel, rationale: impl Into<String>) -> Self {
        Self {
            label,
            rationale: rationale.into(),
        }
    }

    /// Used when there was nothing to classify.
    pub fn no_speech() -> Self {
        Self::new(ScamLabel::Safe, "No speech detected or transcribed.")
    }

    /// The degraded value when classification failed or timed out.
    pub fn failed(reason: impl fmt::Display) -> Self {
        Self::new(ScamLabel::Error, format!("Classification unavailable: {reason}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_roundtrip() {
        for label in [ScamLabel::Safe, ScamLabel::Suspicious, ScamLabel::Scam, ScamLabel::Error] {
            assert_eq!(ScamLabel::from_str(label.as_str()), label);
        }
        assert_eq!(ScamLabel::from_str(" SCAM "), ScamLabel::Scam);
        assert_eq!(ScamLabel::from_str("maybe"), ScamLabel::Error);
    }

    #[test]
    fn test_label_serde() {
        let intent = ScamIntent::new(ScamLabel::Suspicious, "asks for a code");
        let json = serde_json::to_string(&intent).unwrap();
        assert_eq!(json, r#"{"label":"Suspicious","rationale":"asks for a code"}"#);
        let back: ScamIntent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, intent);
    }

    #[test]
    fn test_verdict_clamps() {
        let v = SpoofVerdict::new(150.0, -3.0);
        assert_eq!(v.score, 100.0);
        assert_eq!(v.confidence, 0.0);
        assert!(v.is_spoofed());
        assert!(!SpoofVerdict::new(50.0, 90.0).is_spoofed());
        assert!(!SpoofVerdict::genuine().is_spoofed());
    }

    #[test]
    fn test_transcript_empty() {
        assert!(Transcript::empty().is_empty());
        assert!(Transcript::new("  ", "en", 0.9).is_empty());
        assert!(!Transcript::new("hi", "en", 0.9).is_empty());
    }
}
