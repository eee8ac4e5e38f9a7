//! Values emitted by a session.

use sentinel_risk::{AlertCategory, Indicator, RiskInputs, RiskLevel};
use sentinel_speech::{ScamIntent, SpoofVerdict, Transcript};
use sentinel_voiceprint::SafeMatch;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque session identifier.
pub type SessionId = Uuid;

/// The analysis of one speech span.
///
/// Built once every sub-analysis for the span has resolved, successfully or
/// with its degraded default. Never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub session: SessionId,
    /// Position of the span within the session, from 0.
    pub segment: u64,
    /// Session-scoped speaker id, `None` when no embedding was available.
    pub speaker: Option<u32>,
    /// Session-relative start, in seconds.
    pub start_secs: f64,
    pub end_secs: f64,
    pub transcript: Transcript,
    pub spoof: SpoofVerdict,
    pub spoofed: bool,
    pub intent: ScamIntent,
    /// Sub-scores that went into the fused score.
    pub inputs: RiskInputs,
    pub score: f64,
    pub level: RiskLevel,
    pub indicators: Vec<Indicator>,
    pub alert_triggered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_category: Option<AlertCategory>,
    /// Safe-list voiceprints this span matched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safe_matches: Vec<SafeMatch>,
}

impl AnalysisResult {
    pub fn duration_secs(&self) -> f64 {
        (self.end_secs - self.start_secs).max(0.0)
    }

    /// True for suspicious and scam results.
    pub fn is_flagged(&self) -> bool {
        self.level != RiskLevel::Safe
    }
}

/// An item on a session's result stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Result(AnalysisResult),
    /// Processing of a span failed unexpectedly. The session keeps running.
    Error { message: String },
}

/// Alert audio for binary delivery to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertAudio {
    pub session: SessionId,
    pub segment: u64,
    pub category: AlertCategory,
    pub language: String,
    pub message: String,
    pub audio: Vec<u8>,
    /// True when synthesis failed and `audio` holds the local fallback.
    pub degraded: bool,
}

/// What the caller of [`SessionManager::open`](crate::SessionManager::open)
/// receives.
///
/// Results and alerts arrive on separate bounded channels, so a large alert
/// payload never holds up the next result.
#[derive(Debug)]
pub struct SessionHandle {
    pub id: SessionId,
    pub results: mpsc::Receiver<SessionEvent>,
    pub alerts: mpsc::Receiver<AlertAudio>,
}
