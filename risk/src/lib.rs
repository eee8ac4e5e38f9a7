//! Risk scoring for call transcripts and voice analysis.
//!
//! - [`analyze_text`]: language-specific pattern, pressure, personal-info and
//!   context sub-scores with explainable [`Indicator`]s
//! - [`RiskScorer`]: deterministic weighted fusion into one 0-100 score and a
//!   [`RiskLevel`]
//! - [`AlertPolicy`] and [`AlertGate`]: alert category selection with a
//!   per-session cooldown
//! - [`RuleIntentClassifier`]: an [`IntentClassifier`](sentinel_speech::IntentClassifier)
//!   built on the same signals

mod alert;
mod level;
mod messages;
mod patterns;
mod rules;
mod scorer;
mod signals;

pub use alert::{AlertCategory, AlertConfig, AlertDecision, AlertGate, AlertInput, AlertPolicy};
pub use level::RiskLevel;
pub use messages::alert_message;
pub use rules::RuleIntentClassifier;
pub use scorer::{llm_score, RiskAssessment, RiskInputs, RiskScorer, ScoringConfig, Weights};
pub use signals::{analyze_text, Indicator, IndicatorKind, TextSignals, MAX_INDICATORS};
