//! Alert category selection and debouncing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::alert_message;
use crate::patterns::primary_language;

/// Tunable alert parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Fused scores at or above this raise an alert (default: 70).
    pub alert_threshold: f64,
    /// Scores at or above this are `high_risk` (default: 80).
    pub high_risk_threshold: f64,
    /// Spoofed voices at or above this confidence raise an alert on their
    /// own (default: 80).
    pub spoof_confidence_threshold: f64,
    /// Combined indicators needed for `scam_patterns` (default: 3).
    pub pattern_indicator_count: usize,
    /// Session-time seconds during which repeat alerts are suppressed
    /// (default: 10).
    pub cooldown_secs: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            alert_threshold: 70.0,
            high_risk_threshold: 80.0,
            spoof_confidence_threshold: 80.0,
            pattern_indicator_count: 3,
            cooldown_secs: 10.0,
        }
    }
}

/// Alert category, in descending priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    PersonalInfo,
    PressureTactic,
    VoiceSpoofing,
    ScamPatterns,
    HighRisk,
    MediumRisk,
}

impl AlertCategory {
    /// Larger is more urgent.
    pub fn priority(&self) -> u8 {
        match self {
            AlertCategory::PersonalInfo => 6,
            AlertCategory::PressureTactic => 5,
            AlertCategory::VoiceSpoofing => 4,
            AlertCategory::ScamPatterns => 3,
            AlertCategory::HighRisk => 2,
            AlertCategory::MediumRisk => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::PersonalInfo => "personal_info",
            AlertCategory::PressureTactic => "pressure_tactic",
            AlertCategory::VoiceSpoofing => "voice_spoofing",
            AlertCategory::ScamPatterns => "scam_patterns",
            AlertCategory::HighRisk => "high_risk",
            AlertCategory::MediumRisk => "medium_risk",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the policy looks at for one result.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlertInput<'a> {
    pub score: f64,
    pub pattern_hits: usize,
    pub pressure_hits: usize,
    pub personal_hits: usize,
    pub spoofed: bool,
    pub spoof_confidence: f64,
    pub language: &'a str,
}

/// An alert to deliver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertDecision {
    pub category: AlertCategory,
    pub language: String,
    pub message: &'static str,
}

/// Stateless alert selection.
#[derive(Debug, Clone, Default)]
pub struct AlertPolicy {
    config: AlertConfig,
}

impl AlertPolicy {
    pub fn new(config: AlertConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Returns the alert for `input`, or `None` when nothing qualifies.
    pub fn evaluate(&self, input: &AlertInput<'_>) -> Option<AlertDecision> {
        let cfg = &self.config;
        let spoof_alert = input.spoofed && input.spoof_confidence >= cfg.spoof_confidence_threshold;
        if input.score < cfg.alert_threshold && !spoof_alert {
            return None;
        }

        let indicators = input.pattern_hits + input.pressure_hits + input.personal_hits;
        let category = if input.personal_hits > 0 {
            AlertCategory::PersonalInfo
        } else if input.pressure_hits > 0 {
            AlertCategory::PressureTactic
        } else if input.spoofed {
            AlertCategory::VoiceSpoofing
        } else if indicators >= cfg.pattern_indicator_count {
            AlertCategory::ScamPatterns
        } else if input.score >= cfg.high_risk_threshold {
            AlertCategory::HighRisk
        } else {
            AlertCategory::MediumRisk
        };

        let language = match primary_language(input.language).as_str() {
            l @ ("es" | "fr") => l.to_string(),
            _ => "en".to_string(),
        };
        Some(AlertDecision {
            category,
            message: alert_message(category, &language),
            language,
        })
    }
}

/// Per-session alert debounce.
///
/// After an alert is admitted, later alerts are suppressed for the cooldown
/// window unless their category has strictly higher priority than the last
/// admitted one.
#[derive(Debug, Clone, Default)]
pub struct AlertGate {
    last: Option<(f64, AlertCategory)>,
}

impl AlertGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides whether `category` at session time `at_secs` may fire, and
    /// records it if so.
    pub fn admit(&mut self, category: AlertCategory, at_secs: f64, cooldown_secs: f64) -> bool {
        let allowed = match self.last {
            None => true,
            Some((last_at, last_category)) => {
                at_secs - last_at >= cooldown_secs || category.priority() > last_category.priority()
            }
        };
        if allowed {
            self.last = Some((at_secs, category));
        } else {
            tracing::debug!(category = %category, at_secs, "alert suppressed by cooldown");
        }
        allowed
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(score: f64) -> AlertInput<'static> {
        AlertInput {
            score,
            language: "en",
            ..Default::default()
        }
    }

    #[test]
    fn test_below_threshold_no_alert() {
        let policy = AlertPolicy::default();
        assert!(policy.evaluate(&input(69.9)).is_none());
        assert!(policy.evaluate(&input(0.0)).is_none());
    }

    #[test]
    fn test_priority_order() {
        let policy = AlertPolicy::default();
        let mut i = AlertInput {
            score: 85.0,
            pattern_hits: 2,
            pressure_hits: 1,
            personal_hits: 1,
            spoofed: true,
            spoof_confidence: 90.0,
            language: "en",
        };
        assert_eq!(policy.evaluate(&i).unwrap().category, AlertCategory::PersonalInfo);
        i.personal_hits = 0;
        assert_eq!(policy.evaluate(&i).unwrap().category, AlertCategory::PressureTactic);
        i.pressure_hits = 0;
        assert_eq!(policy.evaluate(&i).unwrap().category, AlertCategory::VoiceSpoofing);
        i.spoofed = false;
        i.pattern_hits = 3;
        assert_eq!(policy.evaluate(&i).unwrap().category, AlertCategory::ScamPatterns);
        i.pattern_hits = 2;
        assert_eq!(policy.evaluate(&i).unwrap().category, AlertCategory::HighRisk);
        i.score = 75.0;
        assert_eq!(policy.evaluate(&i).unwrap().category, AlertCategory::MediumRisk);
    }

    #[test]
    fn test_confident_spoof_alerts_alone() {
        let policy = AlertPolicy::default();
        let mut i = AlertInput {
            score: 20.0,
            spoofed: true,
            spoof_confidence: 85.0,
            language: "fr",
            ..Default::default()
        };
        let d = policy.evaluate(&i).unwrap();
        assert_eq!(d.category, AlertCategory::VoiceSpoofing);
        assert_eq!(d.language, "fr");
        assert!(d.message.contains("deepfake"));

        i.spoof_confidence = 60.0;
        assert!(policy.evaluate(&i).is_none());
    }

    #[test]
    fn test_unknown_language_falls_back() {
        let d = AlertPolicy::default()
            .evaluate(&AlertInput {
                score: 90.0,
                language: "de",
                ..Default::default()
            })
            .unwrap();
        assert_eq!(d.language, "en");
        assert_eq!(d.category, AlertCategory::HighRisk);
    }

    #[test]
    fn test_gate_cooldown() {
        let mut gate = AlertGate::new();
        assert!(gate.admit(AlertCategory::HighRisk, 1.0, 10.0));
        assert!(!gate.admit(AlertCategory::HighRisk, 5.0, 10.0));
        assert!(!gate.admit(AlertCategory::MediumRisk, 6.0, 10.0));
        // Strictly higher priority breaks through.
        assert!(gate.admit(AlertCategory::PersonalInfo, 7.0, 10.0));
        assert!(!gate.admit(AlertCategory::PersonalInfo, 8.0, 10.0));
        // Window restarts from the last admitted alert.
        assert!(gate.admit(AlertCategory::MediumRisk, 17.0, 10.0));
    }

    #[test]
    fn test_gate_zero_cooldown_admits_all() {
        let mut gate = AlertGate::new();
        assert!(gate.admit(AlertCategory::MediumRisk, 1.0, 0.0));
        assert!(gate.admit(AlertCategory::MediumRisk, 1.0, 0.0));
    }

    #[test]
    fn test_category_serde() {
        assert_eq!(serde_json::to_string(&AlertCategory::PressureTactic).unwrap(), r#""pressure_tactic""#);
        assert_eq!(AlertCategory::ScamPatterns.to_string(), "scam_patterns");
    }
}
