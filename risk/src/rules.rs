use async_trait::async_trait;
use sentinel_speech::{IntentClassifier, ScamIntent, ScamLabel, SpeechError};

use crate::{analyze_text, RiskInputs, RiskLevel, RiskScorer, ScoringConfig};

/// Intent classifier built on the phrase tables.
///
/// Labels text by its text composite (without an LLM signal) using the
/// scorer's level thresholds. Serves as the offline classifier when no
/// language model is configured.
#[derive(Debug, Clone, Default)]
pub struct RuleIntentClassifier {
    scorer: RiskScorer,
}

impl RuleIntentClassifier {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            scorer: RiskScorer::new(config),
        }
    }

    /// Synchronous form of [`IntentClassifier::classify`].
    pub fn label(&self, text: &str, language: &str) -> ScamIntent {
        if text.trim().is_empty() {
            return ScamIntent::no_speech();
        }
        let signals = analyze_text(text, language);

        let composite = self
            .scorer
            .text_composite(&RiskInputs::from_signals(&signals, 0.0, None, 0.0));
        let label = match self.scorer.level(composite) {
            RiskLevel::Scam => ScamLabel::Scam,
            RiskLevel::Suspicious => ScamLabel::Suspicious,
            RiskLevel::Safe => ScamLabel::Safe,
        };

        let rationale = if signals.indicators.is_empty() {
            "No known scam phrasing detected.".to_string()
        } else {
            let found: Vec<String> = signals.indicators.iter().map(ToString::to_string).collect();
            format!("Matched {} indicator(s): {}.", signals.total_hits(), found.join("; "))
        };
        ScamIntent::new(label, rationale)
    }
}

#[async_trait]
impl IntentClassifier for RuleIntentClassifier {
    async fn classify(&self, text: &str, language: &str) -> Result<ScamIntent, SpeechError> {
        Ok(self.label(text, language))
    }
}
