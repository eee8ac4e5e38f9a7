//! Scores text without audio.

use clap::Args;
use serde::Serialize;
use sentinel_cli::OutputFormat;
use sentinel_risk::{
    analyze_text, llm_score, RiskAssessment, RiskInputs, RiskScorer, RuleIntentClassifier, TextSignals,
};
use sentinel_speech::ScamIntent;

use super::{get_config, output};
use crate::Cli;

/// Run signal extraction and risk fusion on a piece of text.
///
/// The rule classifier stands in for the LLM signal.
#[derive(Args)]
pub struct ScoreCommand {
    /// Text to score
    text: String,

    /// Language of the text
    #[arg(long, default_value = "en")]
    language: String,

    /// Voice spoofing score (0-100)
    #[arg(long, default_value_t = 0.0)]
    spoof: f64,
}

#[derive(Serialize)]
struct Breakdown {
    signals: TextSignals,
    intent: ScamIntent,
    inputs: RiskInputs,
    assessment: RiskAssessment,
}

impl ScoreCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let scoring = cfg.pipeline.scoring;

        let signals = analyze_text(&self.text, &self.language);
        let intent = RuleIntentClassifier::new(scoring.clone()).label(&self.text, &self.language);
        let inputs = RiskInputs::from_signals(&signals, 0.0, llm_score(intent.label), self.spoof.clamp(0.0, 100.0));
        let assessment = RiskScorer::new(scoring).fuse(&inputs);

        let breakdown = Breakdown {
            signals,
            intent,
            inputs,
            assessment,
        };
        let out = output(cli);
        match out.format {
            OutputFormat::Text => out.line(&format_breakdown(&breakdown)),
            _ => out.write(&breakdown),
        }
    }
}

fn format_breakdown(b: &Breakdown) -> String {
    let mut lines = vec![
        format!("score:        {:.1} ({})", b.assessment.score, b.assessment.level),
        format!("text:         {:.1}", b.assessment.text_composite),
        format!("pattern:      {:.1}", b.inputs.pattern),
        format!("pressure:     {:.1}", b.inputs.pressure),
        format!("personal:     {:.1}", b.inputs.personal_info),
        format!("context:      {:.1}", b.inputs.context),
        format!("spoofing:     {:.1}", b.inputs.spoofing),
        format!("intent:       {} - {}", b.intent.label, b.intent.rationale),
    ];
    if b.assessment.amplified {
        lines.push(format!("amplified:    {} corroborating signals", b.assessment.corroborating));
    }
    for indicator in &b.signals.indicators {
        lines.push(format!("  - {indicator}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_risk::{RiskLevel, ScoringConfig};

    #[test]
    fn test_breakdown_of_scam_text() {
        let text = "This is urgent. Verify your account immediately and pay with a gift card.";
        let scoring = ScoringConfig::default();
        let signals = analyze_text(text, "en");
        let intent = RuleIntentClassifier::new(scoring.clone()).label(text, "en");
        let inputs = RiskInputs::from_signals(&signals, 0.0, llm_score(intent.label), 0.0);
        let assessment = RiskScorer::new(scoring).fuse(&inputs);
        assert_eq!(assessment.level, RiskLevel::Scam);

        let b = Breakdown {
            signals,
            intent,
            inputs,
            assessment,
        };
        let text = format_breakdown(&b);
        assert!(text.starts_with("score:"));
        assert!(text.contains("(scam)"));
        assert!(text.contains("amplified:"));
        assert!(text.contains("  - "));
    }
}
