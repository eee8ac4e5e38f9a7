//! Deterministic risk fusion.

use serde::{Deserialize, Serialize};
use sentinel_speech::ScamLabel;

use crate::{RiskLevel, TextSignals};

/// Weights of the text-derived composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub pattern: f64,
    pub pressure: f64,
    pub personal_info: f64,
    pub ml: f64,
    pub llm: f64,
    pub context: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            pattern: 0.25,
            pressure: 0.20,
            personal_info: 0.25,
            ml: 0.10,
            llm: 0.15,
            context: 0.15,
        }
    }
}

/// Tunable fusion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: Weights,
    /// Share of the text composite in the combined score (default: 0.7).
    pub text_weight: f64,
    /// Share of the spoofing score in the combined score (default: 0.3).
    pub voice_weight: f64,
    /// Multiplier applied when independent signals corroborate (default: 1.2).
    pub amplification: f64,
    /// A sub-score above this value counts as corroborating (default: 70).
    pub corroboration_threshold: f64,
    /// Corroborating sub-scores needed to amplify (default: 2).
    pub corroboration_min: usize,
    /// Scores at or above this are `Scam` (default: 70).
    pub scam_threshold: f64,
    /// Scores at or above this are `Suspicious` (default: 40).
    pub suspicious_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            text_weight: 0.7,
            voice_weight: 0.3,
            amplification: 1.2,
            corroboration_threshold: 70.0,
            corroboration_min: 2,
            scam_threshold: 70.0,
            suspicious_threshold: 40.0,
        }
    }
}

/// Independent sub-scores for one segment, each 0-100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskInputs {
    pub pattern: f64,
    pub pressure: f64,
    pub personal_info: f64,
    pub context: f64,
    /// General ML text score, 0 when no model is configured.
    pub ml: f64,
    /// LLM-derived score, `None` when the classifier was unavailable.
    pub llm: Option<f64>,
    pub spoofing: f64,
}

impl RiskInputs {
    pub fn from_signals(signals: &TextSignals, ml: f64, llm: Option<f64>, spoofing: f64) -> Self {
        Self {
            pattern: signals.pattern,
            pressure: signals.pressure,
            personal_info: signals.personal_info,
            context: signals.context,
            ml,
            llm,
            spoofing,
        }
    }
}

/// Result of [`RiskScorer::fuse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub level: RiskLevel,
    pub text_composite: f64,
    /// Sub-scores above the corroboration threshold.
    pub corroborating: usize,
    pub amplified: bool,
}

/// Maps a classifier label to the LLM sub-score. `Error` means unavailable.
pub fn llm_score(label: ScamLabel) -> Option<f64> {
    match label {
        ScamLabel::Safe => Some(0.0),
        ScamLabel::Suspicious => Some(60.0),
        ScamLabel::Scam => Some(95.0),
        ScamLabel::Error => None,
    }
}

/// Fuses independent sub-scores into one 0-100 score.
///
/// The text composite is a weighted mean of the text sub-scores. When the
/// LLM signal is missing its weight moves in equal parts to pattern,
/// pressure and personal-info. The weights are divided by their sum, so a
/// table that does not add up to exactly 1.0 still yields a mean.
///
/// `score = text_composite × text_weight + spoofing × voice_weight`, then
/// multiplied by `amplification` when at least `corroboration_min` of the
/// six signals (pattern, pressure, personal-info, model, context, spoofing)
/// exceed `corroboration_threshold`; model is the larger of the ML and LLM
/// scores. The result is clamped to `[0, 100]`.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Weighted mean of the text sub-scores.
    pub fn text_composite(&self, inputs: &RiskInputs) -> f64 {
        let w = &self.config.weights;
        let (mut wp, mut wpr, mut wpi, mut wllm) = (w.pattern, w.pressure, w.personal_info, w.llm);
        let llm = match inputs.llm {
            Some(v) => clamp(v),
            None => {
                let share = w.llm / 3.0;
                wp += share;
                wpr += share;
                wpi += share;
                wllm = 0.0;
                0.0
            }
        };

        let total = wp + wpr + wpi + w.ml + wllm + w.context;
        if total <= 0.0 {
            return 0.0;
        }
        let sum = clamp(inputs.pattern) * wp
            + clamp(inputs.pressure) * wpr
            + clamp(inputs.personal_info) * wpi
            + clamp(inputs.ml) * w.ml
            + llm * wllm
            + clamp(inputs.context) * w.context;
        clamp(sum / total)
    }

    /// Fuses `inputs` into a score and level.
    pub fn fuse(&self, inputs: &RiskInputs) -> RiskAssessment {
        let cfg = &self.config;
        let text_composite = self.text_composite(inputs);
        let mut score = text_composite * cfg.text_weight + clamp(inputs.spoofing) * cfg.voice_weight;

        let model = clamp(inputs.ml).max(inputs.llm.map(clamp).unwrap_or(0.0));
        let corroborating = [
            inputs.pattern,
            inputs.pressure,
            inputs.personal_info,
            model,
            inputs.context,
            inputs.spoofing,
        ]
        .iter()
        .filter(|&&s| clamp(s) > cfg.corroboration_threshold)
        .count();

        let amplified = corroborating >= cfg.corroboration_min;
        if amplified {
            score *= cfg.amplification;
        }
        let score = clamp(score);

        RiskAssessment {
            score,
            level: self.level(score),
            text_composite,
            corroborating,
            amplified,
        }
    }

    /// Level for a fused score.
    pub fn level(&self, score: f64) -> RiskLevel {
        if score >= self.config.scam_threshold {
            RiskLevel::Scam
        } else if score >= self.config.suspicious_threshold {
            RiskLevel::Suspicious
        } else {
            RiskLevel::Safe
        }
    }
}

fn clamp(v: f64) -> f64 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(p: f64, pr: f64, pi: f64, ctx: f64, ml: f64, llm: Option<f64>, spoof: f64) -> RiskInputs {
        RiskInputs {
            pattern: p,
            pressure: pr,
            personal_info: pi,
            context: ctx,
            ml,
            llm,
            spoofing: spoof,
        }
    }

    #[test]
    fn test_all_zero() {
        let a = RiskScorer::default().fuse(&RiskInputs::default());
        assert_eq!(a.score, 0.0);
        assert_eq!(a.level, RiskLevel::Safe);
        assert!(!a.amplified);
    }

    #[test]
    fn test_all_max_clamps() {
        let a = RiskScorer::default().fuse(&inputs(100.0, 100.0, 100.0, 100.0, 100.0, Some(100.0), 100.0));
        assert_eq!(a.score, 100.0);
        assert_eq!(a.level, RiskLevel::Scam);
        assert_eq!(a.corroborating, 6);
    }

    #[test]
    fn test_uniform_text_composite_is_mean() {
        let scorer = RiskScorer::default();
        let with_llm = scorer.text_composite(&inputs(50.0, 50.0, 50.0, 50.0, 50.0, Some(50.0), 0.0));
        let without = scorer.text_composite(&inputs(50.0, 50.0, 50.0, 50.0, 50.0, None, 0.0));
        assert!((with_llm - 50.0).abs() < 1e-9);
        assert!((without - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_llm_redistributes() {
        let scorer = RiskScorer::default();
        // Only pattern is set: weight 0.25 with LLM, 0.30 without, over 1.10.
        let with_llm = scorer.text_composite(&inputs(100.0, 0.0, 0.0, 0.0, 0.0, Some(0.0), 0.0));
        let without = scorer.text_composite(&inputs(100.0, 0.0, 0.0, 0.0, 0.0, None, 0.0));
        assert!((with_llm - 25.0 / 1.1).abs() < 1e-9);
        assert!((without - 30.0 / 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_scam_phrase_with_llm() {
        let a = RiskScorer::default().fuse(&inputs(100.0, 80.0, 100.0, 80.0, 0.0, Some(95.0), 30.0));
        // (25 + 16 + 25 + 0 + 14.25 + 12) / 1.1 = 83.86; * 0.7 + 9 = 67.7; * 1.2 = 81.24
        assert!((a.text_composite - 83.863_636).abs() < 1e-4);
        assert!(a.amplified);
        assert!((a.score - 81.245_454).abs() < 1e-4, "score = {}", a.score);
        assert_eq!(a.level, RiskLevel::Scam);
    }

    #[test]
    fn test_phrase_without_pressure_stays_below_scam() {
        let scorer = RiskScorer::default();
        // Strongest possible text without pressure, ML or spoofing:
        // (25 + 25 + 15 + 14.25) / 1.1 = 72.05; * 0.7 = 50.43; * 1.2 = 60.52
        let ceiling = scorer.fuse(&inputs(100.0, 0.0, 100.0, 100.0, 0.0, Some(95.0), 0.0));
        assert!((ceiling.score - 60.518_181).abs() < 1e-4, "score = {}", ceiling.score);
        assert_eq!(ceiling.level, RiskLevel::Suspicious);

        let signals = crate::analyze_text("Please verify your account and pay with a gift card.", "en");
        assert!(signals.pattern > 0.0);
        assert!(signals.personal_info > 0.0);
        for llm in [Some(60.0), Some(95.0)] {
            let a = scorer.fuse(&RiskInputs::from_signals(&signals, 0.0, llm, 0.0));
            assert_eq!(a.level, RiskLevel::Suspicious, "llm = {llm:?}, score = {}", a.score);
        }

        let urgent = crate::analyze_text(
            "This is urgent. Verify your account immediately and pay with a gift card.",
            "en",
        );
        let a = scorer.fuse(&RiskInputs::from_signals(&urgent, 0.0, Some(95.0), 30.0));
        assert_eq!(a.level, RiskLevel::Scam, "score = {}", a.score);
    }

    #[test]
    fn test_single_strong_signal_not_amplified() {
        let a = RiskScorer::default().fuse(&inputs(100.0, 0.0, 0.0, 0.0, 0.0, Some(0.0), 0.0));
        assert_eq!(a.corroborating, 1);
        assert!(!a.amplified);
        assert_eq!(a.level, RiskLevel::Safe);
    }

    #[test]
    fn test_spoofing_counts_as_corroboration() {
        let a = RiskScorer::default().fuse(&inputs(0.0, 0.0, 0.0, 0.0, 0.0, Some(95.0), 90.0));
        assert_eq!(a.corroborating, 2);
        assert!(a.amplified);
    }

    #[test]
    fn test_out_of_range_inputs_clamped() {
        let a = RiskScorer::default().fuse(&inputs(-50.0, 500.0, f64::NAN, 0.0, 0.0, None, -1.0));
        assert!((0.0..=100.0).contains(&a.score));
    }

    #[test]
    fn test_pure_function() {
        let scorer = RiskScorer::default();
        let i = inputs(60.0, 40.0, 20.0, 30.0, 10.0, None, 45.0);
        assert_eq!(scorer.fuse(&i), scorer.fuse(&i));
    }

    #[test]
    fn test_level_boundaries() {
        let scorer = RiskScorer::default();
        assert_eq!(scorer.level(70.0), RiskLevel::Scam);
        assert_eq!(scorer.level(69.99), RiskLevel::Suspicious);
        assert_eq!(scorer.level(40.0), RiskLevel::Suspicious);
        assert_eq!(scorer.level(39.99), RiskLevel::Safe);
    }

    #[test]
    fn test_llm_score_mapping() {
        assert_eq!(llm_score(ScamLabel::Safe), Some(0.0));
        assert_eq!(llm_score(ScamLabel::Suspicious), Some(60.0));
        assert_eq!(llm_score(ScamLabel::Scam), Some(95.0));
        assert_eq!(llm_score(ScamLabel::Error), None);
    }

    #[test]
    fn test_config_from_yaml() {
        let cfg: ScoringConfig = serde_yaml::from_str("weights:\n  ml: 0.0\namplification: 1.5\n").unwrap();
        assert_eq!(cfg.weights.ml, 0.0);
        assert_eq!(cfg.weights.pattern, 0.25);
        assert_eq!(cfg.amplification, 1.5);
        assert_eq!(cfg.text_weight, 0.7);
    }
}
