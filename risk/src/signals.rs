//! Text signal extraction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::patterns::{self, LanguageTable};

/// Most indicators attached to one result.
pub const MAX_INDICATORS: usize = 5;

/// Kind of evidence behind an [`Indicator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    PersonalInfo,
    Pressure,
    Spoofing,
    Pattern,
}

impl IndicatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::PersonalInfo => "personal_info",
            IndicatorKind::Pressure => "pressure",
            IndicatorKind::Spoofing => "spoofing",
            IndicatorKind::Pattern => "pattern",
        }
    }
}

/// One piece of explainable evidence, such as a matched phrase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Indicator {
    pub kind: IndicatorKind,
    pub detail: String,
}

impl Indicator {
    pub fn new(kind: IndicatorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.detail)
    }
}

/// Sub-scores extracted from one transcript, each 0-100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextSignals {
    pub pattern: f64,
    pub pressure: f64,
    pub personal_info: f64,
    pub context: f64,
    pub pattern_hits: usize,
    pub pressure_hits: usize,
    pub personal_hits: usize,
    /// Most important first, at most [`MAX_INDICATORS`].
    pub indicators: Vec<Indicator>,
}

impl TextSignals {
    /// Hits across pattern, pressure and personal-info tables.
    pub fn total_hits(&self) -> usize {
        self.pattern_hits + self.pressure_hits + self.personal_hits
    }
}

const PATTERN_POINTS: f64 = 50.0;
const PRESSURE_POINTS: f64 = 40.0;
const PERSONAL_POINTS: f64 = 50.0;
const DETAIL_MAX_CHARS: usize = 60;

/// Extracts sub-scores from `text` using the tables for `language`.
///
/// Unknown languages use the English tables. Empty text scores zero
/// everywhere.
pub fn analyze_text(text: &str, language: &str) -> TextSignals {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return TextSignals::default();
    }
    let table = patterns::for_language(language);

    let personal = matches(&table.personal, &text);
    let pressure = matches(&table.pressure, &text);
    let pattern = matches(&table.scam, &text);

    let mut indicators: Vec<Indicator> = personal
        .iter()
        .map(|m| Indicator::new(IndicatorKind::PersonalInfo, m.clone()))
        .chain(pressure.iter().map(|m| Indicator::new(IndicatorKind::Pressure, m.clone())))
        .chain(pattern.iter().map(|m| Indicator::new(IndicatorKind::Pattern, m.clone())))
        .collect();
    indicators.truncate(MAX_INDICATORS);

    TextSignals {
        pattern: (pattern.len() as f64 * PATTERN_POINTS).min(100.0),
        pressure: (pressure.len() as f64 * PRESSURE_POINTS).min(100.0),
        personal_info: (personal.len() as f64 * PERSONAL_POINTS).min(100.0),
        context: context_score(table, &text, pattern.len(), pressure.len(), personal.len()),
        pattern_hits: pattern.len(),
        pressure_hits: pressure.len(),
        personal_hits: personal.len(),
        indicators,
    }
}

/// Returns the matched text of every pattern that hits, in table order.
fn matches(patterns: &[regex::Regex], text: &str) -> Vec<String> {
    patterns
        .iter()
        .filter_map(|re| re.find(text))
        .map(|m| m.as_str().chars().take(DETAIL_MAX_CHARS).collect())
        .collect()
}

/// Conversational-flow heuristic.
///
/// Rewards combinations that rarely occur in legitimate calls (pressure on
/// top of a request, claimed authority) and discounts phrases typical of
/// ordinary service calls.
fn context_score(table: &LanguageTable, text: &str, pattern: usize, pressure: usize, personal: usize) -> f64 {
    let mut score: f64 = 0.0;
    if pattern > 0 {
        score += 20.0;
    }
    if personal > 0 {
        score += 30.0;
    }
    if pressure > 0 && (pattern > 0 || personal > 0) {
        score += 30.0;
    }
    if table.authority.is_match(text) {
        score += 20.0;
    }
    let legitimate = table.legitimate.iter().filter(|re| re.is_match(text)).count();
    score -= 25.0 * legitimate as f64;
    score.clamp(0.0, 100.0)
}
