//! Output utilities for the command line.

use std::fmt::Write as _;
use std::io::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sentinel_session::{AlertAudio, AnalysisResult, IncidentReport};
use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable lines (default).
    #[default]
    Text,
    /// One JSON document per item.
    Json,
    Yaml,
}

/// Writes structured values to stdout.
pub struct Output {
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Prints `value` in the configured format. Text output falls back to
    /// YAML, which reads well for records and breakdowns.
    pub fn write<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let output = match self.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Yaml | OutputFormat::Text => serde_yaml::to_string(value)?,
        };
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", output.trim_end())?;
        Ok(())
    }

    /// Prints a pre-formatted line.
    pub fn line(&self, line: &str) -> anyhow::Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}")?;
        Ok(())
    }
}

/// One result as a short block of text.
pub fn format_result(r: &AnalysisResult) -> String {
    let speaker = r.speaker.map_or_else(|| "?".to_string(), |s| s.to_string());
    let mut out = format!(
        "[{:7.2}s - {:7.2}s] speaker {:<2} score {:5.1} {:<10}",
        r.start_secs,
        r.end_secs,
        speaker,
        r.score,
        r.level.as_str(),
    );
    if let Some(category) = r.alert_category {
        let _ = write!(out, " ALERT {category}");
    }
    if !r.transcript.is_empty() {
        let _ = write!(out, "\n    \"{}\" ({})", r.transcript.text.trim(), r.transcript.language);
    }
    let _ = write!(out, "\n    intent: {} - {}", r.intent.label, r.intent.rationale);
    if r.spoofed {
        let _ = write!(out, "\n    voice spoofing suspected ({:.0}% confidence)", r.spoof.confidence);
    }
    if !r.indicators.is_empty() {
        let indicators: Vec<String> = r.indicators.iter().map(ToString::to_string).collect();
        let _ = write!(out, "\n    indicators: {}", indicators.join("; "));
    }
    if !r.safe_matches.is_empty() {
        let names: Vec<String> = r
            .safe_matches
            .iter()
            .map(|m| format!("{} ({:.2})", m.name, m.similarity))
            .collect();
        let _ = write!(out, "\n    safe-list: {}", names.join(", "));
    }
    out
}

/// The incident report as text.
pub fn format_report(report: &IncidentReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Incident report ({}) ===", report.overall_level());
    let _ = writeln!(out, "{}", report.summary);
    let _ = writeln!(
        out,
        "segments: {} total, {} scam, {} suspicious, {} safe",
        report.total_segments, report.scam_segments, report.suspicious_segments, report.safe_segments
    );
    for r in &report.flagged {
        let _ = writeln!(
            out,
            "  - [{:.2}s] {} {:.1}: {}",
            r.start_secs,
            r.level,
            r.score,
            r.transcript.text.trim()
        );
    }
    let _ = write!(out, "next steps: {}", report.recommended_steps);
    out
}

/// Alert payload as JSON with the audio base64-encoded.
pub fn alert_json(alert: &AlertAudio) -> serde_json::Value {
    serde_json::json!({
        "type": "alert",
        "session": alert.session,
        "segment": alert.segment,
        "category": alert.category,
        "language": alert.language,
        "message": alert.message,
        "degraded": alert.degraded,
        "audio_base64": STANDARD.encode(&alert.audio),
    })
}
