//! End-of-call incident report.

use sentinel_risk::RiskLevel;
use serde::{Deserialize, Serialize};

use crate::AnalysisResult;

const STEPS_SCAM: &str = "This call shows strong signs of a scam. Hang up now and block the number. \
Do not share passwords, codes, card numbers or other personal information, and do not send money \
or gift cards. Report the call to your bank and to the authorities.";

const STEPS_SUSPICIOUS: &str = "Parts of this call looked suspicious. Be cautious and do not share \
personal or financial information. Verify the caller's identity by calling the organization back \
on a number you already know.";

const STEPS_SAFE: &str = "No scam activity was detected. Continue to be vigilant and never share \
sensitive information with unsolicited callers.";

/// Summary of a session's results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentReport {
    pub duration_secs: f64,
    pub total_segments: usize,
    pub scam_segments: usize,
    pub suspicious_segments: usize,
    pub safe_segments: usize,
    /// Scam and suspicious results, in session order.
    pub flagged: Vec<AnalysisResult>,
    pub summary: String,
    pub recommended_steps: String,
}

impl IncidentReport {
    /// Highest level found in the call.
    pub fn overall_level(&self) -> RiskLevel {
        if self.scam_segments > 0 {
            RiskLevel::Scam
        } else if self.suspicious_segments > 0 {
            RiskLevel::Suspicious
        } else {
            RiskLevel::Safe
        }
    }
}

/// Builds an [`IncidentReport`] from accumulated results.
///
/// The output depends only on `results`; calling it twice on the same input
/// yields equal reports.
pub fn summarize(results: &[AnalysisResult]) -> IncidentReport {
    let (Some(first), Some(last)) = (results.first(), results.last()) else {
        return IncidentReport {
            duration_secs: 0.0,
            total_segments: 0,
            scam_segments: 0,
            suspicious_segments: 0,
            safe_segments: 0,
            flagged: Vec::new(),
            summary: "No call activity was analyzed.".to_string(),
            recommended_steps: STEPS_SAFE.to_string(),
        };
    };

    let duration_secs = (last.end_secs - first.start_secs).max(0.0);
    let count = |level: RiskLevel| results.iter().filter(|r| r.level == level).count();
    let scam_segments = count(RiskLevel::Scam);
    let suspicious_segments = count(RiskLevel::Suspicious);
    let safe_segments = count(RiskLevel::Safe);

    let mut summary = format!(
        "Call lasted approximately {:.1} seconds. Analyzed {} speech segment{}.",
        duration_secs,
        results.len(),
        if results.len() == 1 { "" } else { "s" },
    );
    if scam_segments > 0 {
        summary.push_str(&format!(" Detected {scam_segments} scam segment(s)."));
    }
    if suspicious_segments > 0 {
        summary.push_str(&format!(" Detected {suspicious_segments} suspicious segment(s)."));
    }
    if scam_segments + suspicious_segments == 0 {
        summary.push_str(" No suspicious or scam activity detected.");
    }

    let recommended_steps = if scam_segments > 0 {
        STEPS_SCAM
    } else if suspicious_segments > 0 {
        STEPS_SUSPICIOUS
    } else {
        STEPS_SAFE
    };

    IncidentReport {
        duration_secs,
        total_segments: results.len(),
        scam_segments,
        suspicious_segments,
        safe_segments,
        flagged: results.iter().filter(|r| r.is_flagged()).cloned().collect(),
        summary,
        recommended_steps: recommended_steps.to_string(),
    }
}
