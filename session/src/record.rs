//! Per-session accumulation and the persisted call summary.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use sentinel_risk::RiskLevel;
use sentinel_store::CallRecord;

use crate::{AnalysisResult, SessionId};

/// Longest transcript kept in a call record, in characters. Older speech is
/// dropped first.
pub(crate) const MAX_TRANSCRIPT_CHARS: usize = 16_000;

/// Results of one session.
///
/// Keeps the most recent `max_results` results for reporting, plus running
/// aggregates over every result ever pushed, so the call summary stays
/// correct after old results have been evicted. The transcript keeps the
/// most recent [`MAX_TRANSCRIPT_CHARS`].
#[derive(Debug)]
pub(crate) struct CallLog {
    results: VecDeque<AnalysisResult>,
    max_results: usize,
    total: u64,
    max_score: f64,
    max_level: RiskLevel,
    transcript: VecDeque<String>,
    /// Characters in `transcript`, counting one separator per part.
    transcript_chars: usize,
    indicators: BTreeSet<String>,
    spoofed: bool,
    spoof_confidence: f64,
    language: Option<String>,
    first_start: Option<f64>,
    last_end: f64,
}

impl CallLog {
    pub fn new(max_results: usize) -> Self {
        Self {
            results: VecDeque::new(),
            max_results: max_results.max(1),
            total: 0,
            max_score: 0.0,
            max_level: RiskLevel::Safe,
            transcript: VecDeque::new(),
            transcript_chars: 0,
            indicators: BTreeSet::new(),
            spoofed: false,
            spoof_confidence: 0.0,
            language: None,
            first_start: None,
            last_end: 0.0,
        }
    }

    pub fn push(&mut self, result: AnalysisResult) {
        self.total += 1;
        if result.score > self.max_score {
            self.max_score = result.score;
        }
        self.max_level = self.max_level.max(result.level);

        if !result.transcript.is_empty() {
            self.push_text(result.transcript.text.trim());
            self.language = Some(result.transcript.language.clone());
        }
        self.indicators
            .extend(result.indicators.iter().map(ToString::to_string));

        if result.spoofed {
            if !self.spoofed || result.spoof.confidence > self.spoof_confidence {
                self.spoof_confidence = result.spoof.confidence;
            }
            self.spoofed = true;
        } else if !self.spoofed {
            self.spoof_confidence = result.spoof.confidence;
        }

        self.first_start.get_or_insert(result.start_secs);
        self.last_end = self.last_end.max(result.end_secs);

        if self.results.len() == self.max_results {
            self.results.pop_front();
        }
        self.results.push_back(result);
    }

    fn push_text(&mut self, text: &str) {
        let len = text.chars().count();
        let text = if len > MAX_TRANSCRIPT_CHARS {
            text.chars().skip(len - MAX_TRANSCRIPT_CHARS).collect()
        } else {
            text.to_string()
        };
        self.transcript_chars += text.chars().count() + 1;
        self.transcript.push_back(text);
        while self.transcript_chars > MAX_TRANSCRIPT_CHARS + 1 && self.transcript.len() > 1 {
            if let Some(old) = self.transcript.pop_front() {
                self.transcript_chars -= old.chars().count() + 1;
            }
        }
    }

    /// Retained results, oldest first.
    pub fn results(&self) -> Vec<AnalysisResult> {
        self.results.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results pushed over the whole session, including evicted ones.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    /// Reduces the session to the flat record handed to storage.
    pub fn to_record(&self, id: SessionId, client_id: &str, started_at: DateTime<Utc>) -> CallRecord {
        let duration_secs = match self.first_start {
            Some(start) => (self.last_end - start).max(0.0),
            None => 0.0,
        };
        CallRecord {
            id,
            client_id: client_id.to_string(),
            started_at,
            duration_secs,
            max_risk_score: self.max_score,
            risk_level: self.max_level.as_str().to_string(),
            transcript: self.transcript.iter().map(String::as_str).collect::<Vec<_>>().join(" "),
            indicators: self.indicators.iter().cloned().collect(),
            voice_spoofing_detected: self.spoofed,
            spoofing_confidence: self.spoof_confidence,
            language: self.language.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::result_at;
    use sentinel_risk::{Indicator, IndicatorKind};
    use sentinel_speech::{SpoofVerdict, Transcript};
    use uuid::Uuid;

    #[test]
    fn test_ring_is_bounded_but_aggregates_are_not() {
        let mut log = CallLog::new(2);
        log.push(result_at(0, 0.0, 1.0, 90.0, RiskLevel::Scam));
        log.push(result_at(1, 2.0, 3.0, 10.0, RiskLevel::Safe));
        log.push(result_at(2, 4.0, 5.0, 20.0, RiskLevel::Safe));

        let kept = log.results();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].segment, 1);
        assert_eq!(log.total(), 3);

        let record = log.to_record(Uuid::new_v4(), "alice", Utc::now());
        assert_eq!(record.max_risk_score, 90.0);
        assert_eq!(record.risk_level, "scam");
        assert_eq!(record.duration_secs, 5.0);
    }

    #[test]
    fn test_record_reduction() {
        let mut log = CallLog::new(10);

        let mut a = result_at(0, 0.5, 2.0, 30.0, RiskLevel::Safe);
        a.transcript = Transcript::new("hello there ", "en", 0.9);
        a.indicators = vec![Indicator::new(IndicatorKind::Pressure, "urgent")];
        a.spoof = SpoofVerdict::new(20.0, 40.0);

        let mut b = result_at(1, 3.0, 4.0, 65.0, RiskLevel::Suspicious);
        b.transcript = Transcript::new("necesita pagar", "es", 0.8);
        b.indicators = vec![
            Indicator::new(IndicatorKind::Pressure, "urgent"),
            Indicator::new(IndicatorKind::Pattern, "gift card"),
        ];
        b.spoof = SpoofVerdict::new(70.0, 85.0);
        b.spoofed = true;

        let mut c = result_at(2, 5.0, 6.0, 10.0, RiskLevel::Safe);
        c.transcript = Transcript::empty();
        c.spoof = SpoofVerdict::new(10.0, 95.0);

        log.push(a);
        log.push(b);
        log.push(c);

        let record = log.to_record(Uuid::nil(), "c1", Utc::now());
        assert_eq!(record.transcript, "hello there necesita pagar");
        assert_eq!(record.language.as_deref(), Some("es"));
        assert_eq!(
            record.indicators,
            vec!["pattern: gift card".to_string(), "pressure: urgent".to_string()]
        );
        assert!(record.voice_spoofing_detected);
        assert_eq!(record.spoofing_confidence, 85.0);
        assert_eq!(record.max_risk_score, 65.0);
        assert_eq!(record.risk_level, "suspicious");
        assert_eq!(record.duration_secs, 5.5);
    }

    #[test]
    fn test_transcript_keeps_most_recent_text() {
        let mut log = CallLog::new(4);
        let line = "a".repeat(999);
        let parts = MAX_TRANSCRIPT_CHARS / 1000 + 5;
        for i in 0..parts {
            let mut r = result_at(i as u64, i as f64, i as f64 + 0.5, 0.0, RiskLevel::Safe);
            r.transcript = Transcript::new(format!("{line}{}", i % 10), "en", 1.0);
            log.push(r);
        }

        let record = log.to_record(Uuid::nil(), "c1", Utc::now());
        assert!(record.transcript.chars().count() <= MAX_TRANSCRIPT_CHARS);
        assert!(record.transcript.ends_with(&format!("{line}{}", (parts - 1) % 10)));
        assert_eq!(log.total(), parts as u64);

        let mut r = result_at(99, 99.0, 100.0, 0.0, RiskLevel::Safe);
        r.transcript = Transcript::new("b".repeat(MAX_TRANSCRIPT_CHARS + 10), "en", 1.0);
        log.push(r);
        let record = log.to_record(Uuid::nil(), "c1", Utc::now());
        assert_eq!(record.transcript, "b".repeat(MAX_TRANSCRIPT_CHARS));
    }

    #[test]
    fn test_empty_record() {
        let log = CallLog::new(10);
        assert!(log.is_empty());
        let record = log.to_record(Uuid::nil(), "c1", Utc::now());
        assert_eq!(record.duration_secs, 0.0);
        assert_eq!(record.risk_level, "safe");
        assert!(record.transcript.is_empty());
        assert!(record.language.is_none());
    }
}
