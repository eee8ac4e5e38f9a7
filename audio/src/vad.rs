//! Frame-based voice activity detection.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Configures the [`SpeechSegmenter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    /// Frame length in milliseconds (default: 20).
    pub frame_ms: u32,
    /// Hop between frame starts in milliseconds (default: 10).
    pub hop_ms: u32,
    /// A frame is active when its score exceeds this value (default: 0.01).
    pub threshold: f32,
    /// Shortest span worth emitting, in seconds (default: 0.25).
    pub min_speech_secs: f64,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            frame_ms: 20,
            hop_ms: 10,
            threshold: 0.01,
            min_speech_secs: 0.25,
        }
    }
}

/// Scores one frame of audio for speech activity.
///
/// The default is [`EnergyScorer`]. An external probabilistic VAD can be
/// plugged in by implementing this trait; its scores are compared against
/// [`VadConfig::threshold`] the same way.
pub trait FrameScorer: Send + Sync {
    fn score(&self, frame: &[f32], sample_rate: u32) -> f32;

    /// Reports whether the scorer loaded successfully.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Mean-square frame energy.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyScorer;

impl FrameScorer for EnergyScorer {
    fn score(&self, frame: &[f32], _sample_rate: u32) -> f32 {
        if frame.is_empty() {
            return 0.0;
        }
        let sum: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum / frame.len() as f64) as f32
    }
}

/// A speech span as sample offsets into the analysed window, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechSegment {
    pub start: usize,
    pub end: usize,
}

impl SpeechSegment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn duration_secs(&self, sample_rate: u32) -> f64 {
        self.len() as f64 / sample_rate as f64
    }
}

/// Result of scanning one window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scan {
    /// Spans that met the minimum duration, in order.
    pub segments: Vec<SpeechSegment>,
    /// Offset where a follow-up scan should begin. Points at the start of a
    /// trailing active run that is still too short to emit, otherwise at the
    /// first frame that did not fit in the window.
    pub resume_at: usize,
}

/// Splits audio into speech spans.
///
/// Frames of `frame_ms` are evaluated every `hop_ms`; consecutive active
/// frames form a span covering the first active frame's start to the last
/// active frame's end. Spans shorter than `min_speech_secs` are discarded.
/// A span still active at the end of the window is emitted as soon as it
/// meets the minimum.
///
/// Output depends only on the input samples and configuration.
#[derive(Clone)]
pub struct SpeechSegmenter {
    config: VadConfig,
    scorer: Arc<dyn FrameScorer>,
}

impl std::fmt::Debug for SpeechSegmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechSegmenter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SpeechSegmenter {
    /// Creates a segmenter using frame energy.
    pub fn new(config: VadConfig) -> Self {
        Self::with_scorer(config, Arc::new(EnergyScorer))
    }

    /// Creates a segmenter with a custom frame scorer.
    pub fn with_scorer(config: VadConfig, scorer: Arc<dyn FrameScorer>) -> Self {
        Self { config, scorer }
    }

    pub fn config(&self) -> &VadConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.scorer.is_ready()
    }

    /// Returns the speech spans in `samples`.
    pub fn detect(&self, samples: &[f32], sample_rate: u32) -> Vec<SpeechSegment> {
        self.scan(samples, sample_rate).segments
    }

    /// Returns the speech spans in `samples` along with the resume offset.
    pub fn scan(&self, samples: &[f32], sample_rate: u32) -> Scan {
        let frame = (sample_rate as usize * self.config.frame_ms as usize) / 1000;
        let hop = ((sample_rate as usize * self.config.hop_ms as usize) / 1000).max(1);
        if frame == 0 {
            return Scan::default();
        }
        let min_len = (self.config.min_speech_secs.max(0.0) * sample_rate as f64).ceil() as usize;

        let mut segments = Vec::new();
        let mut start: Option<usize> = None;
        let mut last_end = 0;
        let mut i = 0;

        while i + frame <= samples.len() {
            let active = self.scorer.score(&samples[i..i + frame], sample_rate) > self.config.threshold;
            match (active, start) {
                (true, None) => {
                    start = Some(i);
                    last_end = i + frame;
                }
                (true, Some(_)) => last_end = i + frame,
                (false, Some(s)) => {
                    if last_end - s >= min_len {
                        segments.push(SpeechSegment { start: s, end: last_end });
                    }
                    start = None;
                }
                (false, None) => {}
            }
            i += hop;
        }

        let mut resume_at = i;
        if let Some(s) = start {
            if last_end - s >= min_len {
                segments.push(SpeechSegment { start: s, end: last_end });
            } else {
                resume_at = s;
            }
        }

        Scan { segments, resume_at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16000;

    fn silence(secs: f32) -> Vec<f32> {
        vec![0.0; (secs * RATE as f32) as usize]
    }

    fn tone(secs: f32, amp: f32) -> Vec<f32> {
        let n = (secs * RATE as f32) as usize;
        (0..n)
            .map(|i| amp * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / RATE as f32).sin())
            .collect()
    }

    #[test]
    fn test_config_default() {
        let cfg = VadConfig::default();
        assert_eq!(cfg.frame_ms, 20);
        assert_eq!(cfg.hop_ms, 10);
        assert_eq!(cfg.threshold, 0.01);
        assert_eq!(cfg.min_speech_secs, 0.25);
    }

    #[test]
    fn test_config_partial_deserialize() {
        let cfg: VadConfig = serde_json::from_str(r#"{"threshold": 0.05}"#).unwrap();
        assert_eq!(cfg.threshold, 0.05);
        assert_eq!(cfg.frame_ms, 20);
    }

    #[test]
    fn test_quiet_window_has_no_spans() {
        let seg = SpeechSegmenter::new(VadConfig::default());
        // Amplitude 0.1 sine has mean-square energy 0.005, below 0.01.
        let mut audio = silence(0.5);
        audio.extend(tone(1.0, 0.1));
        audio.extend(silence(0.5));
        assert!(seg.detect(&audio, RATE).is_empty());
        assert!(seg.detect(&[], RATE).is_empty());
        assert!(seg.detect(&silence(2.0), RATE).is_empty());
    }

    #[test]
    fn test_single_span() {
        let seg = SpeechSegmenter::new(VadConfig::default());
        let mut audio = silence(0.5);
        audio.extend(tone(1.0, 0.5));
        audio.extend(silence(0.5));

        let spans = seg.detect(&audio, RATE);
        assert_eq!(spans.len(), 1);
        let span = spans[0];
        let dur = span.duration_secs(RATE);
        assert!((dur - 1.0).abs() < 0.05, "duration = {dur}");
        assert!((span.start as i64 - 8000).abs() <= 320, "start = {}", span.start);
    }

    #[test]
    fn test_short_burst_rejected() {
        let seg = SpeechSegmenter::new(VadConfig::default());
        let mut audio = silence(0.5);
        audio.extend(tone(0.1, 0.5));
        audio.extend(silence(0.5));
        assert!(seg.detect(&audio, RATE).is_empty());
    }

    #[test]
    fn test_spans_ordered_and_disjoint() {
        let seg = SpeechSegmenter::new(VadConfig::default());
        let mut audio = silence(0.3);
        audio.extend(tone(0.5, 0.5));
        audio.extend(silence(0.4));
        audio.extend(tone(0.6, 0.5));
        audio.extend(silence(0.3));

        let spans = seg.detect(&audio, RATE);
        assert_eq!(spans.len(), 2);
        assert!(spans[0].end <= spans[1].start);
    }

    #[test]
    fn test_trailing_span_emitted_without_silence() {
        let seg = SpeechSegmenter::new(VadConfig::default());
        let mut audio = silence(0.5);
        audio.extend(tone(0.5, 0.5));

        let scan = seg.scan(&audio, RATE);
        assert_eq!(scan.segments.len(), 1);
        assert_eq!(scan.segments[0].end, audio.len());
    }

    #[test]
    fn test_trailing_short_run_sets_resume() {
        let seg = SpeechSegmenter::new(VadConfig::default());
        let mut audio = silence(0.5);
        audio.extend(tone(0.1, 0.5));

        let scan = seg.scan(&audio, RATE);
        assert!(scan.segments.is_empty());
        assert!(scan.resume_at >= 7840 && scan.resume_at <= 8000, "resume_at = {}", scan.resume_at);
    }

    #[test]
    fn test_resume_without_speech_is_next_frame() {
        let seg = SpeechSegmenter::new(VadConfig::default());
        // 1000 samples: frames start at 0, 160, ..., 640; next would be 800.
        let scan = seg.scan(&vec![0.0; 1000], RATE);
        assert_eq!(scan.resume_at, 800);
    }

    #[test]
    fn test_deterministic() {
        let seg = SpeechSegmenter::new(VadConfig::default());
        let mut audio = silence(0.2);
        audio.extend(tone(0.7, 0.4));
        audio.extend(silence(0.2));
        assert_eq!(seg.detect(&audio, RATE), seg.detect(&audio, RATE));
    }

    struct AlwaysActive;

    impl FrameScorer for AlwaysActive {
        fn score(&self, _frame: &[f32], _sample_rate: u32) -> f32 {
            1.0
        }
    }

    #[test]
    fn test_custom_scorer() {
        let seg = SpeechSegmenter::with_scorer(VadConfig::default(), Arc::new(AlwaysActive));
        let spans = seg.detect(&silence(1.0), RATE);
        assert_eq!(spans, vec![SpeechSegment { start: 0, end: 16000 }]);
    }
}
