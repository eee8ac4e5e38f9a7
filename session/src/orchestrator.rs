//! Per-span analysis.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sentinel_risk::{
    analyze_text, llm_score, RiskAssessment, RiskInputs, RiskScorer, RuleIntentClassifier, TextSignals,
};
use sentinel_speech::{
    AlertSynthesizer, IntentClassifier, ScamIntent, SpeechError, SpectralSpoofDetector, SpoofDetector,
    SpoofVerdict, TextAlertSynthesizer, TextRiskModel, Transcriber, Transcript,
};
use sentinel_voiceprint::SpeakerEmbedder;
use tracing::warn;

use crate::SessionId;

/// The pluggable capabilities a session pipeline calls.
///
/// Only the speaker embedder and the transcriber are required. The others
/// default to the deterministic built-ins: [`SpectralSpoofDetector`],
/// [`RuleIntentClassifier`], no ML text model, and [`TextAlertSynthesizer`].
#[derive(Clone)]
pub struct Capabilities {
    pub embedder: Arc<dyn SpeakerEmbedder>,
    pub transcriber: Arc<dyn Transcriber>,
    pub spoof_detector: Arc<dyn SpoofDetector>,
    pub classifier: Arc<dyn IntentClassifier>,
    pub text_model: Option<Arc<dyn TextRiskModel>>,
    pub synthesizer: Arc<dyn AlertSynthesizer>,
}

impl Capabilities {
    pub fn new(embedder: Arc<dyn SpeakerEmbedder>, transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            embedder,
            transcriber,
            spoof_detector: Arc::new(SpectralSpoofDetector::default()),
            classifier: Arc::new(RuleIntentClassifier::default()),
            text_model: None,
            synthesizer: Arc::new(TextAlertSynthesizer),
        }
    }

    pub fn with_spoof_detector(mut self, detector: Arc<dyn SpoofDetector>) -> Self {
        self.spoof_detector = detector;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_text_model(mut self, model: Arc<dyn TextRiskModel>) -> Self {
        self.text_model = Some(model);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn AlertSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("embedding_dimension", &self.embedder.dimension())
            .field("text_model", &self.text_model.is_some())
            .finish_non_exhaustive()
    }
}

/// Everything learned about one span, before speaker attribution and
/// alerting.
#[derive(Debug, Clone)]
pub struct SpanAnalysis {
    /// `None` when embedding failed; the span is then left unattributed.
    pub embedding: Option<Vec<f32>>,
    pub transcript: Transcript,
    pub spoof: SpoofVerdict,
    pub intent: ScamIntent,
    pub signals: TextSignals,
    pub inputs: RiskInputs,
    pub assessment: RiskAssessment,
}

/// Runs the per-span task graph.
///
/// ```text
///            ┌─ transcribe ─┐
/// samples ───┤              ├─> classify + ML score ─> signals ─> fuse
///            └─ spoof ──────┘
/// ```
///
/// Transcription and spoof detection run concurrently; classification waits
/// for both. Each capability call gets one attempt bounded by the task
/// timeout. A failure or timeout is logged and replaced by the capability's
/// degraded default, so a span always yields a complete analysis.
///
/// A span with an empty transcript skips classification and scores 0.
pub struct AnalysisOrchestrator {
    caps: Capabilities,
    scorer: RiskScorer,
    timeout: Duration,
}

impl AnalysisOrchestrator {
    pub fn new(caps: Capabilities, scorer: RiskScorer, timeout: Duration) -> Self {
        Self { caps, scorer, timeout }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    /// Analyzes one span of audio.
    pub async fn analyze(&self, session: SessionId, samples: &[f32], sample_rate: u32) -> SpanAnalysis {
        let embedding = match self.caps.embedder.extract(samples, sample_rate) {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(session = %session, capability = "embed", error = %e, "capability failed, span left unattributed");
                None
            }
        };

        let (transcript, spoof) = tokio::join!(
            self.bounded(session, "transcribe", self.caps.transcriber.transcribe(samples, sample_rate)),
            self.bounded(session, "detect_spoofing", self.caps.spoof_detector.detect(samples, sample_rate)),
        );
        let transcript = transcript.unwrap_or_else(|_| Transcript::empty());
        let spoof = spoof.unwrap_or_else(|_| SpoofVerdict::genuine());

        let (intent, ml) = if transcript.is_empty() {
            (ScamIntent::no_speech(), 0.0)
        } else {
            let text = transcript.text.as_str();
            let language = transcript.language.as_str();
            let classify = self.bounded(session, "classify", self.caps.classifier.classify(text, language));
            let ml = async {
                match &self.caps.text_model {
                    Some(model) => self
                        .bounded(session, "text_model", model.score(text, language))
                        .await
                        .map(|s| s.clamp(0.0, 100.0))
                        .unwrap_or(0.0),
                    None => 0.0,
                }
            };
            let (intent, ml) = tokio::join!(classify, ml);
            (intent.unwrap_or_else(|reason| ScamIntent::failed(reason)), ml)
        };

        // A span without words is safe: its spoof verdict is kept for the
        // record but not fused.
        let spoofing = if transcript.is_empty() { 0.0 } else { spoof.score };
        let signals = analyze_text(&transcript.text, &transcript.language);
        let inputs = RiskInputs::from_signals(&signals, ml, llm_score(intent.label), spoofing);
        let assessment = self.scorer.fuse(&inputs);

        SpanAnalysis {
            embedding,
            transcript,
            spoof,
            intent,
            signals,
            inputs,
            assessment,
        }
    }

    /// Awaits one capability call with the task timeout. The error is the
    /// reason the degraded default is used.
    async fn bounded<T>(
        &self,
        session: SessionId,
        capability: &'static str,
        call: impl Future<Output = Result<T, SpeechError>>,
    ) -> Result<T, String> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(session = %session, capability, error = %e, "capability failed, using degraded default");
                Err(e.to_string())
            }
            Err(_) => {
                warn!(session = %session, capability, timeout_ms = self.timeout.as_millis() as u64, "capability timed out, using degraded default");
                Err(format!("{capability} timed out"))
            }
        }
    }
}

impl std::fmt::Debug for AnalysisOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisOrchestrator")
            .field("caps", &self.caps)
            .field("timeout", &self.timeout)
            .finish()
    }
}
