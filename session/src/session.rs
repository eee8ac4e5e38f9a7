//! Per-session state and the analysis worker.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sentinel_audio::{AudioBuffer, SpeechSegmenter};
use sentinel_risk::{AlertDecision, AlertGate, AlertInput, AlertPolicy, Indicator, IndicatorKind, MAX_INDICATORS};
use sentinel_store::CallRecord;
use sentinel_voiceprint::{SpeakerClusterer, VoiceVerifier};
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::record::CallLog;
use crate::report::{summarize, IncidentReport};
use crate::{
    AlertAudio, AnalysisOrchestrator, AnalysisResult, PipelineConfig, SessionError, SessionEvent, SessionId,
    SessionState, SpanAnalysis,
};

/// State shared between the manager and a session's worker.
pub(crate) struct Session {
    pub id: SessionId,
    pub client_id: String,
    pub started_at: DateTime<Utc>,
    pub buffer: AudioBuffer,
    /// Wakes the worker after an append.
    pub notify: Notify,
    pub cancel: CancellationToken,
    /// Spawned span and alert tasks.
    pub tracker: TaskTracker,
    state: Mutex<SessionState>,
    log: Mutex<CallLog>,
}

impl Session {
    pub fn new(id: SessionId, client_id: &str, config: &PipelineConfig) -> Self {
        Self {
            id,
            client_id: client_id.to_string(),
            started_at: Utc::now(),
            buffer: AudioBuffer::new(config.sample_rate, config.max_buffer_secs),
            notify: Notify::new(),
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            state: Mutex::new(SessionState::Idle),
            log: Mutex::new(CallLog::new(config.max_results)),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn transition(&self, to: SessionState) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        if !state.can_transition(to) {
            return Err(SessionError::InvalidState { from: *state, to });
        }
        info!(session = %self.id, from = %*state, to = %to, "session state changed");
        *state = to;
        Ok(())
    }

    /// Appends decoded audio, moving Idle to Active on the first samples.
    pub fn ingest(&self, samples: &[f32]) -> Result<(), SessionError> {
        if samples.is_empty() {
            return Ok(());
        }
        {
            let mut state = self.state.lock();
            match *state {
                SessionState::Idle => {
                    info!(session = %self.id, from = %*state, to = %SessionState::Active, "session state changed");
                    *state = SessionState::Active;
                }
                SessionState::Active => {}
                SessionState::Closing | SessionState::Closed => return Err(SessionError::Closed),
            }
        }
        self.buffer.append(samples);
        self.notify.notify_one();
        Ok(())
    }

    pub fn push_result(&self, result: AnalysisResult) {
        self.log.lock().push(result);
    }

    pub fn results(&self) -> Vec<AnalysisResult> {
        self.log.lock().results()
    }

    /// Current report, or `None` before the first result.
    pub fn report(&self) -> Option<IncidentReport> {
        let log = self.log.lock();
        if log.is_empty() {
            return None;
        }
        Some(summarize(&log.results()))
    }

    pub fn to_record(&self) -> CallRecord {
        self.log.lock().to_record(self.id, &self.client_id, self.started_at)
    }
}

/// Asks the worker to analyze everything pending and report back.
pub(crate) struct DrainRequest {
    /// Also consume a trailing run shorter than the minimum speech duration.
    pub flush: bool,
    pub done: oneshot::Sender<()>,
}

/// Drains one session's buffer and analyzes its speech spans in order.
///
/// The worker exclusively owns the speaker registry and the alert gate.
/// It consumes audio by absolute sample index, so every sample is scanned
/// once even when the buffer has evicted audio in between.
pub(crate) struct Worker {
    pub session: Arc<Session>,
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub segmenter: SpeechSegmenter,
    pub verifier: Option<Arc<VoiceVerifier>>,
    pub policy: AlertPolicy,
    pub clusterer: SpeakerClusterer,
    pub gate: AlertGate,
    pub results: mpsc::Sender<SessionEvent>,
    pub alerts: mpsc::Sender<AlertAudio>,
    pub drains: mpsc::Receiver<DrainRequest>,
    pub window: u64,
    pub max_latency: Duration,
    pub task_timeout: Duration,
    pub cursor: u64,
    pub next_segment: u64,
}

impl Worker {
    pub async fn run(mut self) {
        let cancel = self.session.cancel.clone();
        let mut tick = tokio::time::interval(self.max_latency);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tick.tick().await;

        loop {
            let running = tokio::select! {
                _ = cancel.cancelled() => false,
                request = self.drains.recv() => match request {
                    Some(request) => {
                        let running = self.process(request.flush).await;
                        let _ = request.done.send(());
                        running
                    }
                    None => false,
                },
                _ = self.session.notify.notified() => {
                    if self.pending() >= self.window {
                        self.process(false).await
                    } else {
                        true
                    }
                }
                _ = tick.tick() => {
                    if self.pending() > 0 {
                        self.process(false).await
                    } else {
                        true
                    }
                }
            };
            if !running {
                break;
            }
        }
        debug!(session = %self.session.id, "session worker stopped");
    }

    fn pending(&self) -> u64 {
        self.session.buffer.total_written().saturating_sub(self.cursor)
    }

    /// Scans everything after the cursor. Returns false once cancelled.
    ///
    /// A trailing active run too short to emit is left for the next pass,
    /// unless `flush` is set.
    async fn process(&mut self, flush: bool) -> bool {
        let snapshot = self.session.buffer.since(self.cursor);
        if snapshot.start > self.cursor {
            warn!(
                session = %self.session.id,
                dropped_samples = snapshot.start - self.cursor,
                "analysis fell behind, evicted audio skipped"
            );
        }
        if snapshot.samples.is_empty() {
            self.cursor = snapshot.start;
            return true;
        }

        let rate = self.session.buffer.sample_rate();
        let scan = self.segmenter.scan(&snapshot.samples, rate);
        self.cursor = if flush {
            snapshot.end()
        } else {
            snapshot.start + scan.resume_at as u64
        };

        for span in scan.segments {
            let samples = snapshot.samples[span.start..span.end].to_vec();
            let start = snapshot.start + span.start as u64;
            let end = snapshot.start + span.end as u64;
            if !self.analyze_span(samples, start, end).await {
                return false;
            }
        }

        if self.pending() >= self.window {
            self.session.notify.notify_one();
        }
        true
    }

    async fn analyze_span(&mut self, samples: Vec<f32>, start: u64, end: u64) -> bool {
        let segment = self.next_segment;
        self.next_segment += 1;

        let id = self.session.id;
        let rate = self.session.buffer.sample_rate();
        let orchestrator = self.orchestrator.clone();
        let mut task = self
            .session
            .tracker
            .spawn(async move { orchestrator.analyze(id, &samples, rate).await });

        let cancel = self.session.cancel.clone();
        let joined = tokio::select! {
            _ = cancel.cancelled() => {
                task.abort();
                return false;
            }
            joined = &mut task => joined,
        };

        let analysis = match joined {
            Ok(analysis) => analysis,
            Err(e) if e.is_panic() => {
                error!(session = %id, segment, "span analysis panicked");
                return self
                    .emit(SessionEvent::Error {
                        message: format!("analysis of segment {segment} failed unexpectedly"),
                    })
                    .await;
            }
            Err(_) => return false,
        };

        let start_secs = start as f64 / rate as f64;
        let end_secs = end as f64 / rate as f64;
        let (result, alert) = self.attribute(segment, start_secs, end_secs, analysis);
        debug!(
            session = %id,
            segment,
            speaker = ?result.speaker,
            score = result.score,
            level = %result.level,
            "span analyzed"
        );

        self.session.push_result(result.clone());
        if let Some(decision) = alert {
            self.spawn_alert(segment, decision);
        }
        self.emit(SessionEvent::Result(result)).await
    }

    /// Attributes the span to a speaker, checks the safe-list and applies
    /// the alert policy.
    fn attribute(
        &mut self,
        segment: u64,
        start_secs: f64,
        end_secs: f64,
        analysis: SpanAnalysis,
    ) -> (AnalysisResult, Option<AlertDecision>) {
        let SpanAnalysis {
            embedding,
            transcript,
            spoof,
            intent,
            signals,
            inputs,
            assessment,
        } = analysis;

        let mut speaker = None;
        let mut safe_matches = Vec::new();
        if let Some(embedding) = &embedding {
            match self.clusterer.assign(embedding, start_secs) {
                Ok(assignment) => {
                    if assignment.is_new {
                        debug!(session = %self.session.id, speaker = assignment.speaker, "new speaker");
                    }
                    speaker = Some(assignment.speaker);
                }
                Err(e) => warn!(session = %self.session.id, error = %e, "speaker assignment failed"),
            }
            if let Some(verifier) = &self.verifier {
                safe_matches = verifier.verify_embedding(embedding);
            }
        }

        let speech = !transcript.is_empty();
        let spoofed = speech && spoof.is_spoofed();
        let mut indicators = signals.indicators.clone();
        if spoofed {
            indicators.push(Indicator::new(
                IndicatorKind::Spoofing,
                format!("synthetic voice ({:.0}% confidence)", spoof.confidence),
            ));
            indicators.sort_by_key(|i| i.kind);
            indicators.truncate(MAX_INDICATORS);
        }

        let decision = if speech {
            self.policy.evaluate(&AlertInput {
                score: assessment.score,
                pattern_hits: signals.pattern_hits,
                pressure_hits: signals.pressure_hits,
                personal_hits: signals.personal_hits,
                spoofed,
                spoof_confidence: spoof.confidence,
                language: &transcript.language,
            })
        } else {
            None
        };
        let cooldown = self.policy.config().cooldown_secs;
        let alert = decision.filter(|d| self.gate.admit(d.category, start_secs, cooldown));

        let result = AnalysisResult {
            session: self.session.id,
            segment,
            speaker,
            start_secs,
            end_secs,
            transcript,
            spoof,
            spoofed,
            intent,
            inputs,
            score: assessment.score,
            level: assessment.level,
            indicators,
            alert_triggered: alert.is_some(),
            alert_category: alert.as_ref().map(|d| d.category),
            safe_matches,
        };
        (result, alert)
    }

    /// Sends on the result channel. Returns false once cancelled.
    async fn emit(&self, event: SessionEvent) -> bool {
        tokio::select! {
            _ = self.session.cancel.cancelled() => false,
            sent = self.results.send(event) => {
                if sent.is_err() {
                    debug!(session = %self.session.id, "result receiver dropped");
                }
                true
            }
        }
    }

    /// Synthesizes alert audio off the result path. Delivery is best effort.
    fn spawn_alert(&self, segment: u64, decision: AlertDecision) {
        let session = self.session.id;
        let synthesizer = self.orchestrator.capabilities().synthesizer.clone();
        let alerts = self.alerts.clone();
        let cancel = self.session.cancel.clone();
        let timeout = self.task_timeout;

        self.session.tracker.spawn(async move {
            let synth = tokio::time::timeout(timeout, synthesizer.synthesize(decision.message, &decision.language));
            // A finished synthesis still goes out when the session is closing.
            let outcome = tokio::select! {
                biased;
                outcome = synth => outcome,
                _ = cancel.cancelled() => return,
            };
            let (audio, degraded) = match outcome {
                Ok(Ok(Some(audio))) if !audio.is_empty() => (audio, false),
                Ok(Ok(_)) => {
                    debug!(session = %session, "synthesizer returned no audio, sending text alert");
                    (decision.message.as_bytes().to_vec(), true)
                }
                Ok(Err(e)) => {
                    warn!(session = %session, capability = "synthesize", error = %e, "capability failed, sending text alert");
                    (decision.message.as_bytes().to_vec(), true)
                }
                Err(_) => {
                    warn!(session = %session, capability = "synthesize", "capability timed out, sending text alert");
                    (decision.message.as_bytes().to_vec(), true)
                }
            };

            let alert = AlertAudio {
                session,
                segment,
                category: decision.category,
                language: decision.language,
                message: decision.message.to_string(),
                audio,
                degraded,
            };
            if let Err(e) = alerts.try_send(alert) {
                warn!(session = %session, error = %e, "alert dropped");
            }
        });
    }
}
