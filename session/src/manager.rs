//! Session registry and lifecycle.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use sentinel_audio::{decode_pcm16, SpeechSegmenter};
use sentinel_risk::{AlertGate, AlertPolicy, RiskScorer};
use sentinel_speech::CachedTranscriber;
use sentinel_store::{CallRecord, CallRecordStore};
use sentinel_voiceprint::{SpeakerClusterer, VoiceVerifier};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::report::{summarize, IncidentReport};
use crate::session::{DrainRequest, Session, Worker};
use crate::{
    AnalysisOrchestrator, AnalysisResult, Capabilities, PipelineConfig, SessionError, SessionHandle, SessionId,
    SessionState,
};

/// Default number of records returned by [`SessionManager::history`].
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

const DRAIN_QUEUE: usize = 4;

/// What [`SessionManager::close`] returns.
#[derive(Debug, Clone)]
pub struct ClosedSession {
    /// The record handed to the call record store.
    pub record: CallRecord,
    pub report: IncidentReport,
}

struct SessionEntry {
    session: Arc<Session>,
    drains: mpsc::Sender<DrainRequest>,
    worker: JoinHandle<()>,
}

/// Owns every open session.
///
/// Each session gets its own bounded audio buffer, speaker registry and
/// worker task; sessions share nothing mutable except the voiceprint
/// safe-list. Sessions are reached only through this registry, keyed by id.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use sentinel_session::{Capabilities, PipelineConfig, SessionHandle, SessionManager};
/// use sentinel_speech::ScriptedTranscriber;
/// use sentinel_store::MemoryStore;
/// use sentinel_voiceprint::FbankEmbedder;
///
/// # async fn run(pcm: Vec<u8>) -> Result<(), sentinel_session::SessionError> {
/// let caps = Capabilities::new(
///     Arc::new(FbankEmbedder::default()),
///     Arc::new(ScriptedTranscriber::from_lines("hello", "en")),
/// );
/// let manager = SessionManager::new(PipelineConfig::default(), caps, Arc::new(MemoryStore::new()));
///
/// let SessionHandle { id, mut results, .. } = manager.open("client-1")?;
/// let printer = tokio::spawn(async move {
///     while let Some(event) = results.recv().await {
///         println!("{event:?}");
///     }
/// });
///
/// manager.push_chunk(id, &pcm)?;
/// manager.flush(id).await?;
/// let closed = manager.close(id).await?;
/// let _ = printer.await;
/// println!("{}", closed.report.summary);
/// # Ok(())
/// # }
/// ```
pub struct SessionManager {
    config: PipelineConfig,
    orchestrator: Arc<AnalysisOrchestrator>,
    segmenter: SpeechSegmenter,
    verifier: Option<Arc<VoiceVerifier>>,
    records: Arc<dyn CallRecordStore>,
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
}

impl SessionManager {
    /// Creates a manager. The transcriber is wrapped in a shared
    /// [`CachedTranscriber`] unless `transcript_cache_size` is 0.
    pub fn new(config: PipelineConfig, mut caps: Capabilities, records: Arc<dyn CallRecordStore>) -> Self {
        if config.transcript_cache_size > 0 {
            caps.transcriber = Arc::new(CachedTranscriber::new(caps.transcriber, config.transcript_cache_size));
        }
        let orchestrator = AnalysisOrchestrator::new(caps, RiskScorer::new(config.scoring.clone()), config.task_timeout());
        Self {
            segmenter: SpeechSegmenter::new(config.vad.clone()),
            orchestrator: Arc::new(orchestrator),
            verifier: None,
            records,
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Matches every span against this safe-list.
    pub fn with_verifier(mut self, verifier: Arc<VoiceVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Replaces the energy VAD, e.g. with one backed by an external
    /// [`FrameScorer`](sentinel_audio::FrameScorer).
    pub fn with_segmenter(mut self, segmenter: SpeechSegmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn verifier(&self) -> Option<&Arc<VoiceVerifier>> {
        self.verifier.as_ref()
    }

    /// Number of open sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Opens a session for `client_id` and starts its worker.
    ///
    /// Must be called within a Tokio runtime. Fails with
    /// [`SessionError::Unavailable`] when the embedder or VAD is not ready.
    pub fn open(&self, client_id: &str) -> Result<SessionHandle, SessionError> {
        if !self.orchestrator.capabilities().embedder.is_ready() {
            return Err(SessionError::Unavailable("speaker embedder not ready".to_string()));
        }
        if !self.segmenter.is_ready() {
            return Err(SessionError::Unavailable("voice activity detector not ready".to_string()));
        }

        let mut sessions = self.sessions.write();
        if sessions.len() >= self.config.max_sessions {
            return Err(SessionError::TooManySessions {
                limit: self.config.max_sessions,
            });
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Session::new(id, client_id, &self.config));
        let (results_tx, results_rx) = mpsc::channel(self.config.result_channel_size.max(1));
        let (alerts_tx, alerts_rx) = mpsc::channel(self.config.alert_channel_size.max(1));
        let (drain_tx, drain_rx) = mpsc::channel(DRAIN_QUEUE);

        let worker = Worker {
            session: session.clone(),
            orchestrator: self.orchestrator.clone(),
            segmenter: self.segmenter.clone(),
            verifier: self.verifier.clone(),
            policy: AlertPolicy::new(self.config.alert.clone()),
            clusterer: SpeakerClusterer::new(self.config.clustering.clone()),
            gate: AlertGate::new(),
            results: results_tx,
            alerts: alerts_tx,
            drains: drain_rx,
            window: self.config.window_samples().max(1),
            max_latency: self.config.max_latency(),
            task_timeout: self.config.task_timeout(),
            cursor: 0,
            next_segment: 0,
        };
        let worker = tokio::spawn(worker.run());

        sessions.insert(
            id,
            SessionEntry {
                session,
                drains: drain_tx,
                worker,
            },
        );
        info!(session = %id, client = %client_id, "session opened");

        Ok(SessionHandle {
            id,
            results: results_rx,
            alerts: alerts_rx,
        })
    }

    fn session(&self, id: SessionId) -> Result<Arc<Session>, SessionError> {
        self.sessions
            .read()
            .get(&id)
            .map(|e| e.session.clone())
            .ok_or(SessionError::NotFound(id))
    }

    /// Admits a chunk of 16-bit little-endian mono PCM.
    ///
    /// Never waits for analysis. Empty or undecodable chunks are ignored.
    pub fn push_chunk(&self, id: SessionId, pcm: &[u8]) -> Result<(), SessionError> {
        self.push_samples(id, &decode_pcm16(pcm))
    }

    /// Admits already decoded samples at the configured sample rate.
    pub fn push_samples(&self, id: SessionId, samples: &[f32]) -> Result<(), SessionError> {
        self.session(id)?.ingest(samples)
    }

    /// Analyzes everything buffered so far, including a trailing span that
    /// has not reached the minimum duration, and waits until done.
    ///
    /// Completion includes delivery: each result is sent on the bounded
    /// results channel before the next span is analyzed. Keep receiving
    /// from [`SessionHandle::results`] while awaiting this when a flush may
    /// produce more results than `result_channel_size`.
    pub async fn flush(&self, id: SessionId) -> Result<(), SessionError> {
        self.drain(id, true).await
    }

    /// Analyzes pending audio the way a regular pass does and waits until
    /// done. A trailing span still shorter than the minimum is kept for the
    /// next pass, so speech is not cut at the call boundary.
    ///
    /// Feeding recorded audio faster than real time, call this between
    /// chunks so nothing is evicted before it is analyzed. Delivery works
    /// as for [`flush`](Self::flush).
    pub async fn catch_up(&self, id: SessionId) -> Result<(), SessionError> {
        self.drain(id, false).await
    }

    async fn drain(&self, id: SessionId, flush: bool) -> Result<(), SessionError> {
        let drains = self
            .sessions
            .read()
            .get(&id)
            .map(|e| e.drains.clone())
            .ok_or(SessionError::NotFound(id))?;
        let (done, done_rx) = oneshot::channel();
        drains
            .send(DrainRequest { flush, done })
            .await
            .map_err(|_| SessionError::Closed)?;
        done_rx.await.map_err(|_| SessionError::Closed)
    }

    pub fn state(&self, id: SessionId) -> Result<SessionState, SessionError> {
        Ok(self.session(id)?.state())
    }

    /// Retained results of a session, oldest first.
    pub fn results(&self, id: SessionId) -> Result<Vec<AnalysisResult>, SessionError> {
        Ok(self.session(id)?.results())
    }

    /// Builds the current incident report.
    pub fn report(&self, id: SessionId) -> Result<IncidentReport, SessionError> {
        self.session(id)?.report().ok_or(SessionError::NoData(id))
    }

    /// Closes a session: cancels in-flight work, persists the call record
    /// and releases the session.
    pub async fn close(&self, id: SessionId) -> Result<ClosedSession, SessionError> {
        let entry = self
            .sessions
            .write()
            .remove(&id)
            .ok_or(SessionError::NotFound(id))?;
        let SessionEntry { session, worker, .. } = entry;

        session.transition(SessionState::Closing)?;
        session.cancel.cancel();
        if let Err(e) = worker.await {
            if e.is_panic() {
                error!(session = %id, "session worker panicked");
            }
        }
        session.tracker.close();
        session.tracker.wait().await;
        session.transition(SessionState::Closed)?;
        session.buffer.clear();

        let record = session.to_record();
        let report = summarize(&session.results());
        self.records.put_record(&record)?;
        info!(
            session = %id,
            client = %record.client_id,
            max_score = record.max_risk_score,
            level = %record.risk_level,
            "session closed"
        );

        Ok(ClosedSession { record, report })
    }

    /// Closes every open session. Failures are logged and skipped.
    pub async fn close_all(&self) -> Vec<ClosedSession> {
        let ids: Vec<SessionId> = self.sessions.read().keys().copied().collect();
        let mut closed = Vec::with_capacity(ids.len());
        for id in ids {
            match self.close(id).await {
                Ok(c) => closed.push(c),
                Err(e) => error!(session = %id, error = %e, "failed to close session"),
            }
        }
        closed
    }

    /// Persisted call records of `client_id`, newest first.
    pub fn history(&self, client_id: &str, limit: usize) -> Result<Vec<CallRecord>, SessionError> {
        Ok(self.records.history(client_id, limit)?)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("sessions", &self.session_count())
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}
