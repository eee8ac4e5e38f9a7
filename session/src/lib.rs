//! Streaming call-risk sessions.
//!
//! A session turns a live stream of PCM chunks into per-span
//! [`AnalysisResult`]s, alert audio, and an end-of-call
//! [`IncidentReport`]:
//!
//! ```text
//! push_chunk ─> AudioBuffer ─> SpeechSegmenter ─> span ─┬─> SpeakerClusterer
//!                                                       ├─> AnalysisOrchestrator ─> RiskScorer
//!                                                       └─> AlertPolicy ─> alert audio
//! ```
//!
//! [`SessionManager`] owns the sessions and their lifecycle
//! ([`SessionState`]); [`AnalysisOrchestrator`] runs the per-span task
//! graph over pluggable [`Capabilities`]; [`summarize`] builds reports.

mod config;
mod error;
mod manager;
mod orchestrator;
mod record;
mod report;
mod session;
mod state;
mod types;

pub use config::PipelineConfig;
pub use error::SessionError;
pub use manager::{ClosedSession, SessionManager, DEFAULT_HISTORY_LIMIT};
pub use orchestrator::{AnalysisOrchestrator, Capabilities, SpanAnalysis};
pub use report::{summarize, IncidentReport};
pub use state::SessionState;
pub use types::{AlertAudio, AnalysisResult, SessionEvent, SessionHandle, SessionId};
