//! Persistence collaborator for the call-risk pipeline.
//!
//! Two record families are stored:
//!
//! - [`Voiceprint`]: named reference embeddings forming the cross-session
//!   safe-list, keyed by name.
//! - [`CallRecord`]: the flat summary handed over when a session closes,
//!   queried per client with [`CallRecordStore::history`].
//!
//! [`MemoryStore`] serves tests and ephemeral runs; [`RedbStore`] persists
//! to a single redb file.

pub mod memory;
pub mod redb;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store: storage error: {0}")]
    Storage(String),

    #[error("store: serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A named reference embedding on the safe-list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voiceprint {
    pub name: String,
    pub embedding: Vec<f32>,
    pub enrolled_at: DateTime<Utc>,
}

/// Summary of one monitored call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: Uuid,
    pub client_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub max_risk_score: f64,
    pub risk_level: String,
    pub transcript: String,
    /// Union of indicator labels seen during the call, e.g. `"pressure: urgent"`.
    pub indicators: Vec<String>,
    pub voice_spoofing_detected: bool,
    pub spoofing_confidence: f64,
    pub language: Option<String>,
}

/// Storage for the voiceprint safe-list.
pub trait VoiceprintStore: Send + Sync {
    /// Inserts or replaces the voiceprint with the same name.
    fn put_voiceprint(&self, voiceprint: &Voiceprint) -> StoreResult<()>;

    /// Returns all voiceprints ordered by name.
    fn voiceprints(&self) -> StoreResult<Vec<Voiceprint>>;

    /// Removes a voiceprint. Returns whether it existed.
    fn delete_voiceprint(&self, name: &str) -> StoreResult<bool>;
}

/// Storage for call records.
pub trait CallRecordStore: Send + Sync {
    fn put_record(&self, record: &CallRecord) -> StoreResult<()>;

    /// Returns up to `limit` records for `client_id`, newest first.
    fn history(&self, client_id: &str, limit: usize) -> StoreResult<Vec<CallRecord>>;
}

/// A store holding both record families.
pub trait Store: VoiceprintStore + CallRecordStore {}

impl<T: VoiceprintStore + CallRecordStore> Store for T {}

impl fmt::Debug for dyn Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Store {{ ... }}")
    }
}

/// Orders records newest first and applies the limit.
fn newest_first(mut records: Vec<CallRecord>, limit: usize) -> Vec<CallRecord> {
    records.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
    records.truncate(limit);
    records
}

pub use self::memory::MemoryStore;
pub use self::redb::RedbStore;
