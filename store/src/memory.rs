//! In-memory store implementation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::{
    newest_first, CallRecord, CallRecordStore, StoreError, StoreResult, Voiceprint, VoiceprintStore,
};

/// A store kept entirely in memory. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    voiceprints: Arc<Mutex<BTreeMap<String, Voiceprint>>>,
    records: Arc<Mutex<Vec<CallRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VoiceprintStore for MemoryStore {
    fn put_voiceprint(&self, voiceprint: &Voiceprint) -> StoreResult<()> {
        let mut data = self
            .voiceprints
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        data.insert(voiceprint.name.clone(), voiceprint.clone());
        Ok(())
    }

    fn voiceprints(&self) -> StoreResult<Vec<Voiceprint>> {
        let data = self
            .voiceprints
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(data.values().cloned().collect())
    }

    fn delete_voiceprint(&self, name: &str) -> StoreResult<bool> {
        let mut data = self
            .voiceprints
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(data.remove(name).is_some())
    }
}

impl CallRecordStore for MemoryStore {
    fn put_record(&self, record: &CallRecord) -> StoreResult<()> {
        let mut data = self
            .records
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        data.push(record.clone());
        Ok(())
    }

    fn history(&self, client_id: &str, limit: usize) -> StoreResult<Vec<CallRecord>> {
        let data = self
            .records
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let matching = data
            .iter()
            .filter(|r| r.client_id == client_id)
            .cloned()
            .collect();
        Ok(newest_first(matching, limit))
    }
}
