//! Redb-backed persistent store.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{
    newest_first, CallRecord, CallRecordStore, StoreError, StoreResult, Voiceprint, VoiceprintStore,
};

type Table = TableDefinition<'static, &'static str, &'static [u8]>;

const VOICEPRINTS: Table = TableDefinition::new("voiceprints");
const CALL_RECORDS: Table = TableDefinition::new("call_records");

/// A persistent store backed by a single redb file.
///
/// Values are JSON documents. Call records are keyed
/// `{client_id}/{record_id}`.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Opens or creates a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = Database::create(path).map_err(|e| StoreError::Storage(e.to_string()))?;

        // Create both tables up front so read transactions never miss them.
        let tx = db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        {
            tx.open_table(VOICEPRINTS)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            tx.open_table(CALL_RECORDS)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        tx.commit().map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(Self { db })
    }

    fn insert(&self, table: Table, key: &str, value: &[u8]) -> StoreResult<()> {
        let tx = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        {
            let mut table = tx
                .open_table(table)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        tx.commit().map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    fn scan(&self, table: Table, prefix: &str) -> StoreResult<Vec<Vec<u8>>> {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let table = tx
            .open_table(table)
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let mut values = Vec::new();
        for item in table.iter().map_err(|e| StoreError::Storage(e.to_string()))? {
            let (key, value) = item.map_err(|e| StoreError::Storage(e.to_string()))?;
            if key.value().starts_with(prefix) {
                values.push(value.value().to_vec());
            }
        }
        Ok(values)
    }
}

impl VoiceprintStore for RedbStore {
    fn put_voiceprint(&self, voiceprint: &Voiceprint) -> StoreResult<()> {
        let value = serde_json::to_vec(voiceprint)?;
        self.insert(VOICEPRINTS, &voiceprint.name, &value)
    }

    fn voiceprints(&self) -> StoreResult<Vec<Voiceprint>> {
        // Keys iterate in order, so the result is sorted by name.
        self.scan(VOICEPRINTS, "")?
            .iter()
            .map(|v| serde_json::from_slice(v).map_err(StoreError::from))
            .collect()
    }

    fn delete_voiceprint(&self, name: &str) -> StoreResult<bool> {
        let tx = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let existed = {
            let mut table = tx
                .open_table(VOICEPRINTS)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            let removed = table
                .remove(name)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            removed.is_some()
        };
        tx.commit().map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(existed)
    }
}

impl CallRecordStore for RedbStore {
    fn put_record(&self, record: &CallRecord) -> StoreResult<()> {
        let key = format!("{}/{}", record.client_id, record.id);
        let value = serde_json::to_vec(record)?;
        self.insert(CALL_RECORDS, &key, &value)
    }

    fn history(&self, client_id: &str, limit: usize) -> StoreResult<Vec<CallRecord>> {
        let prefix = format!("{client_id}/");
        let mut records = Vec::new();
        for value in self.scan(CALL_RECORDS, &prefix)? {
            let record: CallRecord = serde_json::from_slice(&value)?;
            // Client ids may themselves contain '/'.
            if record.client_id == client_id {
                records.push(record);
            }
        }
        Ok(newest_first(records, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{record, voiceprint};
    use tempfile::tempdir;

    #[test]
    fn test_redb_voiceprints() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        store.put_voiceprint(&voiceprint("zoe", vec![0.1, 0.2])).unwrap();
        store.put_voiceprint(&voiceprint("alice", vec![0.3, 0.4])).unwrap();

        let all = store.voiceprints().unwrap();
        let names: Vec<&str> = all.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "zoe"]);
        assert_eq!(all[0].embedding, vec![0.3, 0.4]);

        assert!(store.delete_voiceprint("zoe").unwrap());
        assert!(!store.delete_voiceprint("zoe").unwrap());
        assert_eq!(store.voiceprints().unwrap().len(), 1);
    }

    #[test]
    fn test_redb_history() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        store.put_record(&record("c1", 1, 10.0)).unwrap();
        store.put_record(&record("c1", 9, 90.0)).unwrap();
        store.put_record(&record("c1/x", 5, 55.0)).unwrap();

        let history = store.history("c1", 50).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].max_risk_score, 90.0);
        assert_eq!(history[0].risk_level, "scam");
    }

    #[test]
    fn test_redb_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");
        let rec = record("c1", 2, 75.0);
        {
            let store = RedbStore::open(&path).unwrap();
            store.put_record(&rec).unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.history("c1", 10).unwrap(), vec![rec]);
    }
}
