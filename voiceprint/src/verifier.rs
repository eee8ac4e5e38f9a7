use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use sentinel_store::{Voiceprint, VoiceprintStore};

use crate::{cosine_similarity, SpeakerEmbedder, VoiceprintError};

/// A safe-list entry whose similarity exceeded the verification threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeMatch {
    pub name: String,
    pub similarity: f32,
}

/// Outcome of [`VoiceVerifier::enroll`].
#[derive(Debug, Clone, PartialEq)]
pub enum EnrollOutcome {
    Enrolled { name: String, dimension: usize },
    /// Nothing was stored; the reason is suitable for showing to a user.
    Skipped(String),
}

/// Matches speech against a persistent safe-list of named voiceprints.
///
/// The list is loaded from the store once and cached. Verification takes a
/// shared read lock, so any number of sessions verify concurrently;
/// enrollment and removal are serialized and write through to the store
/// before the cache is updated. Verification never mutates the list.
pub struct VoiceVerifier {
    embedder: Arc<dyn SpeakerEmbedder>,
    store: Arc<dyn VoiceprintStore>,
    threshold: f32,
    entries: RwLock<Vec<Voiceprint>>,
    writer: Mutex<()>,
}

impl VoiceVerifier {
    /// Loads the safe-list from `store`.
    pub fn load(
        embedder: Arc<dyn SpeakerEmbedder>,
        store: Arc<dyn VoiceprintStore>,
        threshold: f32,
    ) -> Result<Self, VoiceprintError> {
        let entries = store.voiceprints()?;
        tracing::debug!(count = entries.len(), "loaded voiceprint safe-list");
        Ok(Self {
            embedder,
            store,
            threshold,
            entries: RwLock::new(entries),
            writer: Mutex::new(()),
        })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Enrolls `name` from a reference sample, replacing any previous
    /// voiceprint with that name.
    ///
    /// An empty name or empty audio stores nothing and returns
    /// [`EnrollOutcome::Skipped`].
    pub fn enroll(&self, name: &str, samples: &[f32], sample_rate: u32) -> Result<EnrollOutcome, VoiceprintError> {
        let name = name.trim();
        if name.is_empty() {
            tracing::warn!("enrollment skipped: empty name");
            return Ok(EnrollOutcome::Skipped("name is empty".to_string()));
        }
        if samples.is_empty() {
            tracing::warn!(name = %name, "enrollment skipped: no audio");
            return Ok(EnrollOutcome::Skipped("no audio provided".to_string()));
        }

        let embedding = match self.embedder.extract(samples, sample_rate) {
            Ok(e) => e,
            Err(VoiceprintError::AudioTooShort { min_samples, got_samples }) => {
                tracing::warn!(name = %name, got_samples, "enrollment skipped: audio too short");
                return Ok(EnrollOutcome::Skipped(format!(
                    "audio too short: need {min_samples} samples, got {got_samples}"
                )));
            }
            Err(e) => return Err(e),
        };

        let voiceprint = Voiceprint {
            name: name.to_string(),
            embedding,
            enrolled_at: Utc::now(),
        };
        let dimension = voiceprint.embedding.len();

        let _guard = self.writer.lock();
        self.store.put_voiceprint(&voiceprint)?;
        {
            let mut entries = self.entries.write();
            entries.retain(|v| v.name != voiceprint.name);
            entries.push(voiceprint);
            entries.sort_by(|a, b| a.name.cmp(&b.name));
        }
        tracing::info!(name = %name, dimension, "voiceprint enrolled");

        Ok(EnrollOutcome::Enrolled {
            name: name.to_string(),
            dimension,
        })
    }

    /// Removes `name` from the safe-list. Returns whether it existed.
    pub fn remove(&self, name: &str) -> Result<bool, VoiceprintError> {
        let _guard = self.writer.lock();
        let existed = self.store.delete_voiceprint(name)?;
        self.entries.write().retain(|v| v.name != name);
        Ok(existed)
    }

    /// The safe-list, ordered by name.
    pub fn list(&self) -> Vec<Voiceprint> {
        self.entries.read().clone()
    }

    /// Names on the safe-list, sorted.
    pub fn names(&self) -> Vec<String> {
        self.entries.read().iter().map(|v| v.name.clone()).collect()
    }

    /// Embeds `samples` and matches them against the safe-list.
    pub fn verify(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<SafeMatch>, VoiceprintError> {
        if self.entries.read().is_empty() {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.extract(samples, sample_rate)?;
        Ok(self.verify_embedding(&embedding))
    }

    /// Matches an already computed embedding against the safe-list.
    ///
    /// Returns entries with similarity strictly above the threshold, most
    /// similar first, ties by name.
    pub fn verify_embedding(&self, embedding: &[f32]) -> Vec<SafeMatch> {
        let entries = self.entries.read();
        let mut matches: Vec<SafeMatch> = entries
            .iter()
            .filter_map(|v| {
                let similarity = cosine_similarity(&v.embedding, embedding);
                (similarity > self.threshold).then(|| SafeMatch {
                    name: v.name.clone(),
                    similarity,
                })
            })
            .collect();
        matches.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.name.cmp(&b.name))
        });
        matches
    }
}

impl std::fmt::Debug for VoiceVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceVerifier")
            .field("threshold", &self.threshold)
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds audio as its first two samples, for exact control in tests.
    struct EchoEmbedder {
        calls: AtomicUsize,
    }

    impl SpeakerEmbedder for EchoEmbedder {
        fn extract(&self, samples: &[f32], _sample_rate: u32) -> Result<Vec<f32>, VoiceprintError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if samples.len() < 2 {
                return Err(VoiceprintError::AudioTooShort {
                    min_samples: 2,
                    got_samples: samples.len(),
                });
            }
            Ok(samples[..2].to_vec())
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    fn verifier(store: Arc<MemoryStore>) -> (VoiceVerifier, Arc<EchoEmbedder>) {
        let embedder = Arc::new(EchoEmbedder {
            calls: AtomicUsize::new(0),
        });
        let v = VoiceVerifier::load(embedder.clone(), store, 0.7).unwrap();
        (v, embedder)
    }

    #[test]
    fn test_empty_safe_list_skips_embedding() {
        let (v, embedder) = verifier(Arc::new(MemoryStore::new()));
        assert!(v.verify(&[1.0, 0.0], 16000).unwrap().is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_enroll_and_verify() {
        let store = Arc::new(MemoryStore::new());
        let (v, _) = verifier(store.clone());

        let outcome = v.enroll(" Alice ", &[1.0, 0.0], 16000).unwrap();
        assert_eq!(
            outcome,
            EnrollOutcome::Enrolled {
                name: "Alice".to_string(),
                dimension: 2
            }
        );
        assert_eq!(store.voiceprints().unwrap().len(), 1);

        let matches = v.verify(&[0.95, 0.1], 16000).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "Alice");
        assert!(matches[0].similarity > 0.7);

        assert!(v.verify(&[0.0, 1.0], 16000).unwrap().is_empty());
    }

    #[test]
    fn test_matches_sorted_by_similarity() {
        let (v, _) = verifier(Arc::new(MemoryStore::new()));
        v.enroll("bob", &[1.0, 0.3], 16000).unwrap();
        v.enroll("alice", &[1.0, 0.0], 16000).unwrap();
        let names: Vec<String> = v
            .verify_embedding(&[1.0, 0.05])
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn test_invalid_enrollment_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let (v, _) = verifier(store.clone());
        assert!(matches!(v.enroll("", &[1.0, 0.0], 16000).unwrap(), EnrollOutcome::Skipped(_)));
        assert!(matches!(v.enroll("x", &[], 16000).unwrap(), EnrollOutcome::Skipped(_)));
        assert!(matches!(v.enroll("x", &[0.5], 16000).unwrap(), EnrollOutcome::Skipped(_)));
        assert!(store.voiceprints().unwrap().is_empty());
        assert!(v.names().is_empty());
    }

    #[test]
    fn test_reenroll_replaces_and_remove() {
        let store = Arc::new(MemoryStore::new());
        let (v, _) = verifier(store.clone());
        v.enroll("alice", &[1.0, 0.0], 16000).unwrap();
        v.enroll("alice", &[0.0, 1.0], 16000).unwrap();
        assert_eq!(v.names(), vec!["alice"]);
        assert_eq!(v.verify_embedding(&[0.0, 1.0]).len(), 1);

        assert!(v.remove("alice").unwrap());
        assert!(v.names().is_empty());
        assert!(store.voiceprints().unwrap().is_empty());
    }

    #[test]
    fn test_load_existing_entries() {
        let store = Arc::new(MemoryStore::new());
        {
            let (v, _) = verifier(store.clone());
            v.enroll("carol", &[0.0, 1.0], 16000).unwrap();
        }
        let (v, _) = verifier(store);
        assert_eq!(v.names(), vec!["carol"]);
        assert_eq!(v.list().len(), 1);
    }
}
