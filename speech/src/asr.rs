//! Speech-to-text for speech spans.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{SpeechError, Transcript};

/// Interface for span transcription.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribes mono samples in `[-1, 1]` at `sample_rate`.
    async fn transcribe(&self, samples: &[f32], sample_rate: u32) -> Result<Transcript, SpeechError>;
}

/// Wraps a transcriber with a bounded cache keyed by the span audio.
///
/// Repeated spans (identical samples at the same rate) are answered from
/// the cache. Only non-empty successful transcripts are cached. When full,
/// the oldest entry is evicted.
pub struct CachedTranscriber {
    inner: Arc<dyn Transcriber>,
    capacity: usize,
    cache: Mutex<TranscriptCache>,
}

#[derive(Default)]
struct TranscriptCache {
    entries: HashMap<u64, Transcript>,
    order: VecDeque<u64>,
}

impl CachedTranscriber {
    pub fn new(inner: Arc<dyn Transcriber>, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            cache: Mutex::new(TranscriptCache::default()),
        }
    }

    /// Number of cached transcripts.
    pub fn len(&self) -> usize {
        self.cache.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(samples: &[f32], sample_rate: u32) -> u64 {
        let mut hasher = DefaultHasher::new();
        sample_rate.hash(&mut hasher);
        samples.len().hash(&mut hasher);
        for s in samples {
            s.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

#[async_trait]
impl Transcriber for CachedTranscriber {
    async fn transcribe(&self, samples: &[f32], sample_rate: u32) -> Result<Transcript, SpeechError> {
        let key = Self::key(samples, sample_rate);
        if let Some(hit) = self.cache.lock().entries.get(&key) {
            tracing::debug!(key, "transcript cache hit");
            return Ok(hit.clone());
        }

        let transcript = self.inner.transcribe(samples, sample_rate).await?;
        if self.capacity > 0 && !transcript.is_empty() {
            let mut cache = self.cache.lock();
            if cache.entries.insert(key, transcript.clone()).is_none() {
                cache.order.push_back(key);
            }
            while cache.order.len() > self.capacity {
                if let Some(old) = cache.order.pop_front() {
                    cache.entries.remove(&old);
                }
            }
        }
        Ok(transcript)
    }
}

/// Replays a fixed sequence of transcripts, one per call.
///
/// Once the script is exhausted every call returns an empty transcript.
/// Used to drive the pipeline from a prepared text file and in tests.
#[derive(Default)]
pub struct ScriptedTranscriber {
    script: Mutex<VecDeque<Transcript>>,
}

impl ScriptedTranscriber {
    pub fn new(script: impl IntoIterator<Item = Transcript>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    /// Builds a script from non-blank lines of text, all in `language`.
    pub fn from_lines(text: &str, language: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| Transcript::new(l, language, 1.0)),
        )
    }

    /// Transcripts not yet returned.
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _samples: &[f32], _sample_rate: u32) -> Result<Transcript, SpeechError> {
        Ok(self.script.lock().pop_front().unwrap_or_else(Transcript::empty))
    }
}

#[cfg(test)]
mod asr_tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replays_in_order() {
        let t = ScriptedTranscriber::from_lines("first line\n\n  second line  \n", "es");
        assert_eq!(t.remaining(), 2);
        assert_eq!(t.transcribe(&[], 16000).await.unwrap().text, "first line");
        let second = t.transcribe(&[], 16000).await.unwrap();
        assert_eq!(second.text, "second line");
        assert_eq!(second.language, "es");
        assert!(t.transcribe(&[], 16000).await.unwrap().is_empty());
    }

    #[test]
    fn test_cache_key_depends_on_rate_and_samples() {
        let a = CachedTranscriber::key(&[0.1, 0.2], 16000);
        assert_eq!(a, CachedTranscriber::key(&[0.1, 0.2], 16000));
        assert_ne!(a, CachedTranscriber::key(&[0.1, 0.2], 44100));
        assert_ne!(a, CachedTranscriber::key(&[0.2, 0.1], 16000));
    }
}
