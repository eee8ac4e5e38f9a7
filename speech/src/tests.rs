//! Cross-module tests with mock capabilities.

use super::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Transcribes every span as its length, counting calls.
struct CountingTranscriber {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingTranscriber {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for CountingTranscriber {
    async fn transcribe(&self, samples: &[f32], _sample_rate: u32) -> Result<Transcript, SpeechError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SpeechError::Transcription("backend down".to_string()));
        }
        if samples.is_empty() {
            return Ok(Transcript::empty());
        }
        Ok(Transcript::new(format!("{} samples", samples.len()), "en", 0.9))
    }
}

#[tokio::test]
async fn test_cache_hit_skips_backend() {
    let backend = Arc::new(CountingTranscriber::new());
    let cached = CachedTranscriber::new(backend.clone(), 10);

    let a = cached.transcribe(&[0.1; 8], 16000).await.unwrap();
    let b = cached.transcribe(&[0.1; 8], 16000).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.text, "8 samples");
    assert_eq!(backend.calls(), 1);
    assert_eq!(cached.len(), 1);
}

#[tokio::test]
async fn test_cache_is_bounded_fifo() {
    let backend = Arc::new(CountingTranscriber::new());
    let cached = CachedTranscriber::new(backend.clone(), 2);

    cached.transcribe(&[0.1; 1], 16000).await.unwrap();
    cached.transcribe(&[0.1; 2], 16000).await.unwrap();
    cached.transcribe(&[0.1; 3], 16000).await.unwrap();
    assert_eq!(cached.len(), 2);
    assert_eq!(backend.calls(), 3);

    // The oldest entry was evicted.
    cached.transcribe(&[0.1; 1], 16000).await.unwrap();
    assert_eq!(backend.calls(), 4);
    // The newest is still cached.
    cached.transcribe(&[0.1; 3], 16000).await.unwrap();
    assert_eq!(backend.calls(), 4);
}

#[tokio::test]
async fn test_empty_transcripts_not_cached() {
    let backend = Arc::new(CountingTranscriber::new());
    let cached = CachedTranscriber::new(backend.clone(), 10);

    assert!(cached.transcribe(&[], 16000).await.unwrap().is_empty());
    assert!(cached.transcribe(&[], 16000).await.unwrap().is_empty());
    assert_eq!(backend.calls(), 2);
    assert!(cached.is_empty());
}

#[tokio::test]
async fn test_errors_pass_through_uncached() {
    let backend = Arc::new(CountingTranscriber::failing());
    let cached = CachedTranscriber::new(backend.clone(), 10);

    let err = cached.transcribe(&[0.2; 4], 16000).await.unwrap_err();
    assert!(matches!(err, SpeechError::Transcription(_)));
    assert!(err.to_string().contains("backend down"));
    cached.transcribe(&[0.2; 4], 16000).await.unwrap_err();
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_capabilities_as_trait_objects() {
    let transcriber: Arc<dyn Transcriber> = Arc::new(ScriptedTranscriber::from_lines("hello", "en"));
    let spoof: Arc<dyn SpoofDetector> = Arc::new(SpectralSpoofDetector::default());
    let synth: Arc<dyn AlertSynthesizer> = Arc::new(TextAlertSynthesizer);

    assert_eq!(transcriber.transcribe(&[0.0; 10], 16000).await.unwrap().text, "hello");
    assert_eq!(spoof.detect(&[0.0; 10], 16000).await.unwrap().score, 0.0);
    assert!(synth.synthesize("alert", "fr").await.unwrap().is_some());
}
