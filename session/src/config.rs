//! Pipeline configuration.

use std::time::Duration;

use sentinel_audio::VadConfig;
use sentinel_risk::{AlertConfig, ScoringConfig};
use sentinel_voiceprint::ClusterConfig;
use serde::{Deserialize, Serialize};

/// Every tunable of the streaming pipeline.
///
/// All fields have defaults, so a partial YAML or JSON document is enough:
///
/// ```yaml
/// max_buffer_secs: 20
/// scoring:
///   scam_threshold: 75
/// alert:
///   cooldown_secs: 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sample rate of ingested PCM (default: 16000).
    pub sample_rate: u32,
    /// Audio retained per session, in seconds (default: 10).
    pub max_buffer_secs: f64,
    /// Pending audio that triggers an analysis pass (default: 2 s).
    pub analysis_window_secs: f64,
    /// Longest time pending audio waits for analysis (default: 3000 ms).
    pub max_latency_ms: u64,
    /// Timeout for each capability call (default: 30000 ms).
    pub task_timeout_ms: u64,
    /// Results retained per session (default: 500).
    pub max_results: usize,
    /// Concurrently open sessions (default: 50).
    pub max_sessions: usize,
    pub result_channel_size: usize,
    pub alert_channel_size: usize,
    pub vad: VadConfig,
    pub clustering: ClusterConfig,
    /// Safe-list similarity threshold (default: 0.7).
    pub verify_threshold: f32,
    pub scoring: ScoringConfig,
    pub alert: AlertConfig,
    /// Cached transcripts shared by all sessions; 0 disables the cache
    /// (default: 1000).
    pub transcript_cache_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            max_buffer_secs: 10.0,
            analysis_window_secs: 2.0,
            max_latency_ms: 3000,
            task_timeout_ms: 30_000,
            max_results: 500,
            max_sessions: 50,
            result_channel_size: 64,
            alert_channel_size: 16,
            vad: VadConfig::default(),
            clustering: ClusterConfig::default(),
            verify_threshold: 0.7,
            scoring: ScoringConfig::default(),
            alert: AlertConfig::default(),
            transcript_cache_size: 1000,
        }
    }
}

impl PipelineConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms.max(1))
    }

    pub fn max_latency(&self) -> Duration {
        Duration::from_millis(self.max_latency_ms.max(1))
    }

    /// Pending samples that trigger an analysis pass.
    pub fn window_samples(&self) -> u64 {
        (self.analysis_window_secs.max(0.0) * self.sample_rate as f64).round() as u64
    }
}
