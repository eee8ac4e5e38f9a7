//! Utility functions for CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use sentinel_audio::{decode_pcm16, Format};
use sentinel_cli::{load_config, Config, Output, OutputFormat};
use sentinel_store::{RedbStore, VoiceprintStore};
use sentinel_voiceprint::{FbankEmbedder, SpeakerEmbedder, VoiceVerifier};

use crate::Cli;

/// Gets the configuration, from `--config` or the default location.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(cli.config.as_deref().map(Path::new))
}

/// Output writer for the `--json` flag.
pub fn output(cli: &Cli) -> Output {
    Output::new(if cli.json { OutputFormat::Json } else { OutputFormat::Text })
}

/// Opens the database, creating its directory when needed.
pub fn open_store(cfg: &Config) -> anyhow::Result<Arc<RedbStore>> {
    let path = cfg.store_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let store = RedbStore::open(&path).with_context(|| format!("opening {}", path.display()))?;
    Ok(Arc::new(store))
}

pub fn embedder() -> Arc<dyn SpeakerEmbedder> {
    Arc::new(FbankEmbedder::default())
}

/// Loads the voiceprint safe-list from `store`.
pub fn open_verifier(cfg: &Config, store: Arc<RedbStore>) -> anyhow::Result<Arc<VoiceVerifier>> {
    let store: Arc<dyn VoiceprintStore> = store;
    let verifier = VoiceVerifier::load(embedder(), store, cfg.pipeline.verify_threshold)
        .context("loading voiceprints")?;
    Ok(Arc::new(verifier))
}

/// Reads a raw PCM16 file.
pub fn read_pcm(path: &str) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {path}"))
}

/// Reads a raw PCM16 file into samples.
pub fn read_samples(path: &str) -> anyhow::Result<Vec<f32>> {
    let samples = decode_pcm16(&read_pcm(path)?);
    if samples.is_empty() {
        anyhow::bail!("{path} holds no audio");
    }
    Ok(samples)
}

/// Bytes in one chunk of `chunk_ms` milliseconds, at least one sample.
pub fn chunk_bytes(sample_rate: u32, chunk_ms: u64) -> usize {
    Format::mono(sample_rate)
        .bytes_in_duration(std::time::Duration::from_millis(chunk_ms))
        .max(2)
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    if cli.verbose {
        eprintln!("[verbose] {}", msg);
    }
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_bytes() {
        assert_eq!(chunk_bytes(16000, 2000), 64000);
        assert_eq!(chunk_bytes(8000, 100), 1600);
        assert_eq!(chunk_bytes(16000, 0), 2);
    }

    #[test]
    fn test_read_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pcm");
        std::fs::write(&path, [0x00, 0x40, 0x00, 0xc0]).unwrap();
        let samples = read_samples(path.to_str().unwrap()).unwrap();
        assert_eq!(samples, vec![0.5, -0.5]);

        std::fs::write(&path, [0x01]).unwrap();
        assert!(read_samples(path.to_str().unwrap()).is_err());
    }
}
