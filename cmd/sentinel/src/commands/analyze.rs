//! Streams a PCM file through one session.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use sentinel_audio::{decode_pcm16, resample};
use sentinel_cli::{alert_json, format_report, format_result, Output, OutputFormat};
use sentinel_session::{AlertAudio, Capabilities, SessionEvent, SessionHandle, SessionId, SessionManager};
use sentinel_speech::{ScriptedTranscriber, Transcriber};
use sentinel_store::CallRecordStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{
    chunk_bytes, embedder, get_config, open_store, open_verifier, output, print_success, print_verbose,
    read_pcm,
};
use crate::Cli;

/// Stream a raw PCM16 file through a session in chunks.
///
/// Results are printed as they arrive, followed by the incident report.
/// Without a speech recognizer deployed, transcripts come from
/// `--transcript`: one line per detected speech span, in order.
#[derive(Args)]
pub struct AnalyzeCommand {
    /// Raw 16-bit little-endian mono PCM file
    pcm: String,

    /// Sample rate of the file
    #[arg(long, default_value_t = 16000)]
    rate: u32,

    /// Text file with one transcript line per speech span
    #[arg(long)]
    transcript: Option<String>,

    /// Language of the transcript lines
    #[arg(long, default_value = "en")]
    language: String,

    /// Client the call record is filed under
    #[arg(long, default_value = "cli")]
    client: String,

    /// Chunk size in milliseconds
    #[arg(long, default_value_t = 2000)]
    chunk_ms: u64,

    /// Wait one chunk duration between chunks, like a live call
    #[arg(long)]
    realtime: bool,
}

impl AnalyzeCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let out = output(cli);

        let transcriber: Arc<dyn Transcriber> = match &self.transcript {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                let script = ScriptedTranscriber::from_lines(&text, &self.language);
                print_verbose(cli, &format!("Loaded {} transcript line(s)", script.remaining()));
                Arc::new(script)
            }
            None => Arc::new(ScriptedTranscriber::default()),
        };

        let store = open_store(&cfg)?;
        let verifier = open_verifier(&cfg, store.clone())?;
        print_verbose(cli, &format!("Safe-list: {} voiceprint(s)", verifier.names().len()));

        let records: Arc<dyn CallRecordStore> = store;
        let manager = SessionManager::new(cfg.pipeline.clone(), Capabilities::new(embedder(), transcriber), records)
            .with_verifier(verifier);

        let SessionHandle { id, results, alerts } = manager.open(&self.client)?;
        print_verbose(cli, &format!("Session {id} opened"));
        let printer = spawn_printer(out.format, results, alerts);

        if self.chunk_ms as f64 / 1000.0 > cfg.pipeline.max_buffer_secs {
            anyhow::bail!(
                "--chunk-ms {} exceeds the {} s session buffer",
                self.chunk_ms,
                cfg.pipeline.max_buffer_secs
            );
        }
        let pcm = read_pcm(&self.pcm)?;
        let pause = Duration::from_millis(self.chunk_ms);
        let target = cfg.pipeline.sample_rate;
        if self.rate == target {
            for chunk in pcm.chunks(chunk_bytes(target, self.chunk_ms)) {
                manager.push_chunk(id, chunk)?;
                self.pace(&manager, id, pause).await?;
            }
        } else {
            print_verbose(cli, &format!("Resampling {} Hz to {} Hz", self.rate, target));
            let samples = resample(&decode_pcm16(&pcm), self.rate, target)?;
            for chunk in samples.chunks(chunk_bytes(target, self.chunk_ms) / 2) {
                manager.push_samples(id, chunk)?;
                self.pace(&manager, id, pause).await?;
            }
        }

        manager.flush(id).await?;
        let closed = manager.close(id).await?;
        if let Err(e) = printer.await {
            tracing::warn!(error = %e, "result printer failed");
        }

        match out.format {
            OutputFormat::Text => {
                out.line(&format_report(&closed.report))?;
                print_success(&format!("Call record {} saved for {}", closed.record.id, closed.record.client_id));
            }
            _ => out.write(&serde_json::json!({
                "type": "report",
                "report": closed.report,
                "record": closed.record,
            }))?,
        }
        Ok(())
    }

    /// Waits between chunks. Without `--realtime` the worker is asked to
    /// analyze each chunk before the next one lands, so fast input never
    /// outruns the buffer.
    async fn pace(&self, manager: &SessionManager, id: SessionId, pause: Duration) -> anyhow::Result<()> {
        if self.realtime {
            tokio::time::sleep(pause).await;
        } else {
            manager.catch_up(id).await?;
        }
        Ok(())
    }
}

/// Prints results and alerts until the session drops both channels.
fn spawn_printer(
    format: OutputFormat,
    mut results: mpsc::Receiver<SessionEvent>,
    mut alerts: mpsc::Receiver<AlertAudio>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let out = Output::new(format);
        let (mut results_open, mut alerts_open) = (true, true);
        while results_open || alerts_open {
            let printed = tokio::select! {
                event = results.recv(), if results_open => match event {
                    Some(event) => print_event(&out, &event),
                    None => {
                        results_open = false;
                        Ok(())
                    }
                },
                alert = alerts.recv(), if alerts_open => match alert {
                    Some(alert) if out.format == OutputFormat::Text => out.line(&format!(
                        ">>> ALERT [{}] {}{}",
                        alert.category,
                        alert.message,
                        if alert.degraded { " (text only)" } else { "" }
                    )),
                    Some(alert) => out.write(&alert_json(&alert)),
                    None => {
                        alerts_open = false;
                        Ok(())
                    }
                },
            };
            if let Err(e) = printed {
                tracing::warn!(error = %e, "failed to print");
            }
        }
    })
}

fn print_event(out: &Output, event: &SessionEvent) -> anyhow::Result<()> {
    match (out.format, event) {
        (OutputFormat::Text, SessionEvent::Result(result)) => out.line(&format_result(result)),
        (OutputFormat::Text, SessionEvent::Error { message }) => out.line(&format!("error: {message}")),
        _ => out.write(event),
    }
}
