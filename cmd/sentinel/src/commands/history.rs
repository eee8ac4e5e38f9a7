//! Call record history.

use clap::Args;
use sentinel_cli::OutputFormat;
use sentinel_session::DEFAULT_HISTORY_LIMIT;
use sentinel_store::CallRecordStore;

use super::{get_config, open_store, output};
use crate::Cli;

/// Print persisted call records of a client, newest first.
#[derive(Args)]
pub struct HistoryCommand {
    /// Client id
    client: String,

    /// Maximum number of records
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    limit: usize,
}

impl HistoryCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let records = open_store(&cfg)?.history(&self.client, self.limit)?;

        let out = output(cli);
        if out.format != OutputFormat::Text {
            return out.write(&records);
        }
        if records.is_empty() {
            return out.line(&format!("no calls recorded for {}", self.client));
        }
        for r in &records {
            let spoof = if r.voice_spoofing_detected { " spoofed-voice" } else { "" };
            out.line(&format!(
                "{}  {:>6.1}s  {:>5.1} {:<10}{}  {}",
                r.started_at.format("%Y-%m-%d %H:%M:%S"),
                r.duration_secs,
                r.max_risk_score,
                r.risk_level,
                spoof,
                r.id,
            ))?;
        }
        Ok(())
    }
}
