//! Safe-list management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use sentinel_cli::OutputFormat;
use sentinel_voiceprint::EnrollOutcome;

use super::{get_config, open_store, open_verifier, output, print_success, read_samples};
use crate::Cli;

/// Enroll a trusted voice from a reference recording.
#[derive(Args)]
pub struct EnrollCommand {
    /// Name to enroll under; an existing voiceprint is replaced
    name: String,

    /// Raw 16-bit little-endian mono PCM file
    pcm: String,

    /// Sample rate of the file
    #[arg(long, default_value_t = 16000)]
    rate: u32,
}

impl EnrollCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let verifier = open_verifier(&cfg, open_store(&cfg)?)?;
        let samples = read_samples(&self.pcm)?;

        match verifier.enroll(&self.name, &samples, self.rate)? {
            EnrollOutcome::Enrolled { name, dimension } => {
                print_success(&format!("Enrolled {name} ({dimension}-dim voiceprint)"));
                Ok(())
            }
            EnrollOutcome::Skipped(reason) => anyhow::bail!("enrollment skipped: {reason}"),
        }
    }
}

/// Match a recording against the safe-list.
#[derive(Args)]
pub struct VerifyCommand {
    /// Raw 16-bit little-endian mono PCM file
    pcm: String,

    /// Sample rate of the file
    #[arg(long, default_value_t = 16000)]
    rate: u32,
}

impl VerifyCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let verifier = open_verifier(&cfg, open_store(&cfg)?)?;
        let samples = read_samples(&self.pcm)?;
        let matches = verifier.verify(&samples, self.rate)?;

        let out = output(cli);
        if out.format != OutputFormat::Text {
            return out.write(&matches);
        }
        if matches.is_empty() {
            return out.line("no match");
        }
        for m in &matches {
            out.line(&format!("{}\t{:.3}", m.name, m.similarity))?;
        }
        Ok(())
    }
}

/// Manage enrolled voiceprints.
#[derive(Args)]
pub struct VoiceprintsCommand {
    #[command(subcommand)]
    command: VoiceprintsSubcommand,
}

#[derive(Subcommand)]
enum VoiceprintsSubcommand {
    /// List enrolled voiceprints
    List,
    /// Remove a voiceprint
    Remove {
        /// Enrolled name
        name: String,
    },
}

#[derive(Serialize)]
struct Entry {
    name: String,
    dimension: usize,
    enrolled_at: String,
}

impl VoiceprintsCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            VoiceprintsSubcommand::List => self.list(cli),
            VoiceprintsSubcommand::Remove { name } => self.remove(cli, name),
        }
    }

    fn list(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let verifier = open_verifier(&cfg, open_store(&cfg)?)?;
        let entries: Vec<Entry> = verifier
            .list()
            .into_iter()
            .map(|v| Entry {
                dimension: v.embedding.len(),
                enrolled_at: v.enrolled_at.to_rfc3339(),
                name: v.name,
            })
            .collect();

        let out = output(cli);
        if out.format != OutputFormat::Text {
            return out.write(&entries);
        }
        if entries.is_empty() {
            return out.line("no voiceprints enrolled");
        }
        for e in &entries {
            out.line(&format!("{}\t{}\t{}", e.name, e.dimension, e.enrolled_at))?;
        }
        Ok(())
    }

    fn remove(&self, cli: &Cli, name: &str) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let verifier = open_verifier(&cfg, open_store(&cfg)?)?;
        if !verifier.remove(name)? {
            anyhow::bail!("voiceprint '{name}' not found");
        }
        print_success(&format!("Removed {name}"));
        Ok(())
    }
}
