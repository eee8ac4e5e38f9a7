//! Sentinel CLI - streams call audio through the fraud-risk pipeline.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    AnalyzeCommand, EnrollCommand, HistoryCommand, ScoreCommand, VerifyCommand, VoiceprintsCommand,
};

/// Sentinel CLI - analyzes phone-call audio for fraud risk.
///
/// Audio is raw 16-bit little-endian mono PCM. Voiceprints and call records
/// are kept in a redb database, by default ~/.sentinel/sentinel.redb.
#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Streaming call fraud-risk analysis")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.sentinel/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream a PCM file through a session
    Analyze(AnalyzeCommand),
    /// Score a piece of text
    Score(ScoreCommand),
    /// Enroll a trusted voice
    Enroll(EnrollCommand),
    /// Match a recording against the safe-list
    Verify(VerifyCommand),
    /// Manage enrolled voiceprints
    Voiceprints(VoiceprintsCommand),
    /// Show persisted call records
    History(HistoryCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Analyze(cmd) => cmd.run(&cli).await,
        Commands::Score(cmd) => cmd.run(&cli).await,
        Commands::Enroll(cmd) => cmd.run(&cli).await,
        Commands::Verify(cmd) => cmd.run(&cli).await,
        Commands::Voiceprints(cmd) => cmd.run(&cli).await,
        Commands::History(cmd) => cmd.run(&cli).await,
    }
}
