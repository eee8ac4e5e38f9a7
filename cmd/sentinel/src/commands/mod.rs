//! CLI commands module.

mod analyze;
mod history;
mod score;
mod util;
mod voiceprint;

pub use analyze::AnalyzeCommand;
pub use history::HistoryCommand;
pub use score::ScoreCommand;
pub use voiceprint::{EnrollCommand, VerifyCommand, VoiceprintsCommand};

pub(crate) use util::*;
