//! Command line support for sentinel.
//!
//! Configuration lives in `~/.sentinel/config.yaml`; see [`config`].

pub mod config;
pub mod output;
pub mod paths;

pub use config::{load_config, Config, StoreConfig};
pub use output::{alert_json, format_report, format_result, Output, OutputFormat};
pub use paths::Paths;
