//! Log subscriber setup

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::{Level as TraceLevel, warn};
use tracing_subscriber::FmtSubscriber;

/// Map a `LOG_LEVEL` value to a level, defaulting to info
fn parse_level(value: &str) -> TraceLevel {
    match value.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context(format!("Failed to open log file {}", path.display()))
}

/// Install the global subscriber. Logs go to `log_file` when given and openable,
/// otherwise to stderr.
pub fn init(log_file: Option<&Path>) {
    let log_level = parse_level(&std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));
    let builder = FmtSubscriber::builder().with_max_level(log_level);

    let (result, open_error) = match log_file.map(open_log_file) {
        Some(Ok(file)) => (
            tracing::subscriber::set_global_default(
                builder.with_ansi(false).with_writer(Mutex::new(file)).finish(),
            ),
            None,
        ),
        Some(Err(e)) => (
            tracing::subscriber::set_global_default(builder.with_writer(std::io::stderr).finish()),
            Some(e),
        ),
        None => (
            tracing::subscriber::set_global_default(builder.with_writer(std::io::stderr).finish()),
            None,
        ),
    };

    if let Err(e) = result {
        eprintln!("Failed to install log subscriber: {e}");
    }
    if let Some(e) = open_error {
        warn!(error = %format!("{e:#}"), "Logging to stderr instead of log file");
    }
}
