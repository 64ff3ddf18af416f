// File: crates/demo/src/logger.rs
// Summary: tracing setup: daily-rotated files when a log directory is configured,
// stderr otherwise. Filter comes from SEXTANT_LOG, then the config, then a default.

use std::path::Path;

use sextant_feed::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;

pub const FILTER_ENV: &str = "SEXTANT_LOG";
const DEFAULT_FILTER: &str = "warn,sextant_core=info,sextant_feed=info,sextant_demo=info";

fn filter_directives(config: &LoggingConfig) -> String {
    std::env::var(FILTER_ENV)
        .ok()
        .or_else(|| config.filter.clone())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn file_writer(dir: &Path) -> Option<tracing_appender::rolling::RollingFileAppender> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};

    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("cannot create log directory {}: {e}; logging to stderr", dir.display());
        return None;
    }
    match RollingFileAppender::builder()
        .filename_prefix("sextant")
        .filename_suffix("log")
        .max_log_files(5)
        .rotation(Rotation::DAILY)
        .build(dir)
    {
        Ok(writer) => Some(writer),
        Err(e) => {
            eprintln!("cannot open log file in {}: {e}; logging to stderr", dir.display());
            None
        }
    }
}

/// Install the global subscriber. Keep the guard alive until exit or buffered lines
/// are lost.
#[must_use]
pub fn init(config: &LoggingConfig) -> WorkerGuard {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let to_file = config.log_dir.as_deref().and_then(file_writer);
    let ansi = to_file.is_none();
    let (writer, guard) = match to_file {
        Some(file) => tracing_appender::non_blocking(file),
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let file_line = cfg!(debug_assertions);
    let layer = fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_file(file_line)
        .with_line_number(file_line)
        .with_writer(writer)
        .with_filter(tracing_subscriber::EnvFilter::new(filter_directives(config)));

    tracing_subscriber::registry().with(layer).init();
    guard
}
