//! Tracing initialisation for the hook binary.
//!
//! The hook's stderr carries the report that svn shows to the committer, so
//! log lines never go there. They are appended to a log file, or written to
//! stdout if the file cannot be opened.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_LOG_FILE: &str = "submission-check.log";

/// Where log output ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    File,
    Stdout,
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Only the first call in a
/// process installs a subscriber; later calls are ignored.
pub fn init_logging(level: Level, log_file: &Path) -> LogTarget {
    match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(env_filter(level))
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()
                .ok();
            LogTarget::File
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(env_filter(level))
                .with(fmt::layer().with_writer(std::io::stdout))
                .try_init()
                .ok();
            tracing::warn!(file = %log_file.display(), error = %e, "could not open log file, logging to stdout");
            LogTarget::Stdout
        }
    }
}
