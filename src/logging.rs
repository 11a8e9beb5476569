//! Tracing subscriber setup for the command-line tool

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Environment variable read before `RUST_LOG`
pub const LOG_ENV: &str = "ASDF_COMPAT_LOG";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Number of `-v` flags
    pub verbosity: u8,
    /// Emit JSON lines instead of the compact format
    pub json: bool,
    /// Append to this file instead of writing to stderr
    pub file: Option<PathBuf>,
}

/// Level used when neither environment variable is set
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity)))
}

fn file_writer(path: &Path) -> anyhow::Result<(BoxMakeWriter, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path {} has no file name", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((BoxMakeWriter::new(writer), guard))
}

/// Install the global subscriber
///
/// The returned guard flushes the log file when dropped; keep it alive for
/// the rest of `main`.
pub fn init_logging(options: &LoggingOptions) -> anyhow::Result<Option<WorkerGuard>> {
    let (writer, guard) = match &options.file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            (writer, Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(options.verbosity))
        .with_target(options.verbosity >= 2)
        .with_ansi(options.file.is_none() && !options.json)
        .with_writer(writer);

    let result = if options.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.compact().finish())
    };
    result.context("Failed to initialize logging")?;

    tracing::debug!(?options, "Logging initialized");
    Ok(guard)
}
