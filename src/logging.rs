//! File-based logging for ovr using the tracing crate.
//!
//! Writes daily-rotated log files under the state directory resolved by the
//! config module. Nothing is ever logged to the terminal; that belongs to
//! the widget. Rotated files beyond the last week are pruned at startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;

use crate::config;

/// Keeps the non-blocking appender alive for the program lifetime.
static APPENDER_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Base name of the log files; daily rotation appends a `.YYYY-MM-DD` suffix.
pub const LOG_FILE_PREFIX: &str = "ovr.log";

const MAX_ROTATED_LOGS: usize = 7;

/// Initializes daily-rotating file logging.
///
/// Log level is controlled by the RUST_LOG environment variable (defaults
/// to "info").
///
/// # Errors
/// - If the log directory cannot be determined or created
/// - If logging was already initialized
pub fn init_logging() -> Result<(), anyhow::Error> {
    let log_dir = config::log_dir()?;
    fs::create_dir_all(&log_dir)?;

    if let Err(e) = prune_rotated_logs(&log_dir, MAX_ROTATED_LOGS) {
        eprintln!("Warning: failed to prune old logs: {e}");
    }

    let (writer, guard) =
        tracing_appender::non_blocking(rolling::daily(&log_dir, LOG_FILE_PREFIX));

    // The guard must outlive the subscriber or buffered lines are lost.
    APPENDER_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Logging already initialized"))?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_ansi(false),
        )
        .init();

    tracing::debug!("Logging initialized. Log directory: {}", log_dir.display());
    Ok(())
}

/// Deletes all but the newest `keep` rotated log files.
///
/// Date-suffixed names sort lexicographically in chronological order, so
/// after sorting the oldest files are simply the leading excess.
fn prune_rotated_logs(log_dir: &Path, keep: usize) -> Result<(), anyhow::Error> {
    let mut rotated: Vec<PathBuf> = fs::read_dir(log_dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_rotated_log_name);
            matches.then_some(path)
        })
        .collect();

    rotated.sort();
    let excess = rotated.len().saturating_sub(keep);
    for path in &rotated[..excess] {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Failed to delete old log file {}: {}", path.display(), e);
        }
    }

    Ok(())
}

/// True only for names shaped `ovr.log.YYYY-MM-DD`, the exact form the
/// daily rotation produces. Other hyphenated file names do not qualify.
fn is_rotated_log_name(name: &str) -> bool {
    let Some(date) = name
        .strip_prefix(LOG_FILE_PREFIX)
        .and_then(|rest| rest.strip_prefix('.'))
    else {
        return false;
    };
    date.len() == 10
        && date.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}
