//! Tracing configuration and log routing.
//!
//! Events go to stderr using a compact formatter so stdout stays free for transcripts and
//! summaries. A file layer is added as well: when `TALKTODOCS_LOG_FILE` is set to a non-blank
//! path, logs are appended there; otherwise they land in `logs/talktodocs.log`.
//!
//! Call [`crate::config::load_env_file`] first so both variables can come from `.env`.
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config;

const LOG_FILE_VAR: &str = "TALKTODOCS_LOG_FILE";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_NAME: &str = "talktodocs.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where the file layer writes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LogTarget {
    /// Explicit path from `TALKTODOCS_LOG_FILE`, opened for append.
    File(PathBuf),
    /// `logs/talktodocs.log` under the working directory.
    DefaultDir,
}

impl LogTarget {
    fn from_setting(path: Option<String>) -> Self {
        match path {
            Some(path) => Self::File(PathBuf::from(path)),
            None => Self::DefaultDir,
        }
    }

    fn from_env() -> Self {
        Self::from_setting(config::load_env_optional(LOG_FILE_VAR))
    }
}

/// Configure tracing subscribers for stderr and optional file logging.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`).
/// - Uses a global guard to keep the non‑blocking writer alive for the process lifetime.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer);

    match configure_file_writer(LogTarget::from_env()) {
        Some(writer) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .compact();
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }
}

/// Build a non‑blocking writer for file logging.
///
/// Returns `None` when the logs directory cannot be created or the target file cannot be opened;
/// stderr logging still works in that case.
fn configure_file_writer(target: LogTarget) -> Option<NonBlocking> {
    let (non_blocking, guard) = match target {
        LogTarget::File(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|err| eprintln!("Failed to open log file {}: {err}", path.display()))
                .ok()?;
            tracing_appender::non_blocking(file)
        }
        LogTarget::DefaultDir => {
            std::fs::create_dir_all(DEFAULT_LOG_DIR)
                .map_err(|err| eprintln!("Failed to create {DEFAULT_LOG_DIR} directory: {err}"))
                .ok()?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(
                DEFAULT_LOG_DIR,
                DEFAULT_LOG_NAME,
            ))
        }
    };
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins_over_default_directory() {
        assert_eq!(
            LogTarget::from_setting(Some("custom.log".into())),
            LogTarget::File(PathBuf::from("custom.log"))
        );
        assert_eq!(LogTarget::from_setting(None), LogTarget::DefaultDir);
    }

    #[test]
    fn unopenable_log_file_disables_file_layer() {
        let missing = std::env::temp_dir()
            .join("talktodocs-missing-dir")
            .join("nested")
            .join("app.log");
        assert!(configure_file_writer(LogTarget::File(missing)).is_none());
    }
}
