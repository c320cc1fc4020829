//! Diagnostic logging.
//!
//! Diagnostics go to `~/.routewatch/logs/routewatch.log` (truncated when a
//! session starts) and optionally to stderr. The filter defaults to `info`
//! and follows `RUST_LOG` when set.
//!
//! User-facing status lines are not logged here; see [`crate::status`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::config_directory;

/// Default log file name.
pub const LOG_FILE: &str = "routewatch.log";

/// Keeps the non-blocking file writer alive.
///
/// Dropping the guard flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Install the global subscriber.
///
/// With `console` set, events are mirrored to stderr in compact form so they
/// do not interleave with status output on stdout.
///
/// # Errors
///
/// Fails if the log directory cannot be created or the log file cannot be
/// truncated.
pub fn init_logging(
    log_dir: &Path,
    log_file: &str,
    console: bool,
) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let console_layer = console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .compact()
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Create `log_dir` if needed and truncate the log file.
pub fn prepare_log_file(log_dir: &Path, log_file: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(log_file);
    fs::write(&path, "")?;
    Ok(path)
}

/// `~/.routewatch/logs`.
pub fn default_log_dir() -> PathBuf {
    config_directory().join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracing_appender::non_blocking::NonBlocking;

    #[test]
    fn test_prepare_creates_nested_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");

        let path = prepare_log_file(&dir, LOG_FILE).unwrap();

        assert!(dir.is_dir());
        assert_eq!(path, dir.join(LOG_FILE));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_prepare_truncates_previous_session() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(LOG_FILE);
        fs::write(&path, "old session").unwrap();

        prepare_log_file(temp.path(), LOG_FILE).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_prepare_fails_when_directory_is_a_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("logs");
        fs::write(&blocker, "not a directory").unwrap();

        assert!(prepare_log_file(&blocker, LOG_FILE).is_err());
    }

    #[test]
    fn test_default_log_dir_ends_in_logs() {
        assert!(default_log_dir().ends_with("logs"));
    }

    #[test]
    fn test_guard_holds_writer() {
        let (writer, guard) = NonBlocking::new(io::sink());
        drop(writer);
        let _guard = LoggingGuard { _file_guard: guard };
    }
}
