//! CLI runner for common setup.
//!
//! Loads configuration, initializes logging and builds the collaborators the
//! commands share.

use tracing::info;

use routewatch::config::ConfigFile;
use routewatch::logging::{default_log_dir, init_logging, LoggingGuard, LOG_FILE};
use routewatch::route::HttpBackend;
use routewatch::status::{Status, StatusLog, StatusSink};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps the log writer alive while the runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load config (with environment overrides) and initialize logging.
    ///
    /// With `verbose`, diagnostics are mirrored to stderr.
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?.with_env_overrides();

        let logging_guard = init_logging(&default_log_dir(), LOG_FILE, verbose)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("RouteWatch v{}", routewatch::VERSION);
        info!("RouteWatch CLI: {} command", command);
    }

    /// HTTP routing client from the configured backend settings.
    pub fn http_backend(&self) -> Result<HttpBackend, CliError> {
        let settings = self.config.http_backend().ok_or(CliError::MissingBackend)?;
        info!(url = %settings.base_url, "Using routing API");
        Ok(HttpBackend::new(settings)?)
    }
}

/// Prints status lines to stdout, skipping exact repeats, and records them
/// in a shared history.
///
/// Only the latest line is ever read back, so commands hand it a log of
/// capacity one.
#[derive(Debug)]
pub struct ConsoleStatus {
    history: StatusLog,
}

impl ConsoleStatus {
    pub fn new(history: StatusLog) -> Self {
        Self { history }
    }
}

impl StatusSink for ConsoleStatus {
    fn report(&mut self, status: Status) {
        if self.history.last().as_ref() != Some(&status) {
            println!("{}", status);
        }
        self.history.report(status);
    }
}
