//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use routewatch::config::ConfigFileError;
use routewatch::route::BackendError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// No backend URL configured
    MissingBackend,
    /// Failed to create the HTTP backend
    Backend(BackendError),
    /// The route could not be computed; carries the last status line
    RouteFailed(String),
    /// No reliable GPS fix arrived in time
    NoFix { waited_secs: u64 },
    /// Failed to read a replay file
    Replay { path: PathBuf, error: String },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::MissingBackend => {
                eprintln!();
                eprintln!("Set the routing API in one of these ways:");
                eprintln!("  1. [backend] url in ~/.routewatch/config.ini");
                eprintln!("     (create it with: routewatch config init)");
                eprintln!("  2. The ROUTEWATCH_API_URL environment variable");
            }
            CliError::NoFix { .. } => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. gpsd not running: systemctl status gpsd");
                eprintln!("  2. Receiver has no sky view; try again outdoors");
                eprintln!("  3. Wrong daemon address: check [gpsd] host and port");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::MissingBackend => write!(f, "No routing API configured"),
            CliError::Backend(e) => write!(f, "Failed to create routing client: {}", e),
            CliError::RouteFailed(msg) => write!(f, "Route failed: {}", msg),
            CliError::NoFix { waited_secs } => {
                write!(f, "No reliable GPS fix after {} s", waited_secs)
            }
            CliError::Replay { path, error } => {
                write!(f, "Failed to read replay file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<BackendError> for CliError {
    fn from(e: BackendError) -> Self {
        CliError::Backend(e)
    }
}
