//! Configuration file handling for `~/.routewatch/config.ini`.
//!
//! Settings structs live in [`super::settings`], constants in
//! [`super::defaults`], parsing in [`super::parser`] and serialization in
//! [`super::writer`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use super::defaults::{ENV_API_URL, ENV_TOKEN};
use super::settings::ConfigFile;
use crate::position::Accuracy;
use crate::render::{FitOptions, SurfaceOptions};
use crate::route::{HttpBackendConfig, RouteConfig};
use crate::session::SessionConfig;
use crate::tracking::{GpsdConfig, TrackingConfig};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (`~/.routewatch/config.ini`).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Apply `ROUTEWATCH_API_URL` and `ROUTEWATCH_TOKEN` from the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_backend_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_TOKEN).ok(),
        )
    }

    /// Replace the backend URL and token with non-blank overrides.
    pub fn with_backend_overrides(mut self, url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = non_blank(url) {
            self.backend.url = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(token) = non_blank(token) {
            self.backend.token = Some(token);
        }
        self
    }

    /// Backend connection settings, if a URL is configured.
    pub fn http_backend(&self) -> Option<HttpBackendConfig> {
        let url = self.backend.url.as_ref()?;
        Some(
            HttpBackendConfig::new(url.clone())
                .with_token(self.backend.token.clone())
                .with_timeout(self.request_timeout()),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout)
    }

    pub fn gpsd_config(&self) -> GpsdConfig {
        GpsdConfig {
            host: self.gpsd.host.clone(),
            port: self.gpsd.port,
        }
    }

    /// Component settings for a [`crate::session::Session`].
    pub fn session_config(&self) -> SessionConfig {
        let reliability_threshold = Accuracy::new(self.tracking.reliability_threshold)
            .unwrap_or(Accuracy::RELIABILITY_THRESHOLD);

        SessionConfig {
            tracking: TrackingConfig {
                reliability_threshold,
                first_fix_zoom: self.tracking.first_fix_zoom,
            },
            route: RouteConfig {
                timeout: self.request_timeout(),
                reliability_threshold,
            },
            surface: SurfaceOptions {
                fit: FitOptions {
                    padding: self.map.fit_padding,
                    duration_ms: self.map.fit_duration,
                },
            },
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Path to the config directory (`~/.routewatch`).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".routewatch")
}

/// Path to the config file (`~/.routewatch/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
