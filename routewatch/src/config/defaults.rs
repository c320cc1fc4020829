//! Default values and limits for all configuration settings.

use super::settings::*;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 12;
pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Meters.
pub const DEFAULT_RELIABILITY_THRESHOLD: f64 = 150.0;
pub const DEFAULT_FIRST_FIX_ZOOM: f64 = 16.0;

pub const DEFAULT_FIT_PADDING: u32 = 50;
pub const DEFAULT_FIT_DURATION_MS: u32 = 1000;
pub const DEFAULT_MAP_ZOOM: f64 = 13.0;

/// Zoom levels accepted for `first_fix_zoom` and `default_zoom`.
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 22.0;

pub const DEFAULT_GPSD_HOST: &str = "127.0.0.1";
pub const DEFAULT_GPSD_PORT: u16 = 2947;

/// Environment variable overriding `[backend] url`.
pub const ENV_API_URL: &str = "ROUTEWATCH_API_URL";
/// Environment variable overriding `[backend] token`.
pub const ENV_TOKEN: &str = "ROUTEWATCH_TOKEN";

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            backend: BackendSettings {
                url: None,
                token: None,
                request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            },
            tracking: TrackingSettings {
                reliability_threshold: DEFAULT_RELIABILITY_THRESHOLD,
                first_fix_zoom: DEFAULT_FIRST_FIX_ZOOM,
            },
            map: MapSettings {
                fit_padding: DEFAULT_FIT_PADDING,
                fit_duration: DEFAULT_FIT_DURATION_MS,
                default_zoom: DEFAULT_MAP_ZOOM,
            },
            gpsd: GpsdSettings {
                host: DEFAULT_GPSD_HOST.to_string(),
                port: DEFAULT_GPSD_PORT,
            },
        }
    }
}
