//! Settings structs for each configuration section.
//!
//! Each struct is one `[section]` of `config.ini`. Parsing lives in
//! [`super::parser`], serialization in [`super::writer`].

/// Complete configuration loaded from `config.ini`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub backend: BackendSettings,
    pub tracking: TrackingSettings,
    pub map: MapSettings,
    pub gpsd: GpsdSettings,
}

/// Routing backend connection.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
    /// Base URL of the routing API, e.g. `https://api.example.com/api`.
    pub url: Option<String>,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Bound on one route request (geocoding plus routing), in seconds.
    pub request_timeout: u64,
}

/// GPS tracking policy.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSettings {
    /// Largest accuracy radius in meters that still counts as reliable.
    pub reliability_threshold: f64,
    /// Minimum zoom applied on the first fix of a session.
    pub first_fix_zoom: f64,
}

/// Map viewport behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    /// Padding around a fitted route, in pixels.
    pub fit_padding: u32,
    /// Fit animation length in milliseconds.
    pub fit_duration: u32,
    pub default_zoom: f64,
}

/// Local gpsd daemon.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsdSettings {
    pub host: String,
    pub port: u16,
}
