//! INI serialization: [`ConfigFile`] → commented INI string.

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to the commented INI text written to `config.ini`.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let url = config.backend.url.as_deref().unwrap_or("");
    let token = config.backend.token.as_deref().unwrap_or("");

    format!(
        r#"[backend]
; Base URL of the routing API (geocoding and route endpoints live under it)
; Example: url = https://routes.example.com/api
; Overridden by the ROUTEWATCH_API_URL environment variable
url = {}
; Bearer token for the routing API
; Overridden by the ROUTEWATCH_TOKEN environment variable
token = {}
; Upper bound on one route request, geocoding included (seconds, 1-120)
request_timeout = {}

[tracking]
; Largest GPS accuracy radius in meters that still counts as reliable.
; Less precise fixes update the marker but never move the map or act as
; a route origin.
reliability_threshold = {}
; Minimum zoom level applied when the first fix arrives
first_fix_zoom = {}

[map]
; Padding around a fitted route, in pixels
fit_padding = {}
; Duration of the fit animation in milliseconds (0 disables animation)
fit_duration = {}
; Zoom level of a freshly created map
default_zoom = {}

[gpsd]
; gpsd daemon used by `routewatch track` and `routewatch route --gpsd`
host = {}
port = {}
"#,
        url,
        token,
        config.backend.request_timeout,
        config.tracking.reliability_threshold,
        config.tracking.first_fix_zoom,
        config.map.fit_padding,
        config.map.fit_duration,
        config.map.default_zoom,
        config.gpsd.host,
        config.gpsd.port,
    )
}
