//! INI parsing: `Ini` → [`ConfigFile`].
//!
//! This is the single place where INI key names are mapped to struct fields.
//! Missing keys keep their defaults; present keys must be valid.

use std::ops::RangeInclusive;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::defaults::*;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [backend] section
    if let Some(section) = ini.section(Some("backend")) {
        if let Some(v) = non_empty(section, "url") {
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid("backend", "url", v, "must start with http:// or https://"));
            }
            config.backend.url = Some(v.trim_end_matches('/').to_string());
        }
        if let Some(v) = non_empty(section, "token") {
            config.backend.token = Some(v.to_string());
        }
        if let Some(v) = section.get("request_timeout") {
            config.backend.request_timeout = parse_in_range(
                "backend",
                "request_timeout",
                v,
                MIN_REQUEST_TIMEOUT_SECS..=MAX_REQUEST_TIMEOUT_SECS,
                "must be between 1 and 120 (seconds)",
            )?;
        }
    }

    // [tracking] section
    if let Some(section) = ini.section(Some("tracking")) {
        if let Some(v) = section.get("reliability_threshold") {
            let threshold: f64 = parse_value(
                "tracking",
                "reliability_threshold",
                v,
                "must be a positive number (meters)",
            )?;
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(invalid(
                    "tracking",
                    "reliability_threshold",
                    v,
                    "must be a positive number (meters)",
                ));
            }
            config.tracking.reliability_threshold = threshold;
        }
        if let Some(v) = section.get("first_fix_zoom") {
            config.tracking.first_fix_zoom = parse_zoom("tracking", "first_fix_zoom", v)?;
        }
    }

    // [map] section
    if let Some(section) = ini.section(Some("map")) {
        if let Some(v) = section.get("fit_padding") {
            config.map.fit_padding =
                parse_value("map", "fit_padding", v, "must be a non-negative integer (pixels)")?;
        }
        if let Some(v) = section.get("fit_duration") {
            config.map.fit_duration = parse_value(
                "map",
                "fit_duration",
                v,
                "must be a non-negative integer (milliseconds)",
            )?;
        }
        if let Some(v) = section.get("default_zoom") {
            config.map.default_zoom = parse_zoom("map", "default_zoom", v)?;
        }
    }

    // [gpsd] section
    if let Some(section) = ini.section(Some("gpsd")) {
        if let Some(v) = non_empty(section, "host") {
            config.gpsd.host = v.to_string();
        }
        if let Some(v) = section.get("port") {
            config.gpsd.port = parse_in_range(
                "gpsd",
                "port",
                v,
                1..=u16::MAX,
                "must be a port number between 1 and 65535",
            )?;
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_in_range<T: FromStr + PartialOrd>(
    section: &str,
    key: &str,
    value: &str,
    range: RangeInclusive<T>,
    reason: &str,
) -> Result<T, ConfigFileError> {
    let parsed: T = parse_value(section, key, value, reason)?;
    if range.contains(&parsed) {
        Ok(parsed)
    } else {
        Err(invalid(section, key, value, reason))
    }
}

fn parse_zoom(section: &str, key: &str, value: &str) -> Result<f64, ConfigFileError> {
    let reason = "must be a zoom level between 0 and 22";
    let zoom: f64 = parse_value(section, key, value, reason)?;
    if (MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
        Ok(zoom)
    } else {
        Err(invalid(section, key, value, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_full_file() {
        let config = parse(
            r#"
[backend]
url = https://routes.example.com/api/
token = abc123
request_timeout = 20

[tracking]
reliability_threshold = 80
first_fix_zoom = 17.5

[map]
fit_padding = 24
fit_duration = 0
default_zoom = 11

[gpsd]
host = gps.local
port = 3000
"#,
        )
        .unwrap();

        assert_eq!(
            config.backend.url.as_deref(),
            Some("https://routes.example.com/api")
        );
        assert_eq!(config.backend.token.as_deref(), Some("abc123"));
        assert_eq!(config.backend.request_timeout, 20);
        assert_eq!(config.tracking.reliability_threshold, 80.0);
        assert_eq!(config.tracking.first_fix_zoom, 17.5);
        assert_eq!(config.map.fit_padding, 24);
        assert_eq!(config.map.fit_duration, 0);
        assert_eq!(config.map.default_zoom, 11.0);
        assert_eq!(config.gpsd.host, "gps.local");
        assert_eq!(config.gpsd.port, 3000);
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = parse("[backend]\nurl =\ntoken =   \n").unwrap();
        assert!(config.backend.url.is_none());
        assert!(config.backend.token.is_none());
    }

    #[test]
    fn test_timeout_out_of_range() {
        let err = parse("[backend]\nrequest_timeout = 0\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue { section, key, value, .. } => {
                assert_eq!(section, "backend");
                assert_eq!(key, "request_timeout");
                assert_eq!(value, "0");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(parse("[backend]\nrequest_timeout = 121\n").is_err());
        assert!(parse("[backend]\nrequest_timeout = soon\n").is_err());
        assert!(parse("[backend]\nrequest_timeout = 120\n").is_ok());
    }

    #[test]
    fn test_rejects_bad_url() {
        let err = parse("[backend]\nurl = ftp://example.com\n").unwrap_err();
        assert!(err.to_string().contains("backend.url"));
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        assert!(parse("[tracking]\nreliability_threshold = 0\n").is_err());
        assert!(parse("[tracking]\nreliability_threshold = -5\n").is_err());
        assert!(parse("[tracking]\nreliability_threshold = NaN\n").is_err());
    }

    #[test]
    fn test_rejects_zoom_out_of_range() {
        assert!(parse("[tracking]\nfirst_fix_zoom = 23\n").is_err());
        assert!(parse("[map]\ndefault_zoom = -1\n").is_err());
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(parse("[gpsd]\nport = 0\n").is_err());
        assert!(parse("[gpsd]\nport = 70000\n").is_err());
    }
}
