//! Decoded routing response.
//!
//! The backend answers with a GeoJSON `FeatureCollection`. Each feature is
//! classified once, here, into a closed [`RouteFeature`] set by its
//! `properties.feature_type` tag:
//!
//! | tag                                 | variant                          |
//! |-------------------------------------|----------------------------------|
//! | `route_reference`, `route_basic`    | [`RouteFeature::RouteLine`]      |
//! | `traffic_segment`                   | [`RouteFeature::TrafficSegment`] |
//! | `traffic_incident`                  | [`RouteFeature::Incident`]       |
//! | none, with `LineString` geometry    | [`RouteFeature::RouteLine`] (legacy) |
//!
//! Features with unknown tags or unusable geometry are skipped.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::coord::{Extent, LonLat};
use crate::render::{Severity, TrafficStatus};

use super::error::BackendError;
use super::summary::{extract_summary, RouteSummary};

/// Provenance of a route line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteLineKind {
    /// `route_reference`: optimised route, usually accompanied by segments.
    Reference,
    /// `route_basic`: plain routing result.
    Basic,
    /// Untagged `LineString`.
    Legacy,
}

/// Base route geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLine {
    pub kind: RouteLineKind,
    pub points: Vec<LonLat>,
    pub summary: Option<RouteSummary>,
    pub optimization: Option<Optimization>,
}

/// A two-point (or longer) coloured stretch of the route.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSegment {
    pub points: Vec<LonLat>,
    pub color: String,
    pub status: TrafficStatus,
    pub speed_ratio: Option<f64>,
}

/// A traffic incident marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub point: LonLat,
    pub severity: Severity,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub delay_seconds: Option<f64>,
}

impl Incident {
    /// Popup text.
    pub fn label(&self) -> String {
        let mut label = format!("[{}]", self.severity);
        if let Some(kind) = &self.kind {
            label.push(' ');
            label.push_str(kind);
        }
        if let Some(description) = &self.description {
            label.push_str(": ");
            label.push_str(description);
        }
        if let Some(delay) = self.delay_seconds.filter(|d| *d > 0.0) {
            label.push_str(&format!(" (+{:.0} min)", (delay / 60.0).ceil()));
        }
        label
    }
}

/// One classified feature.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteFeature {
    RouteLine(RouteLine),
    TrafficSegment(TrafficSegment),
    Incident(Incident),
}

/// AI/traffic optimisation block attached to the route line.
///
/// Fields are surfaced as provided; missing ones stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Optimization {
    pub enabled: bool,
    pub source: Option<String>,
    pub reasoning: Option<String>,
    pub weather: Option<String>,
    pub traffic_factor: Option<f64>,
    pub traffic_level: Option<String>,
    pub route_color: Option<String>,
}

impl Optimization {
    /// Textual traffic level, derived from `traffic_factor` when the backend
    /// did not send one.
    pub fn traffic_level(&self) -> Option<String> {
        self.traffic_level
            .clone()
            .filter(|level| !level.is_empty())
            .or_else(|| self.traffic_factor.map(|f| traffic_level_for(f).to_string()))
    }
}

impl fmt::Display for Optimization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.enabled {
            return write!(f, "Optimization: disabled");
        }
        write!(f, "Optimization: enabled")?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        if let Some(weather) = self.weather.as_deref().filter(|w| !w.is_empty()) {
            write!(f, "\nWeather: {}", weather)?;
        }
        if let Some(factor) = self.traffic_factor {
            write!(f, "\nTraffic factor: {:.2}", factor)?;
            if let Some(level) = self.traffic_level() {
                write!(f, " ({})", level)?;
            }
        }
        if let Some(reasoning) = self.reasoning.as_deref().filter(|r| !r.is_empty()) {
            write!(f, "\nReasoning: {}", reasoning)?;
        }
        Ok(())
    }
}

/// Traffic level label for a delay multiplier.
pub fn traffic_level_for(traffic_factor: f64) -> &'static str {
    if traffic_factor >= 2.0 {
        "severe"
    } else if traffic_factor >= 1.5 {
        "heavy"
    } else if traffic_factor >= 1.2 {
        "moderate"
    } else {
        "free"
    }
}

/// A decoded routing response.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    pub features: Vec<RouteFeature>,
    /// Response-level `bbox`, if present and non-degenerate.
    pub bbox: Option<Extent>,
    /// Best-effort summary of the whole response.
    pub summary: RouteSummary,
    /// The undecoded body.
    pub raw: Value,
}

impl RouteResponse {
    /// Decode a routing response body.
    pub fn from_value(raw: Value) -> Result<Self, BackendError> {
        let items = raw
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| BackendError::Decode("response has no features array".to_string()))?;

        let mut features = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match decode_feature(item) {
                Some(feature) => features.push(feature),
                None => debug!(index, "Skipping unrecognised route feature"),
            }
        }

        let bbox = raw
            .get("bbox")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_f64).collect::<Vec<_>>())
            .and_then(|values| Extent::from_bbox(&values));

        let summary = extract_summary(&raw);

        Ok(Self {
            features,
            bbox,
            summary,
            raw,
        })
    }

    pub fn route_lines(&self) -> impl Iterator<Item = &RouteLine> {
        self.features.iter().filter_map(|f| match f {
            RouteFeature::RouteLine(line) => Some(line),
            _ => None,
        })
    }

    pub fn traffic_segments(&self) -> impl Iterator<Item = &TrafficSegment> {
        self.features.iter().filter_map(|f| match f {
            RouteFeature::TrafficSegment(segment) => Some(segment),
            _ => None,
        })
    }

    pub fn incidents(&self) -> impl Iterator<Item = &Incident> {
        self.features.iter().filter_map(|f| match f {
            RouteFeature::Incident(incident) => Some(incident),
            _ => None,
        })
    }

    /// Optimisation block of the first route line carrying one.
    pub fn optimization(&self) -> Option<&Optimization> {
        self.route_lines().find_map(|line| line.optimization.as_ref())
    }
}

fn decode_feature(item: &Value) -> Option<RouteFeature> {
    let empty = Map::new();
    let properties = item
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let geometry = item.get("geometry")?;
    let geometry_type = geometry.get("type").and_then(Value::as_str)?;
    let coordinates = geometry.get("coordinates")?;

    let tag = properties.get("feature_type").and_then(Value::as_str);

    match (tag, geometry_type) {
        (Some("route_reference"), "LineString") => {
            decode_route_line(RouteLineKind::Reference, properties, coordinates)
        }
        (Some("route_basic"), "LineString") => {
            decode_route_line(RouteLineKind::Basic, properties, coordinates)
        }
        (Some("traffic_segment"), "LineString") => decode_segment(properties, coordinates),
        (Some("traffic_incident"), "Point") => decode_incident(properties, coordinates),
        (None, "LineString") => decode_route_line(RouteLineKind::Legacy, properties, coordinates),
        (tag, geometry_type) => {
            debug!(?tag, geometry_type, "Unsupported feature kind");
            None
        }
    }
}

fn decode_route_line(
    kind: RouteLineKind,
    properties: &Map<String, Value>,
    coordinates: &Value,
) -> Option<RouteFeature> {
    let points = decode_line(coordinates)?;
    let summary = properties.get("summary").and_then(RouteSummary::from_object);
    let optimization = properties.get("optimization").and_then(|value| {
        serde_json::from_value::<Optimization>(value.clone())
            .map_err(|e| warn!(error = %e, "Ignoring malformed optimization block"))
            .ok()
    });

    Some(RouteFeature::RouteLine(RouteLine {
        kind,
        points,
        summary,
        optimization,
    }))
}

fn decode_segment(properties: &Map<String, Value>, coordinates: &Value) -> Option<RouteFeature> {
    let points = decode_line(coordinates)?;
    let status = properties
        .get("status")
        .and_then(Value::as_str)
        .map(TrafficStatus::parse)
        .unwrap_or(TrafficStatus::Light);
    let color = properties
        .get("color")
        .and_then(Value::as_str)
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| status.default_color().to_string());

    Some(RouteFeature::TrafficSegment(TrafficSegment {
        points,
        color,
        status,
        speed_ratio: properties.get("speed_ratio").and_then(Value::as_f64),
    }))
}

fn decode_incident(properties: &Map<String, Value>, coordinates: &Value) -> Option<RouteFeature> {
    let point = decode_point(coordinates)?;
    let severity = properties
        .get("severity")
        .and_then(Value::as_str)
        .and_then(Severity::parse)
        .or_else(|| {
            properties
                .get("magnitude")
                .and_then(Value::as_u64)
                .map(Severity::from_magnitude)
        })
        .unwrap_or(Severity::Low);

    let text = |key: &str| {
        properties
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(RouteFeature::Incident(Incident {
        point,
        severity,
        kind: text("type"),
        description: text("description"),
        delay_seconds: properties
            .get("delay_seconds")
            .or_else(|| properties.get("delay"))
            .and_then(Value::as_f64),
    }))
}

fn decode_point(value: &Value) -> Option<LonLat> {
    let pair = value.as_array()?;
    if pair.len() < 2 {
        return None;
    }
    let lon = pair[0].as_f64()?;
    let lat = pair[1].as_f64()?;
    LonLat::new(lon, lat).ok()
}

/// A line needs at least two valid positions.
fn decode_line(value: &Value) -> Option<Vec<LonLat>> {
    let points = value
        .as_array()?
        .iter()
        .map(decode_point)
        .collect::<Option<Vec<_>>>()?;
    (points.len() >= 2).then_some(points)
}
