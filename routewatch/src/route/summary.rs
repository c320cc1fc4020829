//! Best-effort route summary extraction.
//!
//! Routing backends put distance/duration in different places depending on
//! the provider and on whether optimisation ran. [`extract_summary`] tries
//! the known shapes in a fixed order and falls back to a recursive search.
//! A missing summary is never an error: unknown fields display as `N/A`.

use std::fmt;

use serde_json::Value;

/// Distance and duration of a route, each possibly unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteSummary {
    /// Meters.
    pub distance_m: Option<f64>,
    /// Seconds.
    pub duration_s: Option<f64>,
}

impl RouteSummary {
    pub fn new(distance_m: Option<f64>, duration_s: Option<f64>) -> Self {
        Self {
            distance_m,
            duration_s,
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    /// True if at least one field is known.
    pub fn is_known(&self) -> bool {
        self.distance_m.is_some() || self.duration_s.is_some()
    }

    /// Fill unknown fields from `fallback`.
    pub fn or(self, fallback: RouteSummary) -> Self {
        Self {
            distance_m: self.distance_m.or(fallback.distance_m),
            duration_s: self.duration_s.or(fallback.duration_s),
        }
    }

    /// Read `{distance, duration}` from a JSON object.
    pub fn from_object(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let summary = Self {
            distance_m: object.get("distance").and_then(as_number),
            duration_s: object.get("duration").and_then(as_number),
        };
        summary.is_known().then_some(summary)
    }

    /// Distance in kilometres, two decimals.
    pub fn distance_label(&self) -> String {
        match self.distance_m {
            Some(m) => format!("{:.2} km", m / 1000.0),
            None => "N/A".to_string(),
        }
    }

    /// Duration in whole minutes.
    pub fn duration_label(&self) -> String {
        match self.duration_s {
            Some(s) => format!("{:.0} min", (s / 60.0).round()),
            None => "N/A".to_string(),
        }
    }
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Distance: {} | Duration: {}",
            self.distance_label(),
            self.duration_label()
        )
    }
}

/// Extract a summary from a raw routing response.
///
/// Order of precedence:
/// 1. top-level route summary (`routes[0].summary`, then `summary`)
/// 2. the first feature with `properties.summary`
/// 3. the first feature with `properties.segments[0]`
/// 4. any nested object carrying `distance`/`duration`
pub fn extract_summary(response: &Value) -> RouteSummary {
    top_level(response)
        .or_else(|| feature_properties(response))
        .or_else(|| segment_summary(response))
        .or_else(|| search(response, 0))
        .unwrap_or_default()
}

fn top_level(response: &Value) -> Option<RouteSummary> {
    response
        .pointer("/routes/0/summary")
        .and_then(RouteSummary::from_object)
        .or_else(|| response.get("summary").and_then(RouteSummary::from_object))
}

fn features(response: &Value) -> impl Iterator<Item = &Value> {
    response
        .get("features")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn feature_properties(response: &Value) -> Option<RouteSummary> {
    features(response).find_map(|feature| {
        feature
            .pointer("/properties/summary")
            .and_then(RouteSummary::from_object)
    })
}

fn segment_summary(response: &Value) -> Option<RouteSummary> {
    features(response)
        .find_map(|feature| {
            feature
                .pointer("/properties/segments/0")
                .and_then(RouteSummary::from_object)
        })
        .or_else(|| {
            response
                .pointer("/routes/0/segments/0")
                .and_then(RouteSummary::from_object)
        })
}

/// Nesting limit for the recursive search.
const MAX_SEARCH_DEPTH: usize = 16;

fn search(value: &Value, depth: usize) -> Option<RouteSummary> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }
    match value {
        Value::Object(object) => RouteSummary::from_object(value).or_else(|| {
            object
                .iter()
                // Geometry arrays are large and never carry a summary.
                .filter(|(key, _)| key.as_str() != "coordinates")
                .find_map(|(_, child)| search(child, depth + 1))
        }),
        Value::Array(items) => items.iter().find_map(|child| search(child, depth + 1)),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite() && *v >= 0.0)
}
