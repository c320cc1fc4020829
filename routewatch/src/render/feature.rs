//! Map feature model.
//!
//! A [`Feature`] is one drawable item on the map: a geometry, the role it
//! plays in the session (position marker, route line, ...) and its style.
//! Roles decide which [`Layer`] a feature is drawn on.

use std::fmt;

use crate::coord::{Extent, LonLat};

use super::style::Style;

/// Identifier assigned by the map widget when a feature is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId(u64);

impl FeatureId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feature#{}", self.0)
    }
}

/// Feature geometry in WGS84 degrees.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(LonLat),
    LineString(Vec<LonLat>),
    /// Circle with a ground radius in meters.
    Circle { center: LonLat, radius_m: f64 },
}

impl Geometry {
    /// Degrees-based extent of the geometry. Circles contribute their center.
    pub fn extent(&self) -> Option<Extent> {
        match self {
            Geometry::Point(point) => Some(Extent::from_point(*point)),
            Geometry::LineString(points) => Extent::from_points(points),
            Geometry::Circle { center, .. } => Some(Extent::from_point(*center)),
        }
    }
}

/// Drawing layers, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Route,
    Traffic,
    Endpoints,
    Position,
    Incidents,
}

impl Layer {
    pub fn z_index(&self) -> u32 {
        match self {
            Layer::Route => 10,
            Layer::Traffic => 20,
            Layer::Endpoints => 30,
            Layer::Position => 40,
            Layer::Incidents => 50,
        }
    }
}

/// What a feature represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureRole {
    PositionMarker,
    AccuracyCircle,
    Origin,
    Destination,
    RouteLine,
    TrafficSegment,
    Incident,
}

impl FeatureRole {
    pub fn layer(&self) -> Layer {
        match self {
            FeatureRole::RouteLine => Layer::Route,
            FeatureRole::TrafficSegment => Layer::Traffic,
            FeatureRole::Origin | FeatureRole::Destination => Layer::Endpoints,
            FeatureRole::PositionMarker | FeatureRole::AccuracyCircle => Layer::Position,
            FeatureRole::Incident => Layer::Incidents,
        }
    }

    /// True for roles that belong to a route overlay.
    pub fn is_overlay(&self) -> bool {
        matches!(
            self,
            FeatureRole::RouteLine | FeatureRole::TrafficSegment | FeatureRole::Incident
        )
    }
}

/// A drawable map feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub role: FeatureRole,
    pub geometry: Geometry,
    pub style: Style,
    /// Optional hover/popup text.
    pub label: Option<String>,
}

impl Feature {
    pub fn new(role: FeatureRole, geometry: Geometry, style: Style) -> Self {
        Self {
            role,
            geometry,
            style,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn layer(&self) -> Layer {
        self.role.layer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_layers_sit_above_route() {
        assert!(FeatureRole::TrafficSegment.layer() > FeatureRole::RouteLine.layer());
        assert!(FeatureRole::Incident.layer() > FeatureRole::TrafficSegment.layer());
        assert!(FeatureRole::Incident.layer() > FeatureRole::PositionMarker.layer());
        assert!(Layer::Incidents.z_index() > Layer::Position.z_index());
    }

    #[test]
    fn test_overlay_roles() {
        assert!(FeatureRole::RouteLine.is_overlay());
        assert!(FeatureRole::Incident.is_overlay());
        assert!(!FeatureRole::Origin.is_overlay());
        assert!(!FeatureRole::PositionMarker.is_overlay());
    }

    #[test]
    fn test_geometry_extent() {
        let line = Geometry::LineString(vec![
            LonLat { lon: 1.0, lat: 2.0 },
            LonLat { lon: 3.0, lat: -1.0 },
        ]);
        let extent = line.extent().unwrap();
        assert_eq!(extent.min_lat, -1.0);
        assert_eq!(extent.max_lon, 3.0);
        assert!(Geometry::LineString(Vec::new()).extent().is_none());
    }
}
