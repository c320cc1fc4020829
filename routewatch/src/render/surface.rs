//! Map Render Surface - session semantics on top of a [`MapWidget`].
//!
//! Owns the lifecycle of every feature the session draws:
//!
//! - position marker and accuracy circle (created once, then moved in place)
//! - origin/destination markers (replaced per request, deferred until ready)
//! - the route overlay: base line, traffic segments, incidents
//!
//! At most one overlay is live. [`RenderSurface::draw_route`] tears the old
//! one down before drawing, and every clear operation tolerates features that
//! were already removed underneath it.

use tracing::{debug, info, trace};

use crate::coord::{Extent, LonLat};
use crate::position::{Position, PositionStore};
use crate::route::{RouteResponse, RouteSummary};

use super::feature::{Feature, FeatureId, FeatureRole, Geometry};
use super::style::Style;
use super::widget::{FitOptions, MapWidget};

/// Rendering preconditions that can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("map is not ready yet")]
    NotReady,

    #[error("origin and destination coordinates are not set")]
    MissingCoordinates,

    #[error("response contains no drawable route geometry")]
    EmptyRoute,
}

/// Viewport options used when fitting a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceOptions {
    pub fit: FitOptions,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            fit: FitOptions {
                padding: 50,
                duration_ms: 1000,
            },
        }
    }
}

/// Result of [`RenderSurface::draw_endpoint_markers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerDraw {
    Drawn,
    /// Map not ready; markers will be drawn by [`RenderSurface::mark_ready`].
    Deferred,
}

/// What [`RenderSurface::draw_route`] put on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnRoute {
    /// Summary derivable from the drawn features (properties, then geometry).
    pub summary: RouteSummary,
    pub route_lines: usize,
    pub traffic_segments: usize,
    pub incidents: usize,
    pub extent: Extent,
}

#[derive(Debug, Default)]
struct Overlay {
    lines: Vec<FeatureId>,
    segments: Vec<FeatureId>,
    incidents: Vec<FeatureId>,
}

impl Overlay {
    fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.segments.is_empty() && self.incidents.is_empty()
    }

    fn drain(&mut self) -> impl Iterator<Item = FeatureId> + '_ {
        self.lines
            .drain(..)
            .chain(self.segments.drain(..))
            .chain(self.incidents.drain(..))
    }
}

/// Session view of the map.
pub struct RenderSurface<W: MapWidget> {
    widget: W,
    options: SurfaceOptions,
    ready: bool,
    marker: Option<FeatureId>,
    circle: Option<FeatureId>,
    origin: Option<FeatureId>,
    destination: Option<FeatureId>,
    pending_markers: bool,
    overlay: Overlay,
}

impl<W: MapWidget> RenderSurface<W> {
    /// Surface over a widget that has not signalled readiness yet.
    pub fn new(widget: W, options: SurfaceOptions) -> Self {
        Self {
            widget,
            options,
            ready: false,
            marker: None,
            circle: None,
            origin: None,
            destination: None,
            pending_markers: false,
            overlay: Overlay::default(),
        }
    }

    /// Surface over a widget that is usable immediately.
    pub fn ready(widget: W, options: SurfaceOptions) -> Self {
        let mut surface = Self::new(widget, options);
        surface.ready = true;
        surface
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    /// Consume the one-shot ready signal and flush deferred marker draws.
    ///
    /// Returns true if deferred markers were drawn. Repeated signals are
    /// ignored.
    pub fn mark_ready(&mut self, store: &PositionStore) -> bool {
        if self.ready {
            return false;
        }
        self.ready = true;
        info!("Map ready");

        if std::mem::take(&mut self.pending_markers) {
            return matches!(self.draw_endpoint_markers(store), Ok(MarkerDraw::Drawn));
        }
        false
    }

    // ---- position marker ----

    /// Create or move the position marker and accuracy circle.
    ///
    /// Returns true if the marker was created by this call.
    pub fn upsert_position_marker(&mut self, position: &Position) -> Result<bool, RenderError> {
        if !self.ready {
            return Err(RenderError::NotReady);
        }

        let point = position.point();
        let circle = Geometry::Circle {
            center: point,
            radius_m: position.accuracy.meters(),
        };

        let moved = match (self.marker, self.circle) {
            (Some(marker), Some(circle_id)) => {
                self.widget.update_geometry(marker, Geometry::Point(point))
                    && self.widget.update_geometry(circle_id, circle.clone())
            }
            _ => false,
        };
        if moved {
            trace!(lat = position.lat, lon = position.lon, "Position marker moved");
            return Ok(false);
        }

        // First fix of the session, or the features were removed externally.
        self.remove_position_marker();
        self.circle = Some(self.widget.add_feature(Feature::new(
            FeatureRole::AccuracyCircle,
            circle,
            Style::accuracy_circle(),
        )));
        self.marker = Some(self.widget.add_feature(
            Feature::new(
                FeatureRole::PositionMarker,
                Geometry::Point(point),
                Style::position_marker(),
            )
            .with_label("You are here"),
        ));
        debug!(lat = position.lat, lon = position.lon, "Position marker created");
        Ok(true)
    }

    /// Remove the position marker and accuracy circle, if present.
    pub fn remove_position_marker(&mut self) {
        for id in [self.marker.take(), self.circle.take()].into_iter().flatten() {
            self.widget.remove_feature(id);
        }
    }

    /// Center the view on `point`, zooming in to at least `min_zoom`.
    pub fn center_on(&mut self, point: LonLat, min_zoom: Option<f64>) {
        let current = self.widget.view().zoom;
        let zoom = min_zoom.map_or(current, |floor| current.max(floor));
        self.widget.set_view(point, zoom);
    }

    // ---- endpoint markers ----

    /// Draw origin and destination markers from the stored coordinates,
    /// replacing any previous ones.
    pub fn draw_endpoint_markers(
        &mut self,
        store: &PositionStore,
    ) -> Result<MarkerDraw, RenderError> {
        let pair = *store.route().ok_or(RenderError::MissingCoordinates)?;

        if !self.ready {
            self.pending_markers = true;
            debug!("Map not ready, deferring endpoint markers");
            return Ok(MarkerDraw::Deferred);
        }

        self.clear_endpoint_markers();
        self.origin = Some(self.widget.add_feature(
            Feature::new(
                FeatureRole::Origin,
                Geometry::Point(pair.origin),
                Style::origin_marker(),
            )
            .with_label(format!("Origin ({})", pair.origin)),
        ));
        self.destination = Some(self.widget.add_feature(
            Feature::new(
                FeatureRole::Destination,
                Geometry::Point(pair.destination),
                Style::destination_marker(),
            )
            .with_label(format!("Destination ({})", pair.destination)),
        ));
        Ok(MarkerDraw::Drawn)
    }

    pub fn clear_endpoint_markers(&mut self) {
        self.pending_markers = false;
        for id in [self.origin.take(), self.destination.take()]
            .into_iter()
            .flatten()
        {
            self.widget.remove_feature(id);
        }
    }

    // ---- route overlay ----

    /// Replace the route overlay with `response`.
    ///
    /// The previous overlay is always removed first, even if the new response
    /// turns out to be undrawable.
    pub fn draw_route(&mut self, response: &RouteResponse) -> Result<DrawnRoute, RenderError> {
        if !self.ready {
            return Err(RenderError::NotReady);
        }
        self.clear_overlay();

        let has_segments = response.traffic_segments().next().is_some();
        let mut extent: Option<Extent> = None;
        let mut grow = |geometry: &Geometry| {
            if let Some(e) = geometry.extent() {
                extent = Some(match extent {
                    Some(mut current) => {
                        current.merge(&e);
                        current
                    }
                    None => e,
                });
            }
        };

        let mut derived = RouteSummary::unknown();
        for line in response.route_lines() {
            let geometry = Geometry::LineString(line.points.clone());
            grow(&geometry);

            let color = line
                .optimization
                .as_ref()
                .and_then(|o| o.route_color.as_deref());
            let style = Style::route_line(color, !has_segments);
            self.overlay
                .lines
                .push(self.widget.add_feature(Feature::new(FeatureRole::RouteLine, geometry, style)));

            let from_geometry =
                RouteSummary::new(Some(LonLat::path_length_m(&line.points)), None);
            if !derived.is_known() {
                derived = line.summary.unwrap_or_default().or(from_geometry);
            }
        }

        for segment in response.traffic_segments() {
            let geometry = Geometry::LineString(segment.points.clone());
            grow(&geometry);
            let feature = Feature::new(
                FeatureRole::TrafficSegment,
                geometry,
                Style::traffic_segment(&segment.color),
            )
            .with_label(format!("Traffic: {}", segment.status));
            self.overlay.segments.push(self.widget.add_feature(feature));
        }

        for incident in response.incidents() {
            let geometry = Geometry::Point(incident.point);
            grow(&geometry);
            let feature = Feature::new(
                FeatureRole::Incident,
                geometry,
                Style::incident(incident.severity),
            )
            .with_label(incident.label());
            self.overlay.incidents.push(self.widget.add_feature(feature));
        }

        let drawn_extent = response.bbox.or(extent);
        let Some(drawn_extent) = drawn_extent.filter(|_| !self.overlay.lines.is_empty() || has_segments)
        else {
            self.clear_overlay();
            return Err(RenderError::EmptyRoute);
        };

        self.widget.fit_extent(drawn_extent, self.options.fit);

        let drawn = DrawnRoute {
            summary: derived,
            route_lines: self.overlay.lines.len(),
            traffic_segments: self.overlay.segments.len(),
            incidents: self.overlay.incidents.len(),
            extent: drawn_extent,
        };
        info!(
            route_lines = drawn.route_lines,
            traffic_segments = drawn.traffic_segments,
            incidents = drawn.incidents,
            "Route overlay drawn"
        );
        Ok(drawn)
    }

    pub fn has_overlay(&self) -> bool {
        !self.overlay.is_empty()
    }

    /// Remove route line, traffic segments and incidents.
    pub fn clear_overlay(&mut self) {
        let ids: Vec<FeatureId> = self.overlay.drain().collect();
        let mut missing = 0usize;
        for id in ids {
            if !self.widget.remove_feature(id) {
                missing += 1;
            }
        }
        if missing > 0 {
            trace!(missing, "Overlay features were already removed");
        }
    }

    /// Remove the overlay and endpoint markers and forget the stored route
    /// coordinates. Safe to call repeatedly.
    pub fn clear_all(&mut self, store: &mut PositionStore) {
        self.clear_overlay();
        self.clear_endpoint_markers();
        store.clear_route();
    }
}
