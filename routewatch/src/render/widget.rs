//! Map widget capability.
//!
//! [`MapWidget`] is the low-level drawing surface: a feature collection plus
//! a viewport. The render surface builds all session semantics on top of it;
//! implementations only store and display what they are given.

use crate::coord::{Extent, LonLat};

use super::feature::{Feature, FeatureId, Geometry};

/// Current viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    /// `None` until the view is first positioned.
    pub center: Option<LonLat>,
    pub zoom: f64,
}

/// Options for fitting the viewport to an extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Padding in pixels on every side.
    pub padding: u32,
    /// Animation duration in milliseconds.
    pub duration_ms: u32,
}

/// A map widget holding features and a viewport.
pub trait MapWidget: Send {
    /// Add a feature and return its id.
    fn add_feature(&mut self, feature: Feature) -> FeatureId;

    /// Replace the geometry of a feature in place.
    ///
    /// Returns false if the feature does not exist.
    fn update_geometry(&mut self, id: FeatureId, geometry: Geometry) -> bool;

    /// Remove a feature. Returns false if it was already gone.
    fn remove_feature(&mut self, id: FeatureId) -> bool;

    fn view(&self) -> View;

    /// Move the viewport.
    fn set_view(&mut self, center: LonLat, zoom: f64);

    /// Fit the viewport to an extent.
    fn fit_extent(&mut self, extent: Extent, options: FitOptions);
}
