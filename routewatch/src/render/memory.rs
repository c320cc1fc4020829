//! Headless in-memory map widget.
//!
//! Stores features and viewport changes without drawing anything. Used by the
//! CLI (which prints what would be on screen) and by tests, which inspect the
//! feature collection and the viewport history.

use std::collections::BTreeMap;

use crate::coord::{Extent, LonLat};

use super::feature::{Feature, FeatureId, FeatureRole, Geometry};
use super::widget::{FitOptions, MapWidget, View};

/// Initial zoom of a fresh map.
pub const DEFAULT_ZOOM: f64 = 13.0;

/// In-memory [`MapWidget`].
#[derive(Debug, Clone)]
pub struct MemoryMap {
    features: BTreeMap<FeatureId, Feature>,
    next_id: u64,
    view: View,
    added: u64,
    view_changes: u64,
    fits: Vec<(Extent, FitOptions)>,
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::with_zoom(DEFAULT_ZOOM)
    }
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zoom(zoom: f64) -> Self {
        Self {
            features: BTreeMap::new(),
            next_id: 1,
            view: View { center: None, zoom },
            added: 0,
            view_changes: 0,
            fits: Vec::new(),
        }
    }

    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(&id)
    }

    /// All live features in id order.
    pub fn features(&self) -> impl Iterator<Item = (FeatureId, &Feature)> {
        self.features.iter().map(|(id, feature)| (*id, feature))
    }

    pub fn features_with_role(&self, role: FeatureRole) -> Vec<(FeatureId, &Feature)> {
        self.features()
            .filter(|(_, feature)| feature.role == role)
            .collect()
    }

    pub fn count_role(&self, role: FeatureRole) -> usize {
        self.features.values().filter(|f| f.role == role).count()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Total number of `add_feature` calls since creation.
    pub fn added_total(&self) -> u64 {
        self.added
    }

    /// Number of `set_view` calls since creation.
    pub fn view_changes(&self) -> u64 {
        self.view_changes
    }

    pub fn last_fit(&self) -> Option<&(Extent, FitOptions)> {
        self.fits.last()
    }

    pub fn fit_count(&self) -> usize {
        self.fits.len()
    }
}

impl MapWidget for MemoryMap {
    fn add_feature(&mut self, feature: Feature) -> FeatureId {
        let id = FeatureId::new(self.next_id);
        self.next_id += 1;
        self.added += 1;
        self.features.insert(id, feature);
        id
    }

    fn update_geometry(&mut self, id: FeatureId, geometry: Geometry) -> bool {
        match self.features.get_mut(&id) {
            Some(feature) => {
                feature.geometry = geometry;
                true
            }
            None => false,
        }
    }

    fn remove_feature(&mut self, id: FeatureId) -> bool {
        self.features.remove(&id).is_some()
    }

    fn view(&self) -> View {
        self.view
    }

    fn set_view(&mut self, center: LonLat, zoom: f64) {
        self.view = View {
            center: Some(center),
            zoom,
        };
        self.view_changes += 1;
    }

    fn fit_extent(&mut self, extent: Extent, options: FitOptions) {
        self.view.center = Some(extent.center());
        self.fits.push((extent, options));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::style::Style;

    fn marker(lon: f64, lat: f64) -> Feature {
        Feature::new(
            FeatureRole::Origin,
            Geometry::Point(LonLat { lon, lat }),
            Style::origin_marker(),
        )
    }

    #[test]
    fn test_add_update_remove() {
        let mut map = MemoryMap::new();
        let id = map.add_feature(marker(1.0, 2.0));
        assert_eq!(map.len(), 1);

        assert!(map.update_geometry(id, Geometry::Point(LonLat { lon: 3.0, lat: 4.0 })));
        assert_eq!(
            map.feature(id).unwrap().geometry,
            Geometry::Point(LonLat { lon: 3.0, lat: 4.0 })
        );

        assert!(map.remove_feature(id));
        assert!(!map.remove_feature(id));
        assert!(!map.update_geometry(id, Geometry::Point(LonLat { lon: 0.0, lat: 0.0 })));
        assert!(map.is_empty());
        assert_eq!(map.added_total(), 1);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut map = MemoryMap::new();
        let first = map.add_feature(marker(1.0, 2.0));
        map.remove_feature(first);
        let second = map.add_feature(marker(1.0, 2.0));
        assert_ne!(first, second);
    }

    #[test]
    fn test_view_tracking() {
        let mut map = MemoryMap::new();
        assert_eq!(map.view().center, None);
        assert_eq!(map.view().zoom, DEFAULT_ZOOM);

        map.set_view(LonLat { lon: 1.0, lat: 2.0 }, 16.0);
        assert_eq!(map.view().zoom, 16.0);
        assert_eq!(map.view_changes(), 1);

        let extent = Extent::from_point(LonLat { lon: 5.0, lat: 6.0 });
        let options = FitOptions {
            padding: 50,
            duration_ms: 1000,
        };
        map.fit_extent(extent, options);
        assert_eq!(map.last_fit(), Some(&(extent, options)));
        assert_eq!(map.view().center, Some(LonLat { lon: 5.0, lat: 6.0 }));
    }
}
