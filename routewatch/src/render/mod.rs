//! Map rendering.
//!
//! - [`MapWidget`] - capability interface for the underlying map
//! - [`MemoryMap`] - headless widget
//! - [`RenderSurface`] - feature lifecycle for markers and route overlays

mod feature;
mod memory;
mod style;
mod surface;
mod widget;

pub use feature::{Feature, FeatureId, FeatureRole, Geometry, Layer};
pub use memory::{MemoryMap, DEFAULT_ZOOM};
pub use style::{Severity, Style, TrafficStatus, ROUTE_COLOR, TRANSPARENT};
pub use surface::{DrawnRoute, MarkerDraw, RenderError, RenderSurface, SurfaceOptions};
pub use widget::{FitOptions, MapWidget, View};
