//! Coordinate type definitions

use std::fmt;

use serde::{Deserialize, Serialize};

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A geographic point in WGS84 degrees.
///
/// Field order follows GeoJSON (`[lon, lat]`). Use [`LonLat::new`] for
/// validated construction from untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    /// Longitude in degrees (-180 to 180)
    pub lon: f64,
    /// Latitude in degrees (-90 to 90)
    pub lat: f64,
}

impl LonLat {
    /// Creates a validated point.
    pub fn new(lon: f64, lat: f64) -> Result<Self, CoordError> {
        if !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(CoordError::InvalidLatitude(lat));
        }
        if !(MIN_LON..=MAX_LON).contains(&lon) {
            return Err(CoordError::InvalidLongitude(lon));
        }
        Ok(Self { lon, lat })
    }

    /// Returns the point as a GeoJSON position `[lon, lat]`.
    #[inline]
    pub fn to_position(self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_m(&self, other: &LonLat) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_M * c
    }

    /// Total length in meters of a polyline.
    pub fn path_length_m(points: &[LonLat]) -> f64 {
        points.windows(2).map(|w| w[0].distance_m(&w[1])).sum()
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lon)
    }
}

/// Origin and destination of a single route request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatePair {
    pub origin: LonLat,
    pub destination: LonLat,
}

impl CoordinatePair {
    pub fn new(origin: LonLat, destination: LonLat) -> Self {
        Self {
            origin,
            destination,
        }
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Extent {
    /// Extent covering a single point.
    pub fn from_point(point: LonLat) -> Self {
        Self {
            min_lon: point.lon,
            min_lat: point.lat,
            max_lon: point.lon,
            max_lat: point.lat,
        }
    }

    /// Smallest extent covering every point, or `None` for an empty input.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a LonLat>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut extent = Self::from_point(*first);
        for point in iter {
            extent.include(*point);
        }
        Some(extent)
    }

    /// Builds an extent from a GeoJSON `bbox` array.
    ///
    /// Accepts the 2D form `[minLon, minLat, maxLon, maxLat]` and the 3D form
    /// `[minLon, minLat, minZ, maxLon, maxLat, maxZ]`. Degenerate all-zero
    /// boxes (emitted by some backends for empty routes) and boxes outside
    /// WGS84 range are treated as absent.
    pub fn from_bbox(bbox: &[f64]) -> Option<Self> {
        let (min_lon, min_lat, max_lon, max_lat) = match *bbox {
            [min_lon, min_lat, max_lon, max_lat] => (min_lon, min_lat, max_lon, max_lat),
            [min_lon, min_lat, _, max_lon, max_lat, _] => (min_lon, min_lat, max_lon, max_lat),
            _ => return None,
        };
        if bbox.iter().all(|v| *v == 0.0) {
            return None;
        }
        let lon_range = MIN_LON..=MAX_LON;
        let lat_range = MIN_LAT..=MAX_LAT;
        let in_range = lon_range.contains(&min_lon)
            && lon_range.contains(&max_lon)
            && lat_range.contains(&min_lat)
            && lat_range.contains(&max_lat);
        (in_range && min_lon <= max_lon && min_lat <= max_lat).then_some(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Grows the extent to include `point`.
    pub fn include(&mut self, point: LonLat) {
        self.min_lon = self.min_lon.min(point.lon);
        self.min_lat = self.min_lat.min(point.lat);
        self.max_lon = self.max_lon.max(point.lon);
        self.max_lat = self.max_lat.max(point.lat);
    }

    /// Grows the extent to include `other`.
    pub fn merge(&mut self, other: &Extent) {
        self.min_lon = self.min_lon.min(other.min_lon);
        self.min_lat = self.min_lat.min(other.min_lat);
        self.max_lon = self.max_lon.max(other.max_lon);
        self.max_lat = self.max_lat.max(other.max_lat);
    }

    pub fn center(&self) -> LonLat {
        LonLat {
            lon: (self.min_lon + self.max_lon) / 2.0,
            lat: (self.min_lat + self.max_lat) / 2.0,
        }
    }

    pub fn contains(&self, point: LonLat) -> bool {
        (self.min_lon..=self.max_lon).contains(&point.lon)
            && (self.min_lat..=self.max_lat).contains(&point.lat)
    }
}

/// Errors that can occur while validating or parsing coordinates
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordError {
    /// Latitude is outside valid range (-90 to 90)
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180 to 180)
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),
    /// Accuracy radius is negative or not a number
    #[error("Invalid accuracy: {0} (must be >= 0 meters)")]
    InvalidAccuracy(f64),
    /// Input looked like a coordinate pair but could not be read as one
    #[error("Could not read coordinates from '{0}'")]
    Unparsable(String),
}
