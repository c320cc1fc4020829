//! Core state types for device position tracking.
//!
//! - [`Accuracy`] - Reported accuracy radius in meters (lower is better)
//! - [`Position`] - Latest device fix with its accuracy and timestamp

use chrono::{DateTime, Utc};

use crate::coord::{CoordError, LonLat};

/// Accuracy radius of a fix in meters (lower is better).
///
/// Always non-negative; construction from sensor input goes through
/// [`Accuracy::new`].
///
/// # Ordering
///
/// Lower values indicate higher accuracy, so `Accuracy(10.0)` is "better"
/// than `Accuracy(200.0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accuracy(f64);

impl Accuracy {
    /// Fixes at or below this radius are trusted for recentring and routing.
    pub const RELIABILITY_THRESHOLD: Self = Self(150.0);

    /// Creates an accuracy value, rejecting negative and non-finite radii.
    pub fn new(meters: f64) -> Result<Self, CoordError> {
        if meters.is_finite() && meters >= 0.0 {
            Ok(Self(meters))
        } else {
            Err(CoordError::InvalidAccuracy(meters))
        }
    }

    /// Get the accuracy radius in meters.
    #[inline]
    pub fn meters(&self) -> f64 {
        self.0
    }

    /// Returns true if this fix is good enough under `threshold`.
    ///
    /// The threshold itself counts as reliable.
    #[inline]
    pub fn is_within(&self, threshold: Accuracy) -> bool {
        self.0 <= threshold.0
    }
}

impl std::fmt::Display for Accuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "±{:.0} m", self.0)
    }
}

/// Latest known device position.
///
/// Produced from sensor readings by the tracking controller; read by the
/// render surface (marker, accuracy circle) and the route orchestrator
/// (`GPS` origin).
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    /// Longitude in degrees.
    pub lon: f64,

    /// Latitude in degrees.
    pub lat: f64,

    /// Accuracy radius reported by the sensor.
    pub accuracy: Accuracy,

    /// When the sensor measured this fix.
    pub timestamp: DateTime<Utc>,
}

impl Position {
    /// Builds a validated position.
    pub fn new(
        lon: f64,
        lat: f64,
        accuracy_m: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, CoordError> {
        let point = LonLat::new(lon, lat)?;
        let accuracy = Accuracy::new(accuracy_m)?;
        Ok(Self {
            lon: point.lon,
            lat: point.lat,
            accuracy,
            timestamp,
        })
    }

    /// The fix as a plain point.
    #[inline]
    pub fn point(&self) -> LonLat {
        LonLat {
            lon: self.lon,
            lat: self.lat,
        }
    }

    /// Check if this fix is reliable under the given threshold.
    pub fn is_reliable(&self, threshold: Accuracy) -> bool {
        self.accuracy.is_within(threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_rejects_negative() {
        assert!(Accuracy::new(-1.0).is_err());
        assert!(Accuracy::new(f64::NAN).is_err());
        assert!(Accuracy::new(f64::INFINITY).is_err());
        assert_eq!(Accuracy::new(0.0).unwrap().meters(), 0.0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let threshold = Accuracy::RELIABILITY_THRESHOLD;
        assert!(Accuracy::new(150.0).unwrap().is_within(threshold));
        assert!(Accuracy::new(50.0).unwrap().is_within(threshold));
        assert!(!Accuracy::new(150.1).unwrap().is_within(threshold));
    }

    #[test]
    fn test_accuracy_display() {
        assert_eq!(Accuracy::new(42.4).unwrap().to_string(), "±42 m");
    }

    #[test]
    fn test_position_validation() {
        let now = Utc::now();
        assert!(Position::new(-46.6, -23.5, 12.0, now).is_ok());
        assert!(Position::new(-46.6, -95.0, 12.0, now).is_err());
        assert!(Position::new(-46.6, -23.5, -3.0, now).is_err());
    }

    #[test]
    fn test_position_reliability() {
        let now = Utc::now();
        let good = Position::new(-46.6, -23.5, 50.0, now).unwrap();
        let poor = Position::new(-46.6, -23.5, 200.0, now).unwrap();
        assert!(good.is_reliable(Accuracy::RELIABILITY_THRESHOLD));
        assert!(!poor.is_reliable(Accuracy::RELIABILITY_THRESHOLD));
        assert_eq!(good.point(), LonLat { lon: -46.6, lat: -23.5 });
    }
}
