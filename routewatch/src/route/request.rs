//! Route request inputs and the wire request sent to the backend.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::coord::{parse_coordinates, LonLat};

use super::error::{Endpoint, RouteError};

/// Shortest accepted free-text address (after trimming).
pub const MIN_ADDRESS_LEN: usize = 3;

/// Longest accepted free-text address (after trimming).
pub const MAX_ADDRESS_LEN: usize = 500;

/// Token selecting the stored GPS fix as origin.
pub const GPS_TOKEN: &str = "GPS";

/// Routing preferences read from the UI at request time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Constraints {
    pub avoid: BTreeSet<String>,
    pub prefer: BTreeSet<String>,
}

impl Constraints {
    pub fn new<A, P>(avoid: A, prefer: P) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let clean = |values: Vec<String>| {
            values
                .into_iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect::<BTreeSet<_>>()
        };
        Self {
            avoid: clean(avoid.into_iter().map(Into::into).collect()),
            prefer: clean(prefer.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.avoid.is_empty() && self.prefer.is_empty()
    }
}

/// A route request as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteCommand {
    /// Address, `"lat, lon"`, `GPS`, or empty (same as `GPS`).
    pub origin: String,
    /// Address or `"lat, lon"`; mandatory.
    pub destination: String,
    pub constraints: Constraints,
}

impl RouteCommand {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            constraints: Constraints::default(),
        }
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
}

/// A classified endpoint input.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceInput {
    /// Use the stored GPS fix (origin only).
    Gps,
    Coordinates(LonLat),
    Address(String),
}

impl PlaceInput {
    /// Classify an origin field.
    pub fn origin(input: &str) -> Result<Self, RouteError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(GPS_TOKEN) {
            return Ok(PlaceInput::Gps);
        }
        Self::place(Endpoint::Origin, trimmed)
    }

    /// Classify a destination field.
    pub fn destination(input: &str) -> Result<Self, RouteError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(RouteError::EmptyDestination);
        }
        Self::place(Endpoint::Destination, trimmed)
    }

    fn place(endpoint: Endpoint, trimmed: &str) -> Result<Self, RouteError> {
        match parse_coordinates(trimmed) {
            Ok(Some(point)) => Ok(PlaceInput::Coordinates(point)),
            Ok(None) => validate_address(endpoint, trimmed).map(PlaceInput::Address),
            Err(source) => Err(RouteError::InvalidCoordinates { endpoint, source }),
        }
    }

    pub fn needs_geocoding(&self) -> bool {
        matches!(self, PlaceInput::Address(_))
    }
}

/// Trim and length-check a free-text address.
pub fn validate_address(endpoint: Endpoint, input: &str) -> Result<String, RouteError> {
    let trimmed = input.trim();
    let len = trimmed.chars().count();
    if (MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&len) {
        Ok(trimmed.to_string())
    } else {
        Err(RouteError::InvalidAddress {
            endpoint,
            min: MIN_ADDRESS_LEN,
            max: MAX_ADDRESS_LEN,
        })
    }
}

/// `{lat, lon}` as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WirePoint {
    pub lat: f64,
    pub lon: f64,
}

impl From<LonLat> for WirePoint {
    fn from(point: LonLat) -> Self {
        Self {
            lat: point.lat,
            lon: point.lon,
        }
    }
}

/// Body of a route computation request.
///
/// `coordinates` repeats origin and destination as GeoJSON positions for
/// backends that only read that field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRequest {
    pub origin: WirePoint,
    pub destination: WirePoint,
    pub coordinates: [[f64; 2]; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
}

impl RouteRequest {
    pub fn new(origin: LonLat, destination: LonLat, constraints: &Constraints) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            coordinates: [origin.to_position(), destination.to_position()],
            constraints: (!constraints.is_empty()).then(|| constraints.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_origin_classification() {
        assert_eq!(PlaceInput::origin("GPS").unwrap(), PlaceInput::Gps);
        assert_eq!(PlaceInput::origin(" gps ").unwrap(), PlaceInput::Gps);
        assert_eq!(PlaceInput::origin("").unwrap(), PlaceInput::Gps);
        assert_eq!(
            PlaceInput::origin("-23.5, -46.6").unwrap(),
            PlaceInput::Coordinates(LonLat { lon: -46.6, lat: -23.5 })
        );
        assert_eq!(
            PlaceInput::origin("Rua Augusta, 100").unwrap(),
            PlaceInput::Address("Rua Augusta, 100".to_string())
        );
    }

    #[test]
    fn test_destination_is_mandatory() {
        assert_eq!(
            PlaceInput::destination("   "),
            Err(RouteError::EmptyDestination)
        );
        // GPS is not a destination; it is treated as an address.
        assert_eq!(
            PlaceInput::destination("GPS").unwrap(),
            PlaceInput::Address("GPS".to_string())
        );
    }

    #[test]
    fn test_address_length_limits() {
        assert!(matches!(
            PlaceInput::destination("ab"),
            Err(RouteError::InvalidAddress { endpoint: Endpoint::Destination, .. })
        ));
        let long = "a".repeat(MAX_ADDRESS_LEN + 1);
        assert!(validate_address(Endpoint::Origin, &long).is_err());
        assert_eq!(
            validate_address(Endpoint::Origin, "  Av. Paulista  ").unwrap(),
            "Av. Paulista"
        );
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        assert!(matches!(
            PlaceInput::origin("95.0, 200.0"),
            Err(RouteError::InvalidCoordinates { endpoint: Endpoint::Origin, .. })
        ));
    }

    #[test]
    fn test_wire_request_shape() {
        let origin = LonLat { lon: -46.6, lat: -23.5 };
        let destination = LonLat { lon: -46.7, lat: -23.6 };

        let bare = RouteRequest::new(origin, destination, &Constraints::default());
        assert_eq!(
            serde_json::to_value(&bare).unwrap(),
            json!({
                "origin": {"lat": -23.5, "lon": -46.6},
                "destination": {"lat": -23.6, "lon": -46.7},
                "coordinates": [[-46.6, -23.5], [-46.7, -23.6]]
            })
        );

        let constraints = Constraints::new(["tolls", " ", "highways"], ["fastest"]);
        let with = RouteRequest::new(origin, destination, &constraints);
        let value = serde_json::to_value(&with).unwrap();
        assert_eq!(value["constraints"]["avoid"], json!(["highways", "tolls"]));
        assert_eq!(value["constraints"]["prefer"], json!(["fastest"]));
    }
}
