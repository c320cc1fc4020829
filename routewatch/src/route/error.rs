//! Error types for route computation.
//!
//! [`BackendError`] describes what went wrong talking to the routing backend.
//! [`RouteError`] is what a route request ends with; its `Display` text is the
//! status line shown to the user.

use std::fmt;

use thiserror::Error;

use crate::coord::CoordError;
use crate::render::RenderError;

/// Errors returned by a [`RoutingBackend`](super::RoutingBackend).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// Authentication rejected (401/403).
    #[error("session expired (HTTP {status})")]
    SessionExpired { status: u16 },

    /// Geocoder found no match for the address.
    #[error("address not found: {0}")]
    NotFound(String),

    /// Non-success HTTP status with the provider's detail, if any.
    #[error("{}", http_message(.status, .detail))]
    Http { status: u16, detail: Option<String> },

    /// Connection failed before a response was received.
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the client timeout.
    #[error("request timed out")]
    Timeout,

    /// Response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

fn http_message(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!("{} (HTTP {})", detail, status),
        None => format!("HTTP {}", status),
    }
}

impl BackendError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, BackendError::SessionExpired { .. })
    }
}

/// Which end of the route an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Origin,
    Destination,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Origin => f.write_str("origin"),
            Endpoint::Destination => f.write_str("destination"),
        }
    }
}

/// Terminal outcome of a failed route request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("Please enter a destination")]
    EmptyDestination,

    #[error("The {endpoint} address must be between {min} and {max} characters")]
    InvalidAddress {
        endpoint: Endpoint,
        min: usize,
        max: usize,
    },

    #[error("Invalid {endpoint} coordinates: {source}")]
    InvalidCoordinates {
        endpoint: Endpoint,
        #[source]
        source: CoordError,
    },

    #[error("No GPS position yet. Start tracking or enter an origin address")]
    NoGpsFix,

    #[error("GPS precision too low (±{accuracy_m:.0} m). Wait for a better reading or enter an origin address")]
    UnreliableGps { accuracy_m: f64 },

    #[error("Could not find the {endpoint} address \"{address}\"")]
    AddressNotFound { endpoint: Endpoint, address: String },

    #[error("Could not resolve the {endpoint} address: {source}")]
    Geocoding {
        endpoint: Endpoint,
        #[source]
        source: BackendError,
    },

    #[error("Route calculation failed: {0}")]
    Routing(#[source] BackendError),

    #[error("Route calculation timed out after {secs} s")]
    Timeout { secs: u64 },

    #[error("A route is already being calculated, please wait")]
    Busy,

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Could not draw the route: {0}")]
    Render(#[from] RenderError),
}

impl RouteError {
    /// Route errors caused by the backend rejecting the session.
    pub fn from_backend(error: BackendError) -> Self {
        if error.is_session_expired() {
            RouteError::SessionExpired
        } else {
            RouteError::Routing(error)
        }
    }

    /// Map a geocoding failure to its user-facing class.
    pub fn from_geocoding(endpoint: Endpoint, address: &str, error: BackendError) -> Self {
        match error {
            BackendError::SessionExpired { .. } => RouteError::SessionExpired,
            BackendError::NotFound(_) => RouteError::AddressNotFound {
                endpoint,
                address: address.to_string(),
            },
            other => RouteError::Geocoding {
                endpoint,
                source: other,
            },
        }
    }

    /// Errors that are reported before any network request is issued.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RouteError::EmptyDestination
                | RouteError::InvalidAddress { .. }
                | RouteError::InvalidCoordinates { .. }
                | RouteError::NoGpsFix
                | RouteError::UnreliableGps { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message() {
        let with_detail = BackendError::Http {
            status: 502,
            detail: Some("Routing provider unavailable".into()),
        };
        assert_eq!(
            with_detail.to_string(),
            "Routing provider unavailable (HTTP 502)"
        );

        let bare = BackendError::Http {
            status: 500,
            detail: None,
        };
        assert_eq!(bare.to_string(), "HTTP 500");
    }

    #[test]
    fn test_geocoding_classification() {
        let not_found = RouteError::from_geocoding(
            Endpoint::Destination,
            "Nowhere 1",
            BackendError::NotFound("Nowhere 1".into()),
        );
        assert_eq!(
            not_found.to_string(),
            "Could not find the destination address \"Nowhere 1\""
        );

        let network = RouteError::from_geocoding(
            Endpoint::Origin,
            "Rua Augusta, 100",
            BackendError::Network("connection refused".into()),
        );
        assert!(matches!(network, RouteError::Geocoding { endpoint: Endpoint::Origin, .. }));

        let expired = RouteError::from_geocoding(
            Endpoint::Origin,
            "x",
            BackendError::SessionExpired { status: 401 },
        );
        assert_eq!(expired, RouteError::SessionExpired);
    }

    #[test]
    fn test_routing_classification() {
        assert_eq!(
            RouteError::from_backend(BackendError::SessionExpired { status: 403 }),
            RouteError::SessionExpired
        );
        assert!(matches!(
            RouteError::from_backend(BackendError::Timeout),
            RouteError::Routing(BackendError::Timeout)
        ));
    }

    #[test]
    fn test_unreliable_gps_message() {
        let error = RouteError::UnreliableGps { accuracy_m: 200.0 };
        assert!(error.to_string().contains("±200 m"));
        assert!(error.is_validation());
        assert!(!RouteError::Busy.is_validation());
    }
}
