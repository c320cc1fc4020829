//! Routing backend capability.

use std::future::Future;

use crate::coord::LonLat;

use super::error::BackendError;
use super::request::RouteRequest;
use super::response::RouteResponse;

/// Geocoding and route computation collaborator.
///
/// Implementations are cloned into the task that runs one route request, so
/// they should be cheap to clone (share connection pools behind an `Arc`).
pub trait RoutingBackend: Clone + Send + Sync + 'static {
    /// Resolve a free-text address.
    fn geocode(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<LonLat, BackendError>> + Send;

    /// Compute a route between two resolved points.
    fn compute_route(
        &self,
        request: &RouteRequest,
    ) -> impl Future<Output = Result<RouteResponse, BackendError>> + Send;
}
