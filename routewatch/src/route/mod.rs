//! Route computation and overlay orchestration.
//!
//! - [`RoutingBackend`] - capability interface for geocoding and routing
//!   ([`HttpBackend`])
//! - [`RouteResponse`] - routing result decoded into a closed feature set
//! - [`RouteOrchestrator`] - input resolution, request lifecycle, rendering

mod backend;
mod error;
mod http;
mod orchestrator;
mod request;
mod response;
mod summary;

pub use backend::RoutingBackend;
pub use error::{BackendError, Endpoint, RouteError};
pub use http::{classify_failure, HttpBackend, HttpBackendConfig, DEFAULT_HTTP_TIMEOUT};
pub use orchestrator::{
    RouteConfig, RouteEvent, RouteOrchestrator, RouteOutcome, RouteProgress, RouteSink,
    DEFAULT_ROUTE_TIMEOUT,
};
pub use request::{
    validate_address, Constraints, PlaceInput, RouteCommand, RouteRequest, WirePoint, GPS_TOKEN,
    MAX_ADDRESS_LEN, MIN_ADDRESS_LEN,
};
pub use response::{
    traffic_level_for, Incident, Optimization, RouteFeature, RouteLine, RouteLineKind,
    RouteResponse, TrafficSegment,
};
pub use summary::{extract_summary, RouteSummary};
