//! Route Orchestrator - from user input to a drawn route overlay.
//!
//! # Sequencing
//!
//! ```text
//! request ─► clear overlay ─► validate inputs ─► spawn task
//!                                                 │ geocode addresses
//!                                                 ├──────────► RouteEvent::Resolved
//!                                                 │ compute route (bounded by timeout)
//!                                                 └──────────► RouteEvent::Computed | Failed
//! Resolved ─► persist coordinates ─► draw endpoint markers (deferred until ready)
//! Computed ─► draw route (deferred until ready) ─► summary status
//! Failed   ─► clear everything ─► error status
//! ```
//!
//! Every request gets a new generation number and every event carries the
//! generation of the request that produced it. Events whose generation is not
//! the latest are dropped without touching the map, so a `clear` or a newer
//! request arriving mid-computation can never be overwritten by an old
//! response.
//!
//! Only one request is in flight at a time; a second request while one is
//! running is rejected with [`RouteError::Busy`]. Each request task holds a
//! child of the orchestrator's [`CancellationToken`]; `clear`, a failure or
//! cancelling the parent stops it at its next await point.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coord::{CoordinatePair, LonLat};
use crate::position::{Accuracy, PositionStore};
use crate::render::{DrawnRoute, MapWidget, MarkerDraw, RenderSurface};
use crate::sink::EventSink;
use crate::status::{Status, StatusSink};

use super::backend::RoutingBackend;
use super::error::{Endpoint, RouteError};
use super::request::{Constraints, PlaceInput, RouteCommand, RouteRequest};
use super::response::{Optimization, RouteResponse};
use super::summary::RouteSummary;

/// Default bound on one whole request (geocoding plus routing).
pub const DEFAULT_ROUTE_TIMEOUT: Duration = Duration::from_secs(12);

/// Orchestrator settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteConfig {
    pub timeout: Duration,
    pub reliability_threshold: Accuracy,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_ROUTE_TIMEOUT,
            reliability_threshold: Accuracy::RELIABILITY_THRESHOLD,
        }
    }
}

/// Progress reported by a route task.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteEvent {
    Resolved {
        generation: u64,
        pair: CoordinatePair,
    },
    Computed {
        generation: u64,
        response: Box<RouteResponse>,
    },
    Failed {
        generation: u64,
        error: RouteError,
    },
}

impl RouteEvent {
    pub fn generation(&self) -> u64 {
        match self {
            RouteEvent::Resolved { generation, .. }
            | RouteEvent::Computed { generation, .. }
            | RouteEvent::Failed { generation, .. } => *generation,
        }
    }
}

/// Destination for route task events.
pub type RouteSink = EventSink<RouteEvent>;

/// A rendered route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOutcome {
    pub summary: RouteSummary,
    pub optimization: Option<Optimization>,
    pub drawn: DrawnRoute,
}

/// What handling a route event led to.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteProgress {
    /// Event from a superseded or cleared request; nothing changed.
    Stale,
    /// Coordinates stored; markers drawn or deferred.
    Resolved(MarkerDraw),
    /// Response held until the map signals readiness.
    AwaitingMap,
    Rendered(RouteOutcome),
    Failed(RouteError),
}

struct InFlight {
    generation: u64,
    cancellation: CancellationToken,
}

/// Drives route requests against a [`RoutingBackend`].
pub struct RouteOrchestrator<B: RoutingBackend> {
    backend: B,
    sink: RouteSink,
    config: RouteConfig,
    generation: u64,
    in_flight: Option<InFlight>,
    pending_render: Option<Box<RouteResponse>>,
    last_outcome: Option<RouteOutcome>,
    shutdown: CancellationToken,
}

impl<B: RoutingBackend> RouteOrchestrator<B> {
    pub fn new(backend: B, sink: RouteSink, config: RouteConfig) -> Self {
        Self {
            backend,
            sink,
            config,
            generation: 0,
            in_flight: None,
            pending_render: None,
            last_outcome: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Derive request cancellation from `parent`, so cancelling it stops
    /// every in-flight request.
    pub fn with_shutdown(mut self, parent: &CancellationToken) -> Self {
        self.shutdown = parent.child_token();
        self
    }

    pub fn config(&self) -> &RouteConfig {
        &self.config
    }

    /// Generation of the latest request (0 before any request).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Most recently rendered route, if it is still on the map.
    pub fn last_outcome(&self) -> Option<&RouteOutcome> {
        self.last_outcome.as_ref()
    }

    /// Start a route request.
    ///
    /// Validation failures are reported immediately and no task is spawned.
    /// On success the generation of the new request is returned; progress
    /// arrives later as [`RouteEvent`]s through the sink.
    pub fn request<W: MapWidget>(
        &mut self,
        command: &RouteCommand,
        store: &mut PositionStore,
        surface: &mut RenderSurface<W>,
        status: &mut dyn StatusSink,
    ) -> Result<u64, RouteError> {
        if let Some(in_flight) = &self.in_flight {
            debug!(
                generation = in_flight.generation,
                "Route request rejected, computation in flight"
            );
            status.report(Status::warning(RouteError::Busy.to_string()));
            return Err(RouteError::Busy);
        }

        self.generation += 1;
        let generation = self.generation;
        self.reset_overlay(store, surface);

        let (origin, destination) = match self.resolve_inputs(command, store) {
            Ok(inputs) => inputs,
            Err(error) => {
                info!(generation, error = %error, "Route request rejected");
                status.report(Status::error(error.to_string()));
                return Err(error);
            }
        };

        let geocoding = origin.needs_geocoding() || destination.needs_geocoding();
        info!(generation, geocoding, "Route request started");
        status.report(Status::info(if geocoding {
            "Looking up addresses..."
        } else {
            "Calculating route..."
        }));

        let cancellation = self.shutdown.child_token();
        tokio::spawn(run_request(
            self.backend.clone(),
            self.sink.clone(),
            generation,
            origin,
            destination,
            command.constraints.clone(),
            self.config.timeout,
            cancellation.clone(),
        ));
        self.in_flight = Some(InFlight {
            generation,
            cancellation,
        });

        Ok(generation)
    }

    /// Apply an event posted by a route task.
    pub fn handle_event<W: MapWidget>(
        &mut self,
        event: RouteEvent,
        store: &mut PositionStore,
        surface: &mut RenderSurface<W>,
        status: &mut dyn StatusSink,
    ) -> RouteProgress {
        if event.generation() != self.generation {
            debug!(
                event_generation = event.generation(),
                current = self.generation,
                "Discarding stale route event"
            );
            return RouteProgress::Stale;
        }

        match event {
            RouteEvent::Resolved { pair, .. } => {
                store.set_route(pair);
                match surface.draw_endpoint_markers(store) {
                    Ok(draw) => {
                        status.report(Status::info("Calculating route..."));
                        RouteProgress::Resolved(draw)
                    }
                    Err(e) => self.fail(RouteError::from(e), store, surface, status),
                }
            }
            RouteEvent::Computed { response, .. } => {
                self.in_flight = None;
                if surface.is_ready() {
                    self.render(response, store, surface, status)
                } else {
                    debug!(generation = self.generation, "Route computed before map ready");
                    self.pending_render = Some(response);
                    status.report(Status::info("Route calculated, waiting for the map..."));
                    RouteProgress::AwaitingMap
                }
            }
            RouteEvent::Failed { error, .. } => {
                self.in_flight = None;
                self.fail(error, store, surface, status)
            }
        }
    }

    /// Render a response that was held back because the map was not ready.
    pub fn on_map_ready<W: MapWidget>(
        &mut self,
        store: &mut PositionStore,
        surface: &mut RenderSurface<W>,
        status: &mut dyn StatusSink,
    ) -> Option<RouteProgress> {
        let response = self.pending_render.take()?;
        Some(self.render(response, store, surface, status))
    }

    /// Cancel any in-flight request and remove everything route-related.
    pub fn clear<W: MapWidget>(
        &mut self,
        store: &mut PositionStore,
        surface: &mut RenderSurface<W>,
        status: &mut dyn StatusSink,
    ) {
        self.generation += 1;
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancellation.cancel();
            debug!(generation = in_flight.generation, "In-flight route request cancelled");
        }
        self.reset_overlay(store, surface);
        status.report(Status::info("Route cleared"));
    }

    fn reset_overlay<W: MapWidget>(
        &mut self,
        store: &mut PositionStore,
        surface: &mut RenderSurface<W>,
    ) {
        self.pending_render = None;
        self.last_outcome = None;
        surface.clear_all(store);
    }

    fn resolve_inputs(
        &self,
        command: &RouteCommand,
        store: &PositionStore,
    ) -> Result<(PlaceInput, PlaceInput), RouteError> {
        let destination = PlaceInput::destination(&command.destination)?;
        let origin = match PlaceInput::origin(&command.origin)? {
            PlaceInput::Gps => {
                let position = store.position().ok_or(RouteError::NoGpsFix)?;
                if !position.is_reliable(self.config.reliability_threshold) {
                    return Err(RouteError::UnreliableGps {
                        accuracy_m: position.accuracy.meters(),
                    });
                }
                PlaceInput::Coordinates(position.point())
            }
            other => other,
        };
        Ok((origin, destination))
    }

    fn render<W: MapWidget>(
        &mut self,
        response: Box<RouteResponse>,
        store: &mut PositionStore,
        surface: &mut RenderSurface<W>,
        status: &mut dyn StatusSink,
    ) -> RouteProgress {
        match surface.draw_route(&response) {
            Ok(drawn) => {
                let outcome = RouteOutcome {
                    summary: response.summary.or(drawn.summary),
                    optimization: response.optimization().cloned(),
                    drawn,
                };
                info!(
                    generation = self.generation,
                    distance_m = outcome.summary.distance_m,
                    duration_s = outcome.summary.duration_s,
                    "Route rendered"
                );
                status.report(Status::success(format!("Route ready. {}", outcome.summary)));
                self.last_outcome = Some(outcome.clone());
                RouteProgress::Rendered(outcome)
            }
            Err(e) => self.fail(RouteError::from(e), store, surface, status),
        }
    }

    fn fail<W: MapWidget>(
        &mut self,
        error: RouteError,
        store: &mut PositionStore,
        surface: &mut RenderSurface<W>,
        status: &mut dyn StatusSink,
    ) -> RouteProgress {
        warn!(generation = self.generation, error = %error, "Route request failed");
        // Later events of the failed request must not redraw anything.
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancellation.cancel();
        }
        self.generation += 1;
        self.reset_overlay(store, surface);
        status.report(Status::error(error.to_string()));
        RouteProgress::Failed(error)
    }
}

/// Body of one spawned route request.
#[allow(clippy::too_many_arguments)]
async fn run_request<B: RoutingBackend>(
    backend: B,
    sink: RouteSink,
    generation: u64,
    origin: PlaceInput,
    destination: PlaceInput,
    constraints: Constraints,
    timeout: Duration,
    cancellation: CancellationToken,
) {
    let work = async {
        let origin = resolve(&backend, Endpoint::Origin, origin).await?;
        let destination = resolve(&backend, Endpoint::Destination, destination).await?;

        let pair = CoordinatePair::new(origin, destination);
        if !sink.deliver(RouteEvent::Resolved { generation, pair }) {
            return Ok(None);
        }

        let request = RouteRequest::new(origin, destination, &constraints);
        backend
            .compute_route(&request)
            .await
            .map(Some)
            .map_err(RouteError::from_backend)
    };

    let outcome = tokio::select! {
        biased;

        _ = cancellation.cancelled() => {
            debug!(generation, "Route request cancelled");
            return;
        }

        outcome = tokio::time::timeout(timeout, work) => outcome,
    };

    let event = match outcome {
        Ok(Ok(Some(response))) => RouteEvent::Computed {
            generation,
            response: Box::new(response),
        },
        Ok(Ok(None)) => return,
        Ok(Err(error)) => RouteEvent::Failed { generation, error },
        Err(_) => RouteEvent::Failed {
            generation,
            error: RouteError::Timeout {
                secs: timeout.as_secs(),
            },
        },
    };

    if !sink.deliver(event) {
        debug!(generation, "Session gone, dropping route result");
    }
}

async fn resolve<B: RoutingBackend>(
    backend: &B,
    endpoint: Endpoint,
    input: PlaceInput,
) -> Result<LonLat, RouteError> {
    match input {
        PlaceInput::Coordinates(point) => Ok(point),
        PlaceInput::Address(address) => {
            let point = backend
                .geocode(&address)
                .await
                .map_err(|e| RouteError::from_geocoding(endpoint, &address, e))?;
            debug!(%endpoint, lat = point.lat, lon = point.lon, "Address geocoded");
            Ok(point)
        }
        // GPS origins are resolved to coordinates before the task starts.
        PlaceInput::Gps => Err(RouteError::NoGpsFix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::render::{FeatureRole, MemoryMap, SurfaceOptions};
    use crate::route::BackendError;
    use crate::status::StatusLog;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct MockState {
        geocodes: HashMap<String, Result<LonLat, BackendError>>,
        route: Option<Result<RouteResponse, BackendError>>,
        geocode_calls: Vec<String>,
        route_calls: Vec<RouteRequest>,
        delay: Option<Duration>,
    }

    #[derive(Clone, Default)]
    struct MockBackend {
        state: Arc<Mutex<MockState>>,
    }

    impl MockBackend {
        fn with_route(response: RouteResponse) -> Self {
            let backend = Self::default();
            backend.state.lock().unwrap().route = Some(Ok(response));
            backend
        }

        fn geocodes(&self, address: &str, result: Result<LonLat, BackendError>) {
            self.state
                .lock()
                .unwrap()
                .geocodes
                .insert(address.to_string(), result);
        }

        fn delay(&self, delay: Duration) {
            self.state.lock().unwrap().delay = Some(delay);
        }

        fn geocode_calls(&self) -> Vec<String> {
            self.state.lock().unwrap().geocode_calls.clone()
        }

        fn route_calls(&self) -> usize {
            self.state.lock().unwrap().route_calls.len()
        }
    }

    impl RoutingBackend for MockBackend {
        async fn geocode(&self, address: &str) -> Result<LonLat, BackendError> {
            let mut state = self.state.lock().unwrap();
            state.geocode_calls.push(address.to_string());
            state
                .geocodes
                .get(address)
                .cloned()
                .unwrap_or_else(|| Err(BackendError::NotFound(address.to_string())))
        }

        async fn compute_route(
            &self,
            request: &RouteRequest,
        ) -> Result<RouteResponse, BackendError> {
            let (delay, result) = {
                let mut state = self.state.lock().unwrap();
                state.route_calls.push(request.clone());
                let result = state
                    .route
                    .clone()
                    .unwrap_or_else(|| Err(BackendError::Http { status: 500, detail: None }));
                (state.delay, result)
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }

    fn route_response(segments: usize) -> RouteResponse {
        let mut features = vec![json!({
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": [[-46.6, -23.5], [-46.7, -23.6]]},
            "properties": {"feature_type": "route_reference", "summary": {"distance": 15000.0, "duration": 1200.0}}
        })];
        for i in 0..segments {
            let lon = -46.6 - i as f64 * 0.01;
            features.push(json!({
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[lon, -23.5], [lon - 0.01, -23.51]]},
                "properties": {"feature_type": "traffic_segment", "color": "#FFFF00", "status": "moderate"}
            }));
        }
        RouteResponse::from_value(json!({"features": features})).unwrap()
    }

    struct Harness {
        routes: RouteOrchestrator<MockBackend>,
        backend: MockBackend,
        events: mpsc::UnboundedReceiver<RouteEvent>,
        store: PositionStore,
        surface: RenderSurface<MemoryMap>,
        status: StatusLog,
    }

    impl Harness {
        fn new(backend: MockBackend) -> Self {
            Self::with_shutdown(backend, &CancellationToken::new())
        }

        fn with_shutdown(backend: MockBackend, shutdown: &CancellationToken) -> Self {
            let (tx, events) = mpsc::unbounded_channel();
            Self {
                routes: RouteOrchestrator::new(
                    backend.clone(),
                    RouteSink::from_sender(tx),
                    RouteConfig::default(),
                )
                .with_shutdown(shutdown),
                backend,
                events,
                store: PositionStore::new(),
                surface: RenderSurface::ready(MemoryMap::new(), SurfaceOptions::default()),
                status: StatusLog::new(),
            }
        }

        fn request(&mut self, origin: &str, destination: &str) -> Result<u64, RouteError> {
            self.routes.request(
                &RouteCommand::new(origin, destination),
                &mut self.store,
                &mut self.surface,
                &mut self.status,
            )
        }

        async fn next(&mut self) -> RouteProgress {
            let event = self.events.recv().await.expect("route event");
            self.routes.handle_event(
                event,
                &mut self.store,
                &mut self.surface,
                &mut self.status,
            )
        }

        fn set_fix(&mut self, accuracy: f64) {
            self.store
                .set_position(Position::new(-46.6, -23.5, accuracy, Utc::now()).unwrap());
        }
    }

    #[tokio::test]
    async fn test_coordinate_inputs_skip_geocoding() {
        let mut h = Harness::new(MockBackend::with_route(route_response(0)));
        h.request("-23.5, -46.6", "-23.6, -46.7").unwrap();

        assert!(matches!(h.next().await, RouteProgress::Resolved(MarkerDraw::Drawn)));
        assert_eq!(
            h.store.origin(),
            Some(LonLat { lon: -46.6, lat: -23.5 })
        );
        let RouteProgress::Rendered(outcome) = h.next().await else {
            panic!("expected rendered route");
        };
        assert_eq!(outcome.summary.to_string(), "Distance: 15.00 km | Duration: 20 min");
        assert!(h.backend.geocode_calls().is_empty());
        assert!(!h.routes.is_busy());
        assert!(h.status.last().unwrap().text.starts_with("Route ready."));
    }

    #[tokio::test]
    async fn test_address_inputs_are_geocoded() {
        let backend = MockBackend::with_route(route_response(0));
        backend.geocodes("Rua Augusta, 100", Ok(LonLat { lon: -46.65, lat: -23.55 }));
        let mut h = Harness::new(backend);

        h.request("Rua Augusta, 100", "-23.6, -46.7").unwrap();
        assert!(matches!(h.next().await, RouteProgress::Resolved(_)));
        assert!(matches!(h.next().await, RouteProgress::Rendered(_)));
        assert_eq!(h.backend.geocode_calls(), vec!["Rua Augusta, 100".to_string()]);
    }

    #[tokio::test]
    async fn test_unreliable_gps_origin_is_rejected_without_request() {
        let mut h = Harness::new(MockBackend::with_route(route_response(0)));
        h.set_fix(200.0);

        let result = h.request("GPS", "-23.6, -46.7");
        assert!(matches!(result, Err(RouteError::UnreliableGps { .. })));
        assert!(!h.routes.is_busy());
        assert!(h.status.last().unwrap().text.contains("GPS precision too low"));

        tokio::task::yield_now().await;
        assert_eq!(h.backend.route_calls(), 0);
        assert!(h.backend.geocode_calls().is_empty());
    }

    #[tokio::test]
    async fn test_reliable_gps_origin_uses_stored_fix() {
        let mut h = Harness::new(MockBackend::with_route(route_response(0)));
        h.set_fix(50.0);

        h.request("GPS", "-23.6, -46.7").unwrap();
        assert!(matches!(h.next().await, RouteProgress::Resolved(_)));
        assert_eq!(h.store.origin(), Some(LonLat { lon: -46.6, lat: -23.5 }));
    }

    #[tokio::test]
    async fn test_gps_origin_without_fix() {
        let mut h = Harness::new(MockBackend::with_route(route_response(0)));
        assert_eq!(h.request("", "-23.6, -46.7"), Err(RouteError::NoGpsFix));
    }

    #[tokio::test]
    async fn test_empty_destination() {
        let mut h = Harness::new(MockBackend::with_route(route_response(0)));
        assert_eq!(
            h.request("-23.5, -46.6", "  "),
            Err(RouteError::EmptyDestination)
        );
        assert_eq!(h.status.last().unwrap().text, "Please enter a destination");
    }

    #[tokio::test]
    async fn test_second_request_while_in_flight_is_rejected() {
        let backend = MockBackend::with_route(route_response(1));
        backend.delay(Duration::from_millis(50));
        let mut h = Harness::new(backend);

        let first = h.request("-23.5, -46.6", "-23.6, -46.7").unwrap();
        assert_eq!(h.request("-23.5, -46.6", "-23.7, -46.8"), Err(RouteError::Busy));
        assert_eq!(h.routes.generation(), first);

        h.next().await;
        assert!(matches!(h.next().await, RouteProgress::Rendered(_)));
        assert_eq!(h.surface.widget().count_role(FeatureRole::RouteLine), 1);
        assert_eq!(h.backend.route_calls(), 1);
    }

    #[tokio::test]
    async fn test_clear_mid_computation_discards_result() {
        let backend = MockBackend::with_route(route_response(3));
        backend.delay(Duration::from_millis(20));
        let mut h = Harness::new(backend);

        let generation = h.request("-23.5, -46.6", "-23.6, -46.7").unwrap();
        assert!(matches!(h.next().await, RouteProgress::Resolved(_)));

        h.routes.clear(&mut h.store, &mut h.surface, &mut h.status);
        assert!(!h.routes.is_busy());
        assert!(h.surface.widget().is_empty());

        // A result from the cleared generation is dropped.
        let stale = RouteEvent::Computed {
            generation,
            response: Box::new(route_response(3)),
        };
        let progress = h
            .routes
            .handle_event(stale, &mut h.store, &mut h.surface, &mut h.status);
        assert_eq!(progress, RouteProgress::Stale);
        assert!(h.surface.widget().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_the_request_task() {
        let backend = MockBackend::with_route(route_response(2));
        backend.delay(Duration::from_secs(60));
        let mut h = Harness::new(backend);

        h.request("-23.5, -46.6", "-23.6, -46.7").unwrap();
        assert!(matches!(h.next().await, RouteProgress::Resolved(_)));
        h.routes.clear(&mut h.store, &mut h.surface, &mut h.status);

        // Past both the backend delay and the timeout: a live task would
        // have posted a Failed or Computed event by now.
        tokio::time::advance(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;
        assert!(h.events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_stops_in_flight_request() {
        let backend = MockBackend::with_route(route_response(1));
        backend.delay(Duration::from_secs(60));
        let shutdown = CancellationToken::new();
        let mut h = Harness::with_shutdown(backend, &shutdown);

        h.request("-23.5, -46.6", "-23.6, -46.7").unwrap();
        assert!(matches!(h.next().await, RouteProgress::Resolved(_)));
        shutdown.cancel();

        tokio::time::advance(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;
        assert!(h.events.try_recv().is_err());
        assert_eq!(h.backend.route_calls(), 1);
    }

    #[tokio::test]
    async fn test_geocoding_failure_clears_everything() {
        let backend = MockBackend::with_route(route_response(0));
        let mut h = Harness::new(backend);

        h.request("-23.5, -46.6", "Unknown Place").unwrap();
        let RouteProgress::Failed(error) = h.next().await else {
            panic!("expected failure");
        };
        assert!(matches!(error, RouteError::AddressNotFound { endpoint: Endpoint::Destination, .. }));
        assert!(h.store.route().is_none());
        assert!(h.surface.widget().is_empty());
        assert_eq!(h.backend.route_calls(), 0);
        assert!(!h.routes.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_route_timeout() {
        let backend = MockBackend::with_route(route_response(0));
        backend.delay(Duration::from_secs(60));
        let mut h = Harness::new(backend);

        h.request("-23.5, -46.6", "-23.6, -46.7").unwrap();
        assert!(matches!(h.next().await, RouteProgress::Resolved(_)));
        let RouteProgress::Failed(error) = h.next().await else {
            panic!("expected timeout");
        };
        assert_eq!(error, RouteError::Timeout { secs: 12 });
        assert!(h.status.last().unwrap().text.contains("timed out"));
        assert!(h.surface.widget().is_empty());
    }

    #[tokio::test]
    async fn test_session_expiry_is_classified() {
        let backend = MockBackend::default();
        backend.state.lock().unwrap().route =
            Some(Err(BackendError::SessionExpired { status: 401 }));
        let mut h = Harness::new(backend);

        h.request("-23.5, -46.6", "-23.6, -46.7").unwrap();
        h.next().await;
        assert_eq!(h.next().await, RouteProgress::Failed(RouteError::SessionExpired));
    }

    #[tokio::test]
    async fn test_render_waits_for_map() {
        let mut h = Harness::new(MockBackend::with_route(route_response(2)));
        h.surface = RenderSurface::new(MemoryMap::new(), SurfaceOptions::default());

        h.request("-23.5, -46.6", "-23.6, -46.7").unwrap();
        assert_eq!(h.next().await, RouteProgress::Resolved(MarkerDraw::Deferred));
        assert_eq!(h.next().await, RouteProgress::AwaitingMap);
        assert!(h.surface.widget().is_empty());

        assert!(h.surface.mark_ready(&h.store));
        let progress = h
            .routes
            .on_map_ready(&mut h.store, &mut h.surface, &mut h.status)
            .unwrap();
        assert!(matches!(progress, RouteProgress::Rendered(_)));
        let map = h.surface.widget();
        assert_eq!(map.count_role(FeatureRole::Origin), 1);
        assert_eq!(map.count_role(FeatureRole::TrafficSegment), 2);
    }
}
