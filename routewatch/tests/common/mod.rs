//! Shared fixtures for session integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use routewatch::coord::LonLat;
use routewatch::render::MemoryMap;
use routewatch::route::{
    BackendError, RouteCommand, RouteRequest, RouteResponse, RoutingBackend,
};
use routewatch::session::{HostMessage, Session, SessionConfig, SessionEvent, UiCommand};
use routewatch::status::StatusLog;
use routewatch::tracking::ScriptedGeolocation;

// ============================================================================
// Fake routing backend
// ============================================================================

#[derive(Default)]
struct BackendState {
    addresses: HashMap<String, LonLat>,
    routes: VecDeque<Result<RouteResponse, BackendError>>,
    delay: Option<Duration>,
    geocode_calls: Vec<String>,
    route_calls: Vec<RouteRequest>,
}

/// Routing backend answering from a script.
///
/// Route results are consumed in order; the last one is repeated once the
/// queue holds a single entry.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn knows(&self, address: &str, point: LonLat) -> &Self {
        self.lock().addresses.insert(address.to_string(), point);
        self
    }

    pub fn answers(&self, result: Result<RouteResponse, BackendError>) -> &Self {
        self.lock().routes.push_back(result);
        self
    }

    /// Delay every route computation.
    pub fn slow(&self, delay: Duration) -> &Self {
        self.lock().delay = Some(delay);
        self
    }

    pub fn geocode_calls(&self) -> Vec<String> {
        self.lock().geocode_calls.clone()
    }

    pub fn route_calls(&self) -> Vec<RouteRequest> {
        self.lock().route_calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }
}

impl RoutingBackend for FakeBackend {
    async fn geocode(&self, address: &str) -> Result<LonLat, BackendError> {
        let mut state = self.lock();
        state.geocode_calls.push(address.to_string());
        state
            .addresses
            .get(address)
            .copied()
            .ok_or_else(|| BackendError::NotFound(address.to_string()))
    }

    async fn compute_route(&self, request: &RouteRequest) -> Result<RouteResponse, BackendError> {
        let (delay, result) = {
            let mut state = self.lock();
            state.route_calls.push(request.clone());
            let result = if state.routes.len() > 1 {
                state.routes.pop_front()
            } else {
                state.routes.front().cloned()
            };
            (state.delay, result)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result.unwrap_or(Err(BackendError::Http {
            status: 500,
            detail: Some("no scripted route".to_string()),
        }))
    }
}

// ============================================================================
// Route responses
// ============================================================================

/// A routing response with one reference line, `segments` traffic segments
/// and `incidents` incidents.
pub fn route_json(segments: usize, incidents: usize) -> Value {
    let mut features = vec![json!({
        "type": "Feature",
        "geometry": {
            "type": "LineString",
            "coordinates": [[-46.6, -23.5], [-46.65, -23.55], [-46.7, -23.6]]
        },
        "properties": {
            "feature_type": "route_reference",
            "summary": {"distance": 15000.0, "duration": 1200.0},
            "optimization": {
                "enabled": true,
                "source": "test",
                "traffic_factor": 1.3
            }
        }
    })];
    for i in 0..segments {
        let lon = -46.6 - i as f64 * 0.01;
        features.push(json!({
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": [[lon, -23.5], [lon - 0.01, -23.51]]},
            "properties": {"feature_type": "traffic_segment", "status": "heavy"}
        }));
    }
    for i in 0..incidents {
        features.push(json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [-46.62 - i as f64 * 0.01, -23.52]},
            "properties": {
                "feature_type": "traffic_incident",
                "severity": "high",
                "type": "accident",
                "description": "Lane blocked",
                "delay_seconds": 300
            }
        }));
    }
    json!({"type": "FeatureCollection", "features": features})
}

pub fn route_response(segments: usize, incidents: usize) -> RouteResponse {
    RouteResponse::from_value(route_json(segments, incidents)).unwrap()
}

// ============================================================================
// Session fixture
// ============================================================================

pub type TestSession = Session<ScriptedGeolocation, MemoryMap, FakeBackend>;

pub struct Fixture {
    pub session: TestSession,
    pub gps: ScriptedGeolocation,
    pub backend: FakeBackend,
    pub status: StatusLog,
    pub host: mpsc::UnboundedReceiver<HostMessage>,
}

impl Fixture {
    /// A session whose map has not loaded yet.
    pub fn new(backend: FakeBackend) -> Self {
        Self::with_config(backend, SessionConfig::default())
    }

    pub fn with_config(backend: FakeBackend, config: SessionConfig) -> Self {
        let gps = ScriptedGeolocation::new();
        let status = StatusLog::new();
        let (host_tx, host) = mpsc::unbounded_channel();
        let session = Session::new(
            gps.clone(),
            MemoryMap::new(),
            backend.clone(),
            config,
            Box::new(status.clone()),
        )
        .with_host(host_tx);

        Self {
            session,
            gps,
            backend,
            status,
            host,
        }
    }

    /// A session whose map is ready.
    pub fn ready(backend: FakeBackend) -> Self {
        let mut fixture = Self::new(backend);
        fixture.send(SessionEvent::MapReady);
        fixture
    }

    /// Queue an event and apply everything pending.
    pub fn send(&mut self, event: impl Into<SessionEvent>) {
        self.session.sender().send(event.into()).unwrap();
        self.session.drain_pending();
    }

    pub fn start_tracking(&mut self) {
        self.send(UiCommand::StartTracking {
            force_center: false,
        });
    }

    /// Push a reading and apply it.
    pub fn fix(&mut self, lat: f64, lon: f64, accuracy: f64) {
        assert!(self.gps.emit(lat, lon, accuracy), "no open watch");
        self.session.drain_pending();
    }

    pub fn request_route(&mut self, origin: &str, destination: &str) {
        self.send(UiCommand::RequestRoute(RouteCommand::new(origin, destination)));
    }

    /// Apply the next queued event, waiting for it if needed.
    pub async fn step(&mut self) {
        let alive = tokio::time::timeout(Duration::from_secs(30), self.session.step())
            .await
            .expect("no session event arrived");
        assert!(alive);
    }

    /// Step until no route request is in flight.
    pub async fn settle(&mut self) {
        while self.session.routes().is_busy() {
            self.step().await;
        }
    }

    pub fn last_status(&self) -> String {
        self.status.last().map(|s| s.text).unwrap_or_default()
    }
}
