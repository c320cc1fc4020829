//! GPS Tracking Controller - watch lifecycle and recentring policy.
//!
//! # State Machine
//!
//! ```text
//!            start (no watch)              stop
//!   Idle ──────────────────────► Watching ─────► Idle
//!                                 │    ▲
//!                                 └────┘ sensor event
//! ```
//!
//! A start request while `Watching` is rejected with a status message. Stop
//! clears the watch, follow-mode and the first-fix flag, so the next start
//! behaves like a fresh session.
//!
//! # Recentring Policy
//!
//! 1. The first accepted fix after start always recenters and zooms in to at
//!    least `first_fix_zoom`, whatever its accuracy.
//! 2. Later fixes recenter only if the marker was just created, centring was
//!    forced at start, or follow-mode is on, and the fix is reliable
//!    (accuracy at or below the threshold).
//!
//! Every accepted fix is stored and moves the marker, reliable or not.

use tracing::{debug, info, trace, warn};

use crate::position::{Accuracy, Position, PositionStore};
use crate::render::{MapWidget, RenderSurface};
use crate::status::{Status, StatusSink};

use super::source::{GeolocationSource, SensorError, SensorEvent, SensorSink, WatchId};

/// Minimum zoom applied on the first fix.
pub const FIRST_FIX_ZOOM: f64 = 16.0;

/// Tracking policy settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingConfig {
    pub reliability_threshold: Accuracy,
    pub first_fix_zoom: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            reliability_threshold: Accuracy::RELIABILITY_THRESHOLD,
            first_fix_zoom: FIRST_FIX_ZOOM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Idle,
    Watching,
}

/// Why a start request failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackingError {
    #[error("GPS tracking is already active")]
    AlreadyActive,

    #[error("could not start location watch: {0}")]
    Sensor(#[from] SensorError),
}

/// What a sensor event led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOutcome {
    /// Event belongs to a watch that is no longer active.
    Stale,
    /// Sensor reported a failure; the watch stays open.
    SensorFailure,
    /// Fix arrived before the map was ready and was dropped.
    MapNotReady,
    /// Reading had out-of-range values.
    Invalid,
    /// Fix stored and the view recentred on it.
    Recentered { first_fix: bool },
    /// Fix stored and the marker moved; the view stayed put.
    Updated,
}

/// Owns the single location subscription and applies fixes to the session.
pub struct TrackingController<G: GeolocationSource> {
    source: G,
    sink: SensorSink,
    config: TrackingConfig,
    has_first_fix: bool,
    force_center: bool,
}

impl<G: GeolocationSource> TrackingController<G> {
    /// Create a controller delivering sensor events into `sink`.
    pub fn new(source: G, sink: SensorSink, config: TrackingConfig) -> Self {
        Self {
            source,
            sink,
            config,
            has_first_fix: false,
            force_center: false,
        }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn source(&self) -> &G {
        &self.source
    }

    pub fn state(&self, store: &PositionStore) -> TrackingState {
        if store.watch().is_some() {
            TrackingState::Watching
        } else {
            TrackingState::Idle
        }
    }

    pub fn has_first_fix(&self) -> bool {
        self.has_first_fix
    }

    /// Open the location subscription.
    ///
    /// With `force_center`, reliable fixes recenter the view for the whole
    /// session even without follow-mode.
    pub fn start(
        &mut self,
        store: &mut PositionStore,
        status: &mut dyn StatusSink,
        force_center: bool,
    ) -> Result<WatchId, TrackingError> {
        if let Some(active) = store.watch() {
            debug!(%active, "Start requested while already watching");
            status.report(Status::warning("GPS tracking is already active"));
            return Err(TrackingError::AlreadyActive);
        }

        let watch = match self.source.watch(self.sink.clone()) {
            Ok(watch) => watch,
            Err(e) => {
                warn!(error = %e, code = e.code(), "Failed to open location watch");
                status.report(sensor_status(&e));
                return Err(e.into());
            }
        };

        store.set_watch(Some(watch));
        self.has_first_fix = false;
        self.force_center = force_center;

        info!(%watch, force_center, "GPS tracking started");
        status.report(Status::info("GPS tracking started, waiting for position..."));
        Ok(watch)
    }

    /// Close the subscription and reset the session.
    ///
    /// Returns false if tracking was not active.
    pub fn stop<W: MapWidget>(
        &mut self,
        store: &mut PositionStore,
        surface: &mut RenderSurface<W>,
        status: &mut dyn StatusSink,
    ) -> bool {
        let Some(watch) = store.watch() else {
            status.report(Status::info("GPS tracking is not active"));
            return false;
        };

        self.source.clear_watch(watch);
        store.set_watch(None);
        store.set_follow_mode(false);
        store.clear_position();
        surface.remove_position_marker();
        self.has_first_fix = false;
        self.force_center = false;

        info!(%watch, "GPS tracking stopped");
        status.report(Status::info("GPS tracking stopped"));
        true
    }

    /// Apply one sensor event.
    pub fn handle_event<W: MapWidget>(
        &mut self,
        event: SensorEvent,
        store: &mut PositionStore,
        surface: &mut RenderSurface<W>,
        status: &mut dyn StatusSink,
    ) -> FixOutcome {
        if store.watch() != Some(event.watch) {
            trace!(watch = %event.watch, "Dropping event from inactive watch");
            return FixOutcome::Stale;
        }

        let reading = match event.outcome {
            Ok(reading) => reading,
            Err(e) => {
                warn!(error = %e, code = e.code(), "Location sensor error");
                status.report(sensor_status(&e));
                return FixOutcome::SensorFailure;
            }
        };

        if !surface.is_ready() {
            warn!("Position received before the map was ready");
            status.report(Status::warning("Map not ready yet, position update skipped"));
            return FixOutcome::MapNotReady;
        }

        let position = match Position::new(
            reading.longitude,
            reading.latitude,
            reading.accuracy,
            reading.timestamp,
        ) {
            Ok(position) => position,
            Err(e) => {
                warn!(error = %e, "Discarding invalid sensor reading");
                status.report(Status::error(format!("Invalid position from sensor: {}", e)));
                return FixOutcome::Invalid;
            }
        };

        store.set_position(position.clone());

        let created = match surface.upsert_position_marker(&position) {
            Ok(created) => created,
            Err(e) => {
                warn!(error = %e, "Could not draw position marker");
                return FixOutcome::MapNotReady;
            }
        };

        let reliable = position.is_reliable(self.config.reliability_threshold);
        let follow = store.follow_mode();

        let outcome = if !self.has_first_fix {
            self.has_first_fix = true;
            surface.center_on(position.point(), Some(self.config.first_fix_zoom));
            FixOutcome::Recentered { first_fix: true }
        } else if (created || self.force_center || follow) && reliable {
            surface.center_on(position.point(), None);
            FixOutcome::Recentered { first_fix: false }
        } else {
            FixOutcome::Updated
        };

        debug!(
            lat = position.lat,
            lon = position.lon,
            accuracy_m = position.accuracy.meters(),
            reliable,
            ?outcome,
            "Position fix applied"
        );

        if reliable {
            let suffix = if follow { " (Following)" } else { "" };
            status.report(Status::success(format!(
                "GPS active ({}){}",
                position.accuracy, suffix
            )));
        } else {
            status.report(Status::warning(format!(
                "Low GPS precision ({}), awaiting better reading",
                position.accuracy
            )));
        }

        outcome
    }

    /// A user-initiated map drag. Clears follow-mode, never sets it.
    ///
    /// Returns true if follow-mode was on.
    pub fn on_map_drag(&self, store: &mut PositionStore) -> bool {
        if store.follow_mode() {
            store.set_follow_mode(false);
            debug!("Follow mode cleared by map drag");
            true
        } else {
            false
        }
    }

    /// Explicitly enable or disable follow-mode.
    ///
    /// Enabling recenters immediately when a reliable fix is stored.
    pub fn set_follow<W: MapWidget>(
        &self,
        enabled: bool,
        store: &mut PositionStore,
        surface: &mut RenderSurface<W>,
        status: &mut dyn StatusSink,
    ) {
        store.set_follow_mode(enabled);

        if !enabled {
            status.report(Status::info("Follow mode disabled"));
            return;
        }

        status.report(Status::info("Follow mode enabled"));
        let reliable_fix = store
            .position()
            .filter(|p| p.is_reliable(self.config.reliability_threshold))
            .map(Position::point);
        if let Some(point) = reliable_fix {
            if surface.is_ready() {
                surface.center_on(point, None);
            }
        }
    }

    pub fn toggle_follow<W: MapWidget>(
        &self,
        store: &mut PositionStore,
        surface: &mut RenderSurface<W>,
        status: &mut dyn StatusSink,
    ) {
        let enabled = !store.follow_mode();
        self.set_follow(enabled, store, surface, status);
    }
}

/// User-facing text for a sensor failure.
fn sensor_status(error: &SensorError) -> Status {
    match error {
        SensorError::PermissionDenied => Status::error(
            "Location permission denied. Allow location access to use GPS tracking",
        ),
        SensorError::Unavailable(detail) => Status::warning(format!(
            "Unable to get your location ({}). Still trying...",
            detail
        )),
        SensorError::Timeout => Status::warning("Location request timed out. Still trying..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{FeatureRole, MemoryMap, SurfaceOptions};
    use crate::status::{StatusLevel, StatusLog};
    use crate::tracking::ScriptedGeolocation;
    use tokio::sync::mpsc;

    struct Harness {
        controller: TrackingController<ScriptedGeolocation>,
        sensor: ScriptedGeolocation,
        events: mpsc::UnboundedReceiver<SensorEvent>,
        store: PositionStore,
        surface: RenderSurface<MemoryMap>,
        status: StatusLog,
    }

    impl Harness {
        fn new() -> Self {
            let sensor = ScriptedGeolocation::new();
            let (tx, events) = mpsc::unbounded_channel();
            Self {
                controller: TrackingController::new(
                    sensor.clone(),
                    SensorSink::from_sender(tx),
                    TrackingConfig::default(),
                ),
                sensor,
                events,
                store: PositionStore::new(),
                surface: RenderSurface::ready(MemoryMap::new(), SurfaceOptions::default()),
                status: StatusLog::new(),
            }
        }

        fn start(&mut self, force: bool) -> Result<WatchId, TrackingError> {
            self.controller
                .start(&mut self.store, &mut self.status, force)
        }

        fn stop(&mut self) -> bool {
            self.controller
                .stop(&mut self.store, &mut self.surface, &mut self.status)
        }

        fn fix(&mut self, lat: f64, lon: f64, accuracy: f64) -> FixOutcome {
            assert!(self.sensor.emit(lat, lon, accuracy));
            self.pump()
        }

        fn pump(&mut self) -> FixOutcome {
            let event = self.events.try_recv().expect("event queued");
            self.controller.handle_event(
                event,
                &mut self.store,
                &mut self.surface,
                &mut self.status,
            )
        }

        fn view_changes(&self) -> u64 {
            self.surface.widget().view_changes()
        }
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut h = Harness::new();
        h.start(false).unwrap();
        assert_eq!(h.start(false), Err(TrackingError::AlreadyActive));
        assert_eq!(h.sensor.watch_count(), 1);
        assert_eq!(h.controller.state(&h.store), TrackingState::Watching);
        assert!(h.status.contains("already active"));
    }

    #[test]
    fn test_first_fix_recenters_even_when_inaccurate() {
        let mut h = Harness::new();
        h.start(false).unwrap();

        assert_eq!(
            h.fix(-23.5, -46.6, 900.0),
            FixOutcome::Recentered { first_fix: true }
        );
        let view = h.surface.widget().view();
        assert_eq!(view.zoom, FIRST_FIX_ZOOM);
        assert_eq!(view.center.unwrap().lat, -23.5);
        assert!(h.status.last().unwrap().text.contains("Low GPS precision"));
    }

    #[test]
    fn test_steady_state_requires_follow_and_reliability() {
        let mut h = Harness::new();
        h.start(false).unwrap();
        h.fix(-23.5, -46.6, 20.0);

        // Not following, not forced: viewport stays.
        let before = h.view_changes();
        assert_eq!(h.fix(-23.51, -46.61, 20.0), FixOutcome::Updated);
        assert_eq!(h.view_changes(), before);

        // Following but unreliable: viewport stays, stored position updates.
        h.store.set_follow_mode(true);
        assert_eq!(h.fix(-23.52, -46.62, 200.0), FixOutcome::Updated);
        assert_eq!(h.view_changes(), before);
        assert_eq!(h.store.position().unwrap().lat, -23.52);

        // Following and reliable (threshold inclusive): recenters.
        assert_eq!(
            h.fix(-23.53, -46.63, 150.0),
            FixOutcome::Recentered { first_fix: false }
        );
        assert_eq!(h.view_changes(), before + 1);
        assert_eq!(h.status.last().unwrap().text, "GPS active (±150 m) (Following)");
    }

    #[test]
    fn test_forced_centering_persists() {
        let mut h = Harness::new();
        h.start(true).unwrap();
        h.fix(-23.5, -46.6, 20.0);
        assert_eq!(
            h.fix(-23.51, -46.61, 30.0),
            FixOutcome::Recentered { first_fix: false }
        );
        assert_eq!(h.fix(-23.52, -46.62, 300.0), FixOutcome::Updated);
    }

    #[test]
    fn test_restart_resets_first_fix() {
        let mut h = Harness::new();
        h.start(false).unwrap();
        h.fix(-23.5, -46.6, 20.0);
        h.store.set_follow_mode(true);

        assert!(h.stop());
        assert!(!h.store.follow_mode());
        assert!(h.store.position().is_none());
        assert_eq!(h.surface.widget().count_role(FeatureRole::PositionMarker), 0);

        h.start(false).unwrap();
        assert_eq!(h.sensor.watch_count(), 2);
        assert_eq!(
            h.fix(-23.6, -46.7, 800.0),
            FixOutcome::Recentered { first_fix: true }
        );
    }

    #[test]
    fn test_events_from_old_watch_are_dropped() {
        let mut h = Harness::new();
        h.start(false).unwrap();
        assert!(h.sensor.emit(-23.5, -46.6, 20.0));
        h.stop();
        h.start(false).unwrap();

        // The queued event belongs to the first watch.
        assert_eq!(h.pump(), FixOutcome::Stale);
        assert!(h.store.position().is_none());
    }

    #[test]
    fn test_marker_created_once_per_session() {
        let mut h = Harness::new();
        h.start(false).unwrap();
        for i in 0..5 {
            h.fix(-23.5 + i as f64 * 0.001, -46.6, 20.0 + i as f64 * 50.0);
        }
        let map = h.surface.widget();
        assert_eq!(map.count_role(FeatureRole::PositionMarker), 1);
        assert_eq!(map.added_total(), 2);
    }

    #[test]
    fn test_sensor_errors_are_classified() {
        let mut h = Harness::new();
        h.start(false).unwrap();

        h.sensor.emit_error(SensorError::PermissionDenied);
        assert_eq!(h.pump(), FixOutcome::SensorFailure);
        let status = h.status.last().unwrap();
        assert_eq!(status.level, StatusLevel::Error);
        assert!(status.text.contains("permission denied"));

        h.sensor.emit_error(SensorError::Unavailable("no satellites".into()));
        assert_eq!(h.pump(), FixOutcome::SensorFailure);
        assert!(h.status.last().unwrap().text.contains("no satellites"));

        // Watch stays open.
        assert_eq!(h.controller.state(&h.store), TrackingState::Watching);
    }

    #[test]
    fn test_refused_watch_stays_idle() {
        let mut h = Harness::new();
        h.sensor.refuse_watch(SensorError::PermissionDenied);
        assert_eq!(
            h.start(false),
            Err(TrackingError::Sensor(SensorError::PermissionDenied))
        );
        assert_eq!(h.controller.state(&h.store), TrackingState::Idle);
    }

    #[test]
    fn test_fix_before_map_ready_is_rejected() {
        let mut h = Harness::new();
        h.surface = RenderSurface::new(MemoryMap::new(), SurfaceOptions::default());
        h.start(false).unwrap();
        assert_eq!(h.fix(-23.5, -46.6, 20.0), FixOutcome::MapNotReady);
        assert!(h.status.contains("Map not ready"));
        assert!(!h.controller.has_first_fix());
    }

    #[test]
    fn test_drag_clears_follow_only() {
        let mut h = Harness::new();
        assert!(!h.controller.on_map_drag(&mut h.store));
        assert!(!h.store.follow_mode());

        h.store.set_follow_mode(true);
        assert!(h.controller.on_map_drag(&mut h.store));
        assert!(!h.store.follow_mode());
    }

    #[test]
    fn test_enabling_follow_recenters_on_reliable_fix() {
        let mut h = Harness::new();
        h.start(false).unwrap();
        h.fix(-23.5, -46.6, 20.0);
        let before = h.view_changes();

        h.controller
            .set_follow(true, &mut h.store, &mut h.surface, &mut h.status);
        assert!(h.store.follow_mode());
        assert_eq!(h.view_changes(), before + 1);

        h.controller
            .toggle_follow(&mut h.store, &mut h.surface, &mut h.status);
        assert!(!h.store.follow_mode());
        assert_eq!(h.view_changes(), before + 1);
    }

    #[test]
    fn test_stop_when_idle() {
        let mut h = Harness::new();
        assert!(!h.stop());
        assert!(h.status.contains("not active"));
    }
}
