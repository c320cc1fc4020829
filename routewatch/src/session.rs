//! Session event loop.
//!
//! A [`Session`] owns all mutable state of one map view: the position store,
//! the tracking controller, the render surface and the route orchestrator.
//! Everything that can change that state arrives as a [`SessionEvent`] on a
//! single queue and is applied one event at a time, so no two handlers ever
//! interleave.
//!
//! ```text
//!  UI commands ──┐
//!  sensor watch ─┼──► mpsc queue ──► Session::handle ──► store / surface / status
//!  route tasks ──┤                                   └──► HostMessage
//!  map ready ────┘
//! ```
//!
//! [`Session::run`] stops on [`SessionEvent::Shutdown`], which is ordered
//! behind everything already queued, or as soon as the token from
//! [`Session::shutdown_token`] is cancelled. Route tasks run under a child of
//! that token.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::position::PositionStore;
use crate::render::{MapWidget, RenderSurface, SurfaceOptions};
use crate::route::{
    RouteCommand, RouteConfig, RouteError, RouteEvent, RouteOrchestrator, RouteProgress,
    RouteSink, RoutingBackend,
};
use crate::status::StatusSink;
use crate::tracking::{
    GeolocationSource, SensorEvent, SensorSink, TrackingConfig, TrackingController,
};

/// Messages for the application embedding the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMessage {
    /// The backend rejected the credentials; the host should re-authenticate.
    SessionExpired,
}

/// User interactions.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    StartTracking { force_center: bool },
    StopTracking,
    ToggleFollow,
    SetFollow(bool),
    /// The user dragged the map.
    MapDragged,
    RequestRoute(RouteCommand),
    /// Remove the route, its markers and any pending computation.
    Clear,
}

/// Everything the session reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Ui(UiCommand),
    Sensor(SensorEvent),
    Route(RouteEvent),
    /// The map widget finished loading.
    MapReady,
    Shutdown,
}

impl From<UiCommand> for SessionEvent {
    fn from(command: UiCommand) -> Self {
        SessionEvent::Ui(command)
    }
}

impl From<SensorEvent> for SessionEvent {
    fn from(event: SensorEvent) -> Self {
        SessionEvent::Sensor(event)
    }
}

impl From<RouteEvent> for SessionEvent {
    fn from(event: RouteEvent) -> Self {
        SessionEvent::Route(event)
    }
}

/// Settings for the session's components.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionConfig {
    pub tracking: TrackingConfig,
    pub route: RouteConfig,
    pub surface: SurfaceOptions,
}

/// One map view with live tracking and route overlays.
pub struct Session<G, W, B>
where
    G: GeolocationSource,
    W: MapWidget,
    B: RoutingBackend,
{
    store: PositionStore,
    tracking: TrackingController<G>,
    surface: RenderSurface<W>,
    routes: RouteOrchestrator<B>,
    status: Box<dyn StatusSink>,
    host: Option<mpsc::UnboundedSender<HostMessage>>,
    tx: mpsc::UnboundedSender<SessionEvent>,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
    cancellation: CancellationToken,
}

impl<G, W, B> Session<G, W, B>
where
    G: GeolocationSource,
    W: MapWidget,
    B: RoutingBackend,
{
    /// Create a session. The map starts out not ready; send
    /// [`SessionEvent::MapReady`] once the widget has loaded.
    pub fn new(
        source: G,
        widget: W,
        backend: B,
        config: SessionConfig,
        status: Box<dyn StatusSink>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancellation = CancellationToken::new();
        let tracking =
            TrackingController::new(source, SensorSink::from_sender(tx.clone()), config.tracking);
        let routes = RouteOrchestrator::new(backend, RouteSink::from_sender(tx.clone()), config.route)
            .with_shutdown(&cancellation);

        Self {
            store: PositionStore::new(),
            tracking,
            surface: RenderSurface::new(widget, config.surface),
            routes,
            status,
            host: None,
            tx,
            rx,
            cancellation,
        }
    }

    /// Deliver [`HostMessage`]s to `host`.
    pub fn with_host(mut self, host: mpsc::UnboundedSender<HostMessage>) -> Self {
        self.host = Some(host);
        self
    }

    /// Token that stops [`run`](Self::run) and every in-flight route task.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Queue handle for UI wiring and other producers.
    pub fn sender(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.tx.clone()
    }

    pub fn store(&self) -> &PositionStore {
        &self.store
    }

    pub fn surface(&self) -> &RenderSurface<W> {
        &self.surface
    }

    pub fn map(&self) -> &W {
        self.surface.widget()
    }

    pub fn tracking(&self) -> &TrackingController<G> {
        &self.tracking
    }

    pub fn routes(&self) -> &RouteOrchestrator<B> {
        &self.routes
    }

    /// Apply one event. Returns false once the session should stop.
    pub fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Ui(command) => self.handle_command(command),
            SessionEvent::Sensor(event) => {
                let outcome = self.tracking.handle_event(
                    event,
                    &mut self.store,
                    &mut self.surface,
                    self.status.as_mut(),
                );
                debug!(?outcome, "Sensor event handled");
            }
            SessionEvent::Route(event) => {
                let progress = self.routes.handle_event(
                    event,
                    &mut self.store,
                    &mut self.surface,
                    self.status.as_mut(),
                );
                self.after_route_progress(&progress);
            }
            SessionEvent::MapReady => self.handle_map_ready(),
            SessionEvent::Shutdown => {
                self.shutdown();
                return false;
            }
        }
        true
    }

    /// Wait for the next event and apply it.
    pub async fn step(&mut self) -> bool {
        match self.rx.recv().await {
            Some(event) => self.handle(event),
            None => false,
        }
    }

    /// Apply every event already queued without waiting.
    ///
    /// Returns the number of events handled.
    pub fn drain_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            handled += 1;
            if !self.handle(event) {
                break;
            }
        }
        handled
    }

    /// Process events until [`SessionEvent::Shutdown`] or cancellation.
    pub async fn run(mut self) -> Self {
        info!("Session started");
        let cancellation = self.cancellation.clone();
        loop {
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => {
                    info!("Session cancelled");
                    self.shutdown();
                    break;
                }

                alive = self.step() => {
                    if !alive {
                        break;
                    }
                }
            }
        }
        info!("Session finished");
        self
    }

    fn handle_command(&mut self, command: UiCommand) {
        debug!(?command, "UI command");
        let status = self.status.as_mut();
        match command {
            UiCommand::StartTracking { force_center } => {
                if let Err(e) = self.tracking.start(&mut self.store, status, force_center) {
                    debug!(error = %e, "Tracking not started");
                }
            }
            UiCommand::StopTracking => {
                self.tracking.stop(&mut self.store, &mut self.surface, status);
            }
            UiCommand::ToggleFollow => {
                self.tracking
                    .toggle_follow(&mut self.store, &mut self.surface, status);
            }
            UiCommand::SetFollow(enabled) => {
                self.tracking
                    .set_follow(enabled, &mut self.store, &mut self.surface, status);
            }
            UiCommand::MapDragged => {
                self.tracking.on_map_drag(&mut self.store);
            }
            UiCommand::RequestRoute(route) => {
                if let Err(e) =
                    self.routes
                        .request(&route, &mut self.store, &mut self.surface, status)
                {
                    debug!(error = %e, "Route request not started");
                }
            }
            UiCommand::Clear => {
                self.routes.clear(&mut self.store, &mut self.surface, status);
            }
        }
    }

    fn handle_map_ready(&mut self) {
        if !self.surface.mark_ready(&self.store) {
            debug!("No deferred markers to draw");
        }
        if let Some(progress) =
            self.routes
                .on_map_ready(&mut self.store, &mut self.surface, self.status.as_mut())
        {
            self.after_route_progress(&progress);
        }
    }

    fn after_route_progress(&mut self, progress: &RouteProgress) {
        if let RouteProgress::Failed(RouteError::SessionExpired) = progress {
            self.notify_host(HostMessage::SessionExpired);
        }
    }

    fn notify_host(&self, message: HostMessage) {
        match &self.host {
            Some(host) => {
                if host.send(message).is_err() {
                    warn!(?message, "Host is gone, message dropped");
                }
            }
            None => warn!(?message, "No host attached, message dropped"),
        }
    }

    fn shutdown(&mut self) {
        if self.store.watch().is_some() {
            self.tracking
                .stop(&mut self.store, &mut self.surface, self.status.as_mut());
        }
        if self.routes.is_busy() {
            self.routes
                .clear(&mut self.store, &mut self.surface, self.status.as_mut());
        }
        self.cancellation.cancel();
    }
}
