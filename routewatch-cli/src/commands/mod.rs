//! CLI command implementations.
//!
//! - [`config`] - Configuration management (path, show, init)
//! - [`route`] - One route computation rendered into a headless map
//! - [`track`] - Live position tracking from gpsd or a replay file

pub mod config;
pub mod route;
pub mod track;

use routewatch::render::MemoryMap;
use routewatch::route::RoutingBackend;
use routewatch::session::{Session, SessionEvent};
use routewatch::status::StatusLog;
use routewatch::tracking::GeolocationSource;

use crate::runner::{CliRunner, ConsoleStatus};

/// Session over a headless map whose widget is already loaded.
pub(crate) fn ready_session<G, B>(
    runner: &CliRunner,
    source: G,
    backend: B,
    history: &StatusLog,
) -> Session<G, MemoryMap, B>
where
    G: GeolocationSource,
    B: RoutingBackend,
{
    let config = runner.config();
    let mut session = Session::new(
        source,
        MemoryMap::with_zoom(config.map.default_zoom),
        backend,
        config.session_config(),
        Box::new(ConsoleStatus::new(history.clone())),
    );
    session.handle(SessionEvent::MapReady);
    session
}
