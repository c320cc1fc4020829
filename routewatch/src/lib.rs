//! RouteWatch - live GPS tracking and route overlays for map clients
//!
//! The library keeps one map view in sync with the device position and draws
//! computed routes on top of it:
//!
//! - [`tracking`] follows a continuous location subscription and decides when
//!   the view recenters
//! - [`render`] owns every marker and overlay feature on the map
//! - [`route`] turns free-text or coordinate input into a drawn route with
//!   traffic segments and incidents
//! - [`session`] serializes all of the above through one event queue
//!
//! ```ignore
//! use routewatch::config::ConfigFile;
//! use routewatch::render::MemoryMap;
//! use routewatch::route::HttpBackend;
//! use routewatch::session::{Session, SessionEvent, UiCommand};
//! use routewatch::status::TracingStatus;
//! use routewatch::tracking::GpsdSource;
//!
//! let config = ConfigFile::load()?.with_env_overrides();
//! let backend = HttpBackend::new(config.http_backend().ok_or("no backend URL")?)?;
//! let session = Session::new(
//!     GpsdSource::new(config.gpsd_config()),
//!     MemoryMap::new(),
//!     backend,
//!     config.session_config(),
//!     Box::new(TracingStatus),
//! );
//! let tx = session.sender();
//! tx.send(SessionEvent::MapReady)?;
//! tx.send(UiCommand::StartTracking { force_center: false }.into())?;
//! session.run().await;
//! ```

pub mod config;
pub mod coord;
pub mod logging;
pub mod position;
pub mod render;
pub mod route;
pub mod session;
pub mod sink;
pub mod status;
pub mod tracking;

/// Version of the library and CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
