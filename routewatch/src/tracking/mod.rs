//! Live GPS tracking.
//!
//! - [`GeolocationSource`] - capability interface for a continuous location
//!   subscription ([`GpsdSource`], [`ScriptedGeolocation`])
//! - [`TrackingController`] - watch lifecycle and the recentring policy

mod controller;
mod gpsd;
mod scripted;
mod source;

pub use controller::{
    FixOutcome, TrackingConfig, TrackingController, TrackingError, TrackingState, FIRST_FIX_ZOOM,
};
pub use gpsd::{parse_report, GpsdConfig, GpsdSource};
pub use scripted::ScriptedGeolocation;
pub use source::{GeolocationSource, SensorError, SensorEvent, SensorReading, SensorSink, WatchId};
