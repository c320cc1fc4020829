//! Geolocation source trait and the sensor event vocabulary.
//!
//! A [`GeolocationSource`] owns a continuous location subscription. It pushes
//! [`SensorEvent`]s into a [`SensorSink`] supplied by the caller; each event
//! is tagged with the [`WatchId`] of the subscription that produced it so that
//! late events from a cleared watch can be told apart from live ones.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::sink::EventSink;

/// Opaque handle of a location subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

impl WatchId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

/// One raw reading from the device location sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters.
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

impl SensorReading {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            timestamp: Utc::now(),
        }
    }
}

/// Sensor failure classes.
///
/// The numeric codes follow the browser geolocation convention
/// (`1` permission denied, `2` position unavailable, `3` timeout).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SensorError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    Unavailable(String),

    #[error("location request timed out")]
    Timeout,
}

impl SensorError {
    /// Numeric error code.
    pub fn code(&self) -> u8 {
        match self {
            SensorError::PermissionDenied => 1,
            SensorError::Unavailable(_) => 2,
            SensorError::Timeout => 3,
        }
    }

    /// Build an error from its numeric code.
    pub fn from_code(code: u8, message: impl Into<String>) -> Self {
        match code {
            1 => SensorError::PermissionDenied,
            3 => SensorError::Timeout,
            _ => SensorError::Unavailable(message.into()),
        }
    }
}

/// A reading or a failure from one subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEvent {
    pub watch: WatchId,
    pub outcome: Result<SensorReading, SensorError>,
}

impl SensorEvent {
    pub fn reading(watch: WatchId, reading: SensorReading) -> Self {
        Self {
            watch,
            outcome: Ok(reading),
        }
    }

    pub fn error(watch: WatchId, error: SensorError) -> Self {
        Self {
            watch,
            outcome: Err(error),
        }
    }
}

/// Destination for sensor events.
pub type SensorSink = EventSink<SensorEvent>;

/// A continuous device-location subscription primitive.
///
/// Implementations retry internally; a failure is reported to the sink as an
/// event and the subscription stays open until [`clear_watch`] is called.
///
/// [`clear_watch`]: GeolocationSource::clear_watch
pub trait GeolocationSource: Send {
    /// Open a subscription delivering into `sink`.
    fn watch(&mut self, sink: SensorSink) -> Result<WatchId, SensorError>;

    /// Close a subscription. Unknown or already-cleared handles are ignored.
    fn clear_watch(&mut self, watch: WatchId);
}
