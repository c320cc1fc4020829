//! Scripted location source for tests and replay.
//!
//! [`ScriptedGeolocation`] is a cloneable handle: one clone is handed to the
//! tracking controller, another is kept by the test (or replay driver) to push
//! readings into whichever subscription is currently open.

use std::sync::{Arc, Mutex};

use super::source::{
    GeolocationSource, SensorError, SensorEvent, SensorReading, SensorSink, WatchId,
};

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    active: Option<(WatchId, SensorSink)>,
    watch_count: u32,
    cleared: Vec<WatchId>,
    refuse_with: Option<SensorError>,
}

/// Location source driven by explicit calls.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGeolocation {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedGeolocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `watch()` calls fail with `error`.
    pub fn refuse_watch(&self, error: SensorError) {
        self.lock().refuse_with = Some(error);
    }

    /// Accept subscriptions again after [`refuse_watch`](Self::refuse_watch).
    pub fn allow_watch(&self) {
        self.lock().refuse_with = None;
    }

    /// Deliver a reading to the open subscription.
    ///
    /// Returns false when no subscription is open or the sink is closed.
    pub fn emit(&self, latitude: f64, longitude: f64, accuracy: f64) -> bool {
        self.emit_reading(SensorReading::new(latitude, longitude, accuracy))
    }

    pub fn emit_reading(&self, reading: SensorReading) -> bool {
        self.deliver(|watch| SensorEvent::reading(watch, reading))
    }

    /// Deliver a failure to the open subscription.
    pub fn emit_error(&self, error: SensorError) -> bool {
        self.deliver(|watch| SensorEvent::error(watch, error))
    }

    /// Number of subscriptions opened so far.
    pub fn watch_count(&self) -> u32 {
        self.lock().watch_count
    }

    pub fn active_watch(&self) -> Option<WatchId> {
        self.lock().active.as_ref().map(|(watch, _)| *watch)
    }

    /// Handles passed to `clear_watch`, in order.
    pub fn cleared(&self) -> Vec<WatchId> {
        self.lock().cleared.clone()
    }

    fn deliver(&self, build: impl FnOnce(WatchId) -> SensorEvent) -> bool {
        let target = self.lock().active.clone();
        match target {
            Some((watch, sink)) => sink.deliver(build(watch)),
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-call; the data is
        // still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl GeolocationSource for ScriptedGeolocation {
    fn watch(&mut self, sink: SensorSink) -> Result<WatchId, SensorError> {
        let mut inner = self.lock();
        if let Some(error) = inner.refuse_with.clone() {
            return Err(error);
        }
        inner.next_id += 1;
        let watch = WatchId::new(inner.next_id);
        inner.active = Some((watch, sink));
        inner.watch_count += 1;
        Ok(watch)
    }

    fn clear_watch(&mut self, watch: WatchId) {
        let mut inner = self.lock();
        inner.cleared.push(watch);
        if matches!(&inner.active, Some((active, _)) if *active == watch) {
            inner.active = None;
        }
    }
}
