//! Position Store - in-memory state shared by tracking and routing.
//!
//! Holds the latest device fix, the follow-mode flag, the active watch
//! handle and the coordinates of the current route request. The store is a
//! plain state container: every setter is total and nothing here triggers
//! rendering or I/O.
//!
//! # Example
//!
//! ```ignore
//! let mut store = PositionStore::new();
//! store.set_position(Position::new(-46.6, -23.5, 12.0, Utc::now())?);
//! store.set_follow_mode(true);
//!
//! // Manual map drag
//! store.set_follow_mode(false);
//! ```

use crate::coord::{CoordinatePair, LonLat};
use crate::tracking::WatchId;

use super::state::Position;

/// Session-wide position and route state.
#[derive(Debug, Default)]
pub struct PositionStore {
    /// Latest fix (None before the first sensor callback and after stop).
    position: Option<Position>,

    /// Recenter on every reliable fix while set.
    follow_mode: bool,

    /// Handle of the live location subscription, if any.
    watch: Option<WatchId>,

    /// Resolved endpoints of the current route request.
    route: Option<CoordinatePair>,
}

impl PositionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // ---- position ----

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Replace the stored fix unconditionally.
    pub fn set_position(&mut self, position: Position) {
        self.position = Some(position);
    }

    pub fn clear_position(&mut self) {
        self.position = None;
    }

    // ---- follow mode ----

    pub fn follow_mode(&self) -> bool {
        self.follow_mode
    }

    pub fn set_follow_mode(&mut self, enabled: bool) {
        self.follow_mode = enabled;
    }

    // ---- watch handle ----

    pub fn watch(&self) -> Option<WatchId> {
        self.watch
    }

    pub fn set_watch(&mut self, watch: Option<WatchId>) {
        self.watch = watch;
    }

    // ---- route coordinates ----

    pub fn route(&self) -> Option<&CoordinatePair> {
        self.route.as_ref()
    }

    pub fn origin(&self) -> Option<LonLat> {
        self.route.map(|pair| pair.origin)
    }

    pub fn destination(&self) -> Option<LonLat> {
        self.route.map(|pair| pair.destination)
    }

    pub fn set_route(&mut self, pair: CoordinatePair) {
        self.route = Some(pair);
    }

    pub fn clear_route(&mut self) {
        self.route = None;
    }
}
