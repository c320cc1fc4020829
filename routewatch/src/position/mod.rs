//! Device position state.
//!
//! [`Position`] is the latest sensor fix; [`PositionStore`] is the session's
//! state container for that fix, follow-mode, the active watch handle and the
//! resolved route endpoints.

mod state;
mod store;

pub use state::{Accuracy, Position};
pub use store::PositionStore;
