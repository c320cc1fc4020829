//! Callback sink for events produced outside the session loop.
//!
//! Sensor subscriptions and route tasks run detached from the session. They
//! hand their results to an [`EventSink`], which usually forwards into the
//! session's event queue.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

/// Destination for events of type `E`.
///
/// [`EventSink::deliver`] returns `false` once the receiving side is gone,
/// which tells the producer to stop.
pub struct EventSink<E> {
    deliver: Arc<dyn Fn(E) -> bool + Send + Sync>,
}

impl<E> Clone for EventSink<E> {
    fn clone(&self) -> Self {
        Self {
            deliver: Arc::clone(&self.deliver),
        }
    }
}

impl<E: 'static> EventSink<E> {
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(E) -> bool + Send + Sync + 'static,
    {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Sink that forwards into a queue whose item type wraps `E`.
    pub fn from_sender<T>(tx: mpsc::UnboundedSender<T>) -> Self
    where
        T: From<E> + Send + 'static,
    {
        Self::new(move |event| tx.send(T::from(event)).is_ok())
    }

    pub fn deliver(&self, event: E) -> bool {
        (self.deliver)(event)
    }
}

impl<E> fmt::Debug for EventSink<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}
