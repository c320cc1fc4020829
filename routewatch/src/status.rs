//! User-facing status messages.
//!
//! Status text is the short-lived, human-readable line a map client shows
//! under its controls. It is separate from diagnostic logging: controllers
//! write to a [`StatusSink`] for the user and to `tracing` for operators.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Severity of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatusLevel::Info => "info",
            StatusLevel::Success => "ok",
            StatusLevel::Warning => "warn",
            StatusLevel::Error => "error",
        };
        f.write_str(label)
    }
}

/// One status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub text: String,
}

impl Status {
    pub fn new(level: StatusLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Error, text)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.text)
    }
}

/// Receiver of status lines.
pub trait StatusSink: Send {
    fn report(&mut self, status: Status);
}

/// Lines kept by [`StatusLog::new`].
pub const DEFAULT_STATUS_CAPACITY: usize = 256;

/// In-memory status history of bounded size.
///
/// Once `capacity` lines are held, each new line evicts the oldest one.
/// Cloning shares the history, so a caller can keep a handle while the
/// session owns another.
#[derive(Debug, Clone)]
pub struct StatusLog {
    entries: Arc<Mutex<VecDeque<Status>>>,
    capacity: usize,
}

impl Default for StatusLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_STATUS_CAPACITY)
    }
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log holding at most `capacity` lines (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained lines, oldest first.
    pub fn entries(&self) -> Vec<Status> {
        self.lock().iter().cloned().collect()
    }

    /// The current (most recent) line.
    pub fn last(&self) -> Option<Status> {
        self.lock().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// True if any retained line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|s| s.text.contains(needle))
    }

    /// Remove and return every retained line.
    pub fn drain(&self) -> Vec<Status> {
        self.lock().drain(..).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Status>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StatusSink for StatusLog {
    fn report(&mut self, status: Status) {
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(status);
    }
}

/// Forwards status lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStatus;

impl StatusSink for TracingStatus {
    fn report(&mut self, status: Status) {
        match status.level {
            StatusLevel::Info | StatusLevel::Success => {
                tracing::info!(target: "routewatch::status", "{}", status.text)
            }
            StatusLevel::Warning => tracing::warn!(target: "routewatch::status", "{}", status.text),
            StatusLevel::Error => tracing::error!(target: "routewatch::status", "{}", status.text),
        }
    }
}
