//! Per-source run statistics

use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

/// Outcome counters of a source's most recent run.
///
/// Only meaningful once that run's result stream has closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Number of error results emitted
    pub errors: usize,
    /// Number of subdomain results emitted
    pub results: usize,
    /// Wall time from run start until the stream closed
    pub time_taken: Duration,
    /// The source had no usable credentials and did nothing
    pub skipped: bool,
}

/// Interior-mutable statistics owned by one source instance.
///
/// Written only by the source's own run; read by callers after the run.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    inner: Mutex<Statistics>,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all counters at the start of a run
    pub fn reset(&self) {
        *self.inner.lock() = Statistics::default();
    }

    pub fn record_result(&self) {
        self.inner.lock().results += 1;
    }

    pub fn record_error(&self) {
        self.inner.lock().errors += 1;
    }

    pub fn mark_skipped(&self) {
        self.inner.lock().skipped = true;
    }

    pub fn set_time_taken(&self, elapsed: Duration) {
        self.inner.lock().time_taken = elapsed;
    }

    pub fn snapshot(&self) -> Statistics {
        *self.inner.lock()
    }
}
