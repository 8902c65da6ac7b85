//! Process-lifetime cold start detection.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Moment the probe service was initialized. Captured once and injected
/// into every endpoint; never reassigned.
#[derive(Debug, Clone, Copy)]
pub struct ProcessStart {
    started_at: DateTime<Utc>,
    instant: Instant,
}

impl ProcessStart {
    pub fn now() -> Self {
        Self {
            started_at: Utc::now(),
            instant: Instant::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime(&self) -> Duration {
        self.instant.elapsed()
    }
}

/// Tracks whether one endpoint instance has served a request yet.
///
/// Cold is decided by a flag swapped on the first request, not by comparing
/// the process start timestamp with the request timestamp: under the clock
/// comparison, two requests inside the start tick would both report cold and
/// a slow first request would report warm. `ProcessStart` is kept only for
/// uptime reporting.
#[derive(Debug)]
pub struct ColdStartTracker {
    process_start: ProcessStart,
    served: AtomicBool,
}

impl ColdStartTracker {
    pub fn new(process_start: ProcessStart) -> Self {
        Self {
            process_start,
            served: AtomicBool::new(false),
        }
    }

    /// Record an invocation; true only for the first one
    pub fn observe(&self) -> bool {
        let cold = !self.served.swap(true, Ordering::AcqRel);
        if cold {
            tracing::debug!(
                uptime_ms = self.process_start.uptime().as_millis() as u64,
                "Cold invocation"
            );
        }
        cold
    }

    pub fn has_served(&self) -> bool {
        self.served.load(Ordering::Acquire)
    }

    pub fn process_start(&self) -> ProcessStart {
        self.process_start
    }
}
