//! Time utilities for appd
//!
//! Monotonic time drives the startup grace period; wall-clock time is only
//! used for event timestamps.

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// Get the current local time.
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// A point in monotonic time, immune to wall-clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    /// Duration since `earlier`, or zero if `earlier` is later than `self`
    pub fn duration_since(&self, earlier: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }
}

impl std::ops::Add<Duration> for MonotonicInstant {
    type Output = MonotonicInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        MonotonicInstant(self.0 + rhs)
    }
}

/// Gate that opens once a grace period has elapsed since process start.
///
/// Early boot telemetry may arrive before the rest of the system has settled;
/// nothing is constructed until the gate opens. Once open it stays open.
#[derive(Debug, Clone)]
pub struct StartupGate {
    started_at: MonotonicInstant,
    grace: Duration,
    open: bool,
}

impl StartupGate {
    pub fn new(started_at: MonotonicInstant, grace: Duration) -> Self {
        Self {
            started_at,
            grace,
            open: grace.is_zero(),
        }
    }

    /// Returns true if the gate is open at `now`. Latches open.
    pub fn poll(&mut self, now: MonotonicInstant) -> bool {
        if !self.open && now.duration_since(self.started_at) >= self.grace {
            self.open = true;
        }
        self.open
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }
}
