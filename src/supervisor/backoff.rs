// src/supervisor/backoff.rs

//! Restart-rate state for one worker.
//!
//! Only *launch* failures (the OS refused to start the process) move this
//! state; a process that launched and later crashed is restarted at the
//! base delay. After the k-th consecutive launch failure the interval is
//! `min(MAX_BACKOFF, base * MULTIPLIER^k)`; a successful launch resets it.
//!
//! This is plain synchronous state with no Tokio types so it can be tested
//! directly.

use std::time::Duration;

/// Growth factor applied per consecutive launch failure.
pub const BACKOFF_MULTIPLIER: f64 = 2.0;
/// Ceiling for the launch interval.
pub const MAX_BACKOFF: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    current: Duration,
    failures: u32,
    enabled: bool,
}

impl Backoff {
    pub fn new(base: Duration, enabled: bool) -> Self {
        Self {
            base,
            current: base,
            failures: 0,
            enabled,
        }
    }

    /// Delay before the next launch attempt.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Consecutive launch failures since the last successful launch.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record a launch failure and return the new interval.
    pub fn record_launch_failure(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        if self.enabled {
            self.current = interval_after(self.base, self.failures);
        }
        self.current
    }

    /// Record a successful launch. Returns the number of failures that were
    /// cleared.
    pub fn record_launch_success(&mut self) -> u32 {
        let previous = self.failures;
        self.failures = 0;
        self.current = self.base;
        previous
    }

    /// Whether `max_failures` consecutive launch failures have been reached.
    /// Zero means unlimited.
    pub fn ceiling_reached(&self, max_failures: u32) -> bool {
        max_failures > 0 && self.failures >= max_failures
    }
}

/// `min(MAX_BACKOFF, base * MULTIPLIER^failures)`.
pub fn interval_after(base: Duration, failures: u32) -> Duration {
    let exponent = i32::try_from(failures).unwrap_or(i32::MAX);
    let secs = base.as_secs_f64() * BACKOFF_MULTIPLIER.powi(exponent);
    if !secs.is_finite() || secs >= MAX_BACKOFF.as_secs_f64() {
        return MAX_BACKOFF;
    }
    Duration::from_secs_f64(secs)
}
