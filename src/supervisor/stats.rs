// src/supervisor/stats.rs

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::types::WorkerStatus;

/// Read-only copy of a worker's observable status.
///
/// Always a full value copy: holding one never keeps a lock or a process
/// handle alive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// When the current (or most recent) process was launched; the worker's
    /// creation time before the first launch.
    pub start_time: DateTime<Utc>,
    /// Number of launch attempts made so far.
    pub restart_count: u64,
    /// Launched processes that later exited non-cleanly.
    #[serde(rename = "failure_count")]
    pub exit_failure_count: u64,
    /// Consecutive launch failures since the last successful launch.
    pub launch_failures: u32,
    /// Delay the worker is currently waiting between launch attempts.
    #[serde(rename = "backoff_secs", serialize_with = "as_secs_f64")]
    pub backoff: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<DateTime<Utc>>,
    /// Time since launch while `Running`, zero otherwise.
    #[serde(rename = "uptime_secs", serialize_with = "as_secs_f64")]
    pub uptime: Duration,
    pub status: WorkerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

fn as_secs_f64<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Live stats owned by a worker and guarded by its stats lock.
#[derive(Debug, Clone)]
pub(crate) struct WorkerStats {
    start_time: DateTime<Utc>,
    started_at: Instant,
    restart_count: u64,
    exit_failure_count: u64,
    launch_failures: u32,
    backoff: Duration,
    last_failure: Option<DateTime<Utc>>,
    status: WorkerStatus,
    pid: Option<u32>,
}

impl WorkerStats {
    pub(crate) fn new(backoff: Duration) -> Self {
        Self {
            start_time: Utc::now(),
            started_at: Instant::now(),
            restart_count: 0,
            exit_failure_count: 0,
            launch_failures: 0,
            backoff,
            last_failure: None,
            status: WorkerStatus::Stopped,
            pid: None,
        }
    }

    pub(crate) fn status(&self) -> WorkerStatus {
        self.status
    }

    /// `Stopped | Failed -> Starting`: every launch attempt counts.
    pub(crate) fn mark_starting(&mut self) {
        self.status = WorkerStatus::Starting;
        self.restart_count += 1;
    }

    /// `Starting -> Running`.
    pub(crate) fn mark_running(&mut self, pid: Option<u32>, backoff: Duration) {
        self.status = WorkerStatus::Running;
        self.start_time = Utc::now();
        self.started_at = Instant::now();
        self.pid = pid;
        self.launch_failures = 0;
        self.backoff = backoff;
    }

    /// `Starting -> Failed` because the OS refused the launch.
    pub(crate) fn mark_launch_failed(&mut self, launch_failures: u32, backoff: Duration) {
        self.status = WorkerStatus::Failed;
        self.pid = None;
        self.last_failure = Some(Utc::now());
        self.launch_failures = launch_failures;
        self.backoff = backoff;
    }

    /// `Running -> Stopped` on a clean exit, `Running -> Failed` otherwise.
    pub(crate) fn mark_exited(&mut self, success: bool) {
        self.pid = None;
        if success {
            self.status = WorkerStatus::Stopped;
        } else {
            self.status = WorkerStatus::Failed;
            self.exit_failure_count += 1;
            self.last_failure = Some(Utc::now());
        }
    }

    /// The process was stopped on request (shutdown or restart).
    pub(crate) fn mark_stopped(&mut self) {
        self.status = WorkerStatus::Stopped;
        self.pid = None;
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        let uptime = if self.status == WorkerStatus::Running {
            self.started_at.elapsed()
        } else {
            Duration::ZERO
        };

        StatsSnapshot {
            start_time: self.start_time,
            restart_count: self.restart_count,
            exit_failure_count: self.exit_failure_count,
            launch_failures: self.launch_failures,
            backoff: self.backoff,
            last_failure: self.last_failure,
            uptime,
            status: self.status,
            pid: self.pid,
        }
    }
}
