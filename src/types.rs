// src/types.rs

use std::fmt;

use serde::Serialize;

/// Lifecycle status of a supervised command.
///
/// - `Stopped`: nothing running; initial state, after a clean exit, or after
///   a shutdown/restart request stopped the process.
/// - `Starting`: a launch attempt is in flight.
/// - `Running`: the OS accepted the launch and the process is live.
/// - `Failed`: the last launch attempt errored, or the process exited with a
///   non-zero status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Stopped,
    Starting,
    Running,
    Failed,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Stopped => "stopped",
            WorkerStatus::Starting => "starting",
            WorkerStatus::Running => "running",
            WorkerStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
