// src/exec/terminate/windows.rs

use std::time::Duration;

use tokio::process::Child;
use tracing::{debug, error, warn};

use super::{BoxFuture, Terminator};
use crate::errors::{RespawnError, Result};
use crate::exec::CommandSpec;

/// Number of kill attempts before giving up on a stubborn process.
const KILL_ATTEMPTS: u32 = 3;
const KILL_RETRY_PAUSE: Duration = Duration::from_millis(50);

/// Termination for platforms without POSIX signals or process groups.
///
/// There is no graceful signal to send, so a graceful stop only confirms the
/// process is still alive and leaves the rest to the grace-period timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsTerminator;

impl Terminator for WindowsTerminator {
    fn request_graceful_stop(&self, child: &mut Child, command: &CommandSpec) -> Result<()> {
        if !self.is_running(child) {
            return Ok(());
        }
        debug!(
            process = %command,
            pid = child.id(),
            "no graceful signal on this platform; waiting for grace period"
        );
        Ok(())
    }

    fn force_stop<'a>(
        &'a self,
        child: &'a mut Child,
        command: &'a CommandSpec,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let pid = child.id();
            for attempt in 1..=KILL_ATTEMPTS {
                match child.start_kill() {
                    Ok(()) => {
                        debug!(process = %command, ?pid, attempt, "process killed");
                        return;
                    }
                    Err(e) if attempt < KILL_ATTEMPTS => {
                        warn!(process = %command, ?pid, attempt, error = %e, "failed to kill process; retrying");
                        tokio::time::sleep(KILL_RETRY_PAUSE).await;
                    }
                    Err(e) => {
                        error!(process = %command, ?pid, attempt, error = %e, "failed to kill process");
                    }
                }
            }
        })
    }

    fn is_running(&self, child: &mut Child) -> bool {
        matches!(child.try_wait(), Ok(None))
    }

    fn process_group_of(&self, _pid: u32) -> Result<i32> {
        Err(RespawnError::Termination(
            "process groups not supported on this platform".to_string(),
        ))
    }
}
